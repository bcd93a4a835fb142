//! Entity ↔ BSON document conversion.
//!
//! Entities serialize through serde; this module owns the two fixed
//! document fields on top of that:
//!
//! - `_id` — the entity key. For [`KeyKind::ObjectId`] types the hex string
//!   the entity carries is stored as a native object id (which is how the
//!   store indexes `_id`) and turned back into a hex string on read.
//! - `objectTypeId` — the virtual-collection discriminator.

use bson::{Bson, Document, de::deserialize_from_bson, oid::ObjectId, ser::serialize_to_bson};
use serde_json::Value;

use crate::entity::{Entity, EntityKey, KeyKind};
use crate::error::{StoreError, StoreResult};
use crate::query::{Expr, field};

/// The document field holding the entity key.
pub const ID_FIELD: &str = "_id";

/// The document field holding the virtual-collection discriminator.
pub const OBJECT_TYPE_FIELD: &str = "objectTypeId";

/// Generates a fresh object-id hex string, for constructing entities with
/// [`KeyKind::ObjectId`] keys.
pub fn new_object_id() -> String {
    ObjectId::new().to_hex()
}

/// Serializes an entity into its stored document form.
///
/// # Errors
///
/// Returns [`StoreError::InvalidDocument`] if the entity does not serialize
/// to a document or its id field is not renamed to `_id`, and
/// [`StoreError::Serialization`] for malformed object-id key strings.
pub fn to_document<E: Entity>(entity: &E) -> StoreResult<Document> {
    let bson = serialize_to_bson(entity)?;
    let mut document = bson.as_document().cloned().ok_or_else(|| {
        StoreError::InvalidDocument(format!(
            "{} does not serialize to a BSON document",
            E::type_name()
        ))
    })?;

    if !document.contains_key(ID_FIELD) {
        return Err(StoreError::InvalidDocument(format!(
            "{} must serialize its id field as {ID_FIELD:?}",
            E::type_name()
        )));
    }

    if E::metadata().key_kind == KeyKind::ObjectId {
        let raw = match document.get(ID_FIELD) {
            Some(Bson::String(raw)) => Some(raw.clone()),
            _ => None,
        };
        if let Some(raw) = raw {
            let oid = ObjectId::parse_str(&raw).map_err(|e| {
                StoreError::Serialization(format!("invalid object id {raw:?}: {e}"))
            })?;
            document.insert(ID_FIELD, Bson::ObjectId(oid));
        }
    }

    Ok(document)
}

/// Deserializes a stored document back into an entity.
pub fn from_document<E: Entity>(mut document: Document) -> StoreResult<E> {
    if E::metadata().key_kind == KeyKind::ObjectId {
        let hex = match document.get(ID_FIELD) {
            Some(Bson::ObjectId(oid)) => Some(oid.to_hex()),
            _ => None,
        };
        if let Some(hex) = hex {
            document.insert(ID_FIELD, Bson::String(hex));
        }
    }

    Ok(deserialize_from_bson(Bson::Document(document))?)
}

/// Builds the `_id` equality filter for a key, honoring the entity's
/// [`KeyKind`].
pub fn id_filter<E: Entity>(id: &E::Key) -> StoreResult<Expr> {
    Ok(field(ID_FIELD).eq(id.to_bson(E::metadata().key_kind)?))
}

/// Serialization conveniences available on every entity.
pub trait EntityExt: Entity {
    /// Converts this entity to its stored document form.
    fn to_document(&self) -> StoreResult<Document>;

    /// Reconstructs an entity from its stored document form.
    fn from_document(document: Document) -> StoreResult<Self>;

    /// Converts this entity to a JSON value.
    fn to_json(&self) -> StoreResult<Value>;

    /// Reconstructs an entity from a JSON value.
    fn from_json(value: Value) -> StoreResult<Self>;
}

impl<E: Entity> EntityExt for E {
    fn to_document(&self) -> StoreResult<Document> {
        to_document(self)
    }

    fn from_document(document: Document) -> StoreResult<Self> {
        from_document(document)
    }

    fn to_json(&self) -> StoreResult<Value> {
        Ok(serde_json::to_value(self)?)
    }

    fn from_json(value: Value) -> StoreResult<Self> {
        Ok(serde_json::from_value(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityMetadata;
    use chrono::{DateTime, Utc};

    #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Note {
        #[serde(rename = "_id")]
        id: String,
        #[serde(rename = "createdOn")]
        created_on: bson::DateTime,
        #[serde(rename = "objectTypeId", skip_serializing_if = "Option::is_none")]
        object_type_id: Option<String>,
        body: String,
    }

    impl Entity for Note {
        type Key = String;

        fn id(&self) -> &String {
            &self.id
        }

        fn created_on(&self) -> DateTime<Utc> {
            self.created_on.into()
        }

        fn object_type_id(&self) -> Option<&str> {
            self.object_type_id.as_deref()
        }

        fn set_object_type_id(&mut self, type_id: Option<String>) {
            self.object_type_id = type_id;
        }

        fn type_name() -> &'static str {
            "Note"
        }

        fn metadata() -> EntityMetadata {
            EntityMetadata { key_kind: KeyKind::ObjectId, ..EntityMetadata::default() }
        }
    }

    fn note() -> Note {
        Note {
            id: new_object_id(),
            created_on: bson::DateTime::now(),
            object_type_id: None,
            body: "hello".to_string(),
        }
    }

    #[test]
    fn object_id_keys_are_stored_natively() {
        let note = note();
        let document = to_document(&note).unwrap();

        match document.get(ID_FIELD) {
            Some(Bson::ObjectId(oid)) => assert_eq!(oid.to_hex(), note.id),
            other => panic!("expected a native object id, got {other:?}"),
        }
    }

    #[test]
    fn document_round_trip_restores_the_hex_key() {
        let note = note();
        let restored: Note = from_document(to_document(&note).unwrap()).unwrap();
        assert_eq!(restored, note);
    }

    #[test]
    fn absent_discriminator_is_not_serialized() {
        let document = to_document(&note()).unwrap();
        assert!(!document.contains_key(OBJECT_TYPE_FIELD));
    }

    #[test]
    fn malformed_object_id_key_fails_serialization() {
        let mut note = note();
        note.id = "nope".to_string();
        assert!(matches!(
            to_document(&note),
            Err(StoreError::Serialization(_))
        ));
    }

    #[test]
    fn id_filter_uses_the_native_representation() {
        let note = note();
        match id_filter::<Note>(note.id()).unwrap() {
            Expr::Field { field, value, .. } => {
                assert_eq!(field, ID_FIELD);
                assert!(matches!(value, Bson::ObjectId(_)));
            }
            other => panic!("expected a field filter, got {other:?}"),
        }
    }

    #[test]
    fn json_round_trip() {
        let note = note();
        let restored = Note::from_json(note.to_json().unwrap()).unwrap();
        assert_eq!(restored, note);
    }
}
