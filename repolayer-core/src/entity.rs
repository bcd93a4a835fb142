//! The entity contract and its static storage metadata.
//!
//! Every stored type implements [`Entity`]: an identity (of a caller-chosen
//! key type), an immutable creation timestamp, and a discriminator slot
//! that is only populated when the type lives in a virtual collection.
//! Storage placement is declared through [`EntityMetadata`], a flat,
//! compile-time table entry attached to the type — the counterpart of
//! per-type annotations in reflection-based object mappers, without the
//! runtime reflection.
//!
//! # Serialized form
//!
//! Entities serialize through serde into BSON documents. Two field names
//! are fixed by convention:
//!
//! - the id field must serde-rename to `_id`;
//! - the discriminator field must serde-rename to `objectTypeId`
//!   (preferably with `skip_serializing_if = "Option::is_none"` so
//!   non-virtual documents stay clean).
//!
//! # Example
//!
//! ```ignore
//! use repolayer::prelude::*;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize, Entity)]
//! #[entity(virtual_collection = "entities", key = "object_id")]
//! pub struct User {
//!     #[serde(rename = "_id")]
//!     pub id: String,
//!     #[serde(rename = "createdOn")]
//!     pub created_on: bson::DateTime,
//!     #[serde(rename = "objectTypeId", skip_serializing_if = "Option::is_none")]
//!     pub object_type_id: Option<String>,
//!     pub name: String,
//! }
//! ```

use bson::{Bson, Uuid, oid::ObjectId};
use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};

use crate::error::{StoreError, StoreResult};

/// How an entity's key is represented inside the store.
///
/// Declared per type instead of being inferred from anything structural:
/// a `String` key is only treated as a 24-hex-char object id when the type
/// says so.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyKind {
    /// String keys hold object-id hex strings and are stored as the
    /// store's native object-id type (which is how `_id` is indexed).
    ObjectId,
    /// Keys are stored exactly as they serialize.
    #[default]
    Opaque,
}

/// Static storage metadata for an entity type.
///
/// One entry per type, built once at compile time. `collection_name` and
/// `virtual_collection` are mutually exclusive; the contradiction is
/// reported by the name resolver as a [`StoreError::Configuration`] so that
/// manually written `Entity` impls get the same check as derived ones.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntityMetadata {
    /// Explicit physical collection name override.
    pub collection_name: Option<&'static str>,
    /// Name of the shared virtual collection this type multiplexes into
    /// (only honored while virtual collections are enabled).
    pub virtual_collection: Option<&'static str>,
    /// Discriminator value override; defaults to the type's simple name.
    pub virtual_type_name: Option<&'static str>,
    /// Named collection group: a family of related types declaring the same
    /// group collapses to one physical collection of that name.
    pub collection_group: Option<&'static str>,
    /// Key representation, see [`KeyKind`].
    pub key_kind: KeyKind,
}

/// Conversion from an entity key to its stored BSON representation.
///
/// String keys honor [`KeyKind::ObjectId`]; every other key type ignores
/// the kind and compares as it serializes.
pub trait EntityKey: Clone + Send + Sync + 'static {
    /// Converts this key to the BSON value used in `_id` filters.
    fn to_bson(&self, kind: KeyKind) -> StoreResult<Bson>;
}

impl EntityKey for String {
    fn to_bson(&self, kind: KeyKind) -> StoreResult<Bson> {
        match kind {
            KeyKind::ObjectId => {
                let oid = ObjectId::parse_str(self).map_err(|e| {
                    StoreError::Serialization(format!("invalid object id {self:?}: {e}"))
                })?;
                Ok(Bson::ObjectId(oid))
            }
            KeyKind::Opaque => Ok(Bson::String(self.clone())),
        }
    }
}

impl EntityKey for Uuid {
    fn to_bson(&self, _kind: KeyKind) -> StoreResult<Bson> {
        Ok(Bson::from(*self))
    }
}

impl EntityKey for i32 {
    fn to_bson(&self, _kind: KeyKind) -> StoreResult<Bson> {
        Ok(Bson::Int32(*self))
    }
}

impl EntityKey for i64 {
    fn to_bson(&self, _kind: KeyKind) -> StoreResult<Bson> {
        Ok(Bson::Int64(*self))
    }
}

/// Core trait implemented by every stored entity type.
///
/// Usually implemented via `#[derive(Entity)]`, which also registers the
/// type's [`EntityMetadata`] with the process-wide registry. The invariants
/// this layer relies on:
///
/// - `id` is unique within its physical collection once persisted;
/// - `created_on` is assigned at construction and never mutated afterwards;
/// - `object_type_id` is owned by the virtual-collection layer and carries
///   no meaning outside it.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// The key type used for the entity's id.
    type Key: EntityKey;

    /// Returns the entity's id.
    fn id(&self) -> &Self::Key;

    /// Returns the entity's creation timestamp.
    fn created_on(&self) -> DateTime<Utc>;

    /// Returns the discriminator value this instance was tagged with, if
    /// any.
    fn object_type_id(&self) -> Option<&str>;

    /// Sets the discriminator value. Called by the virtual-collection layer
    /// before every write; not intended for application code.
    fn set_object_type_id(&mut self, type_id: Option<String>);

    /// The type's simple name, used as the resolution and discriminator
    /// fallback.
    fn type_name() -> &'static str;

    /// The type's storage metadata. Defaults to an empty entry: no
    /// overrides, opaque key.
    fn metadata() -> EntityMetadata {
        EntityMetadata::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_key_converts_to_object_id() {
        let key = "507f1f77bcf86cd799439011".to_string();
        match key.to_bson(KeyKind::ObjectId) {
            Ok(Bson::ObjectId(oid)) => assert_eq!(oid.to_hex(), key),
            other => panic!("expected object id, got {other:?}"),
        }
    }

    #[test]
    fn string_key_stays_string_when_opaque() {
        let key = "507f1f77bcf86cd799439011".to_string();
        assert_eq!(
            key.to_bson(KeyKind::Opaque).unwrap(),
            Bson::String(key.clone())
        );
    }

    #[test]
    fn malformed_object_id_string_is_a_serialization_error() {
        let key = "not-an-object-id".to_string();
        assert!(matches!(
            key.to_bson(KeyKind::ObjectId),
            Err(StoreError::Serialization(_))
        ));
    }

    #[test]
    fn non_string_keys_ignore_key_kind() {
        assert_eq!(42i64.to_bson(KeyKind::ObjectId).unwrap(), Bson::Int64(42));
        assert_eq!(7i32.to_bson(KeyKind::Opaque).unwrap(), Bson::Int32(7));
    }
}
