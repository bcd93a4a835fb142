//! In-memory storage backend.
//!
//! Collections are plain vectors of BSON documents behind async-aware
//! read-write locks; every query is a scan. Good enough for development and
//! tests, not meant for large datasets. `_id` uniqueness and unique indexes
//! are enforced by scanning on insert.

use std::{cmp::Ordering, collections::HashMap, sync::Arc};

use async_trait::async_trait;
use bson::{Bson, Document};
use mea::rwlock::RwLock;

use repolayer_core::{
    backend::{CollectionStats, IndexSpec, StoreBackend, StoreBackendBuilder, ValidationReport},
    error::{StoreError, StoreResult},
    query::{Expr, Query, SortDirection},
    update::Update,
};

use crate::evaluator::{Comparable, DocumentEvaluator, apply_update};

#[derive(Debug, Clone)]
struct StoredIndex {
    name: String,
    spec: IndexSpec,
}

type CollectionMap = HashMap<String, Vec<Document>>;
type IndexMap = HashMap<String, Vec<StoredIndex>>;

/// Thread-safe in-memory document storage backend.
///
/// Cloneable; clones share the same underlying data.
///
/// # Example
///
/// ```ignore
/// use repolayer::memory::MemoryStore;
///
/// let store = EntityStore::new(MemoryStore::new(), config);
/// ```
#[derive(Default, Clone, Debug)]
pub struct MemoryStore {
    collections: Arc<RwLock<CollectionMap>>,
    indexes: Arc<RwLock<IndexMap>>,
}

impl MemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder for constructing a `MemoryStore`.
    pub fn builder() -> MemoryStoreBuilder {
        MemoryStoreBuilder::default()
    }
}

fn display_id(document: &Document) -> String {
    match document.get("_id") {
        Some(Bson::ObjectId(oid)) => oid.to_hex(),
        Some(Bson::String(id)) => id.clone(),
        Some(other) => format!("{other:?}"),
        None => "<missing _id>".to_string(),
    }
}

fn index_key<'a>(document: &'a Document, spec: &IndexSpec) -> Option<Vec<&'a Bson>> {
    spec.keys()
        .iter()
        .map(|(field, _)| document.get(field))
        .collect()
}

fn insert_checked(
    documents: &mut Vec<Document>,
    indexes: &[StoredIndex],
    document: Document,
    collection: &str,
) -> StoreResult<()> {
    if documents
        .iter()
        .any(|existing| existing.get("_id") == document.get("_id"))
    {
        return Err(StoreError::DocumentAlreadyExists(
            display_id(&document),
            collection.to_string(),
        ));
    }

    for index in indexes.iter().filter(|index| index.spec.is_unique()) {
        let Some(candidate) = index_key(&document, &index.spec) else {
            // Documents missing a key are only indexed when the index is
            // not sparse; either way there is nothing to collide with.
            continue;
        };
        if documents
            .iter()
            .any(|existing| index_key(existing, &index.spec).as_ref() == Some(&candidate))
        {
            return Err(StoreError::Backend(format!(
                "duplicate key for unique index {:?} on collection {collection:?}",
                index.name
            )));
        }
    }

    documents.push(document);
    Ok(())
}

#[async_trait]
impl StoreBackend for MemoryStore {
    async fn insert_one(&self, collection: &str, document: Document) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        let indexes = self.indexes.read().await;
        let documents = collections.entry(collection.to_string()).or_default();
        let empty = Vec::new();
        let collection_indexes = indexes.get(collection).unwrap_or(&empty);

        insert_checked(documents, collection_indexes, document, collection)
    }

    async fn insert_many(&self, collection: &str, batch: Vec<Document>) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        let indexes = self.indexes.read().await;
        let documents = collections.entry(collection.to_string()).or_default();
        let empty = Vec::new();
        let collection_indexes = indexes.get(collection).unwrap_or(&empty);

        for document in batch {
            insert_checked(documents, collection_indexes, document, collection)?;
        }

        Ok(())
    }

    async fn replace_one(
        &self,
        collection: &str,
        filter: Expr,
        document: Document,
        upsert: bool,
    ) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        let indexes = self.indexes.read().await;
        let documents = collections.entry(collection.to_string()).or_default();

        match documents
            .iter()
            .position(|existing| DocumentEvaluator::matches(existing, Some(&filter)))
        {
            Some(position) => {
                documents[position] = document;
                Ok(())
            }
            None if upsert => {
                let empty = Vec::new();
                let collection_indexes = indexes.get(collection).unwrap_or(&empty);
                insert_checked(documents, collection_indexes, document, collection)
            }
            None => Ok(()),
        }
    }

    async fn update_many(
        &self,
        collection: &str,
        filter: Option<Expr>,
        update: Update,
    ) -> StoreResult<u64> {
        if update.is_empty() {
            return Ok(0);
        }

        let mut collections = self.collections.write().await;
        let documents = match collections.get_mut(collection) {
            Some(documents) => documents,
            None => return Ok(0),
        };

        let mut matched = 0u64;
        for document in documents
            .iter_mut()
            .filter(|document| DocumentEvaluator::matches(document, filter.as_ref()))
        {
            apply_update(document, &update);
            matched += 1;
        }

        Ok(matched)
    }

    async fn find(&self, collection: &str, query: Query) -> StoreResult<Vec<Document>> {
        let collections = self.collections.read().await;
        let documents = match collections.get(collection) {
            Some(documents) => documents,
            None => return Ok(vec![]),
        };

        let mut matched: Vec<Document> = documents
            .iter()
            .filter(|document| DocumentEvaluator::matches(document, query.filter.as_ref()))
            .cloned()
            .collect();

        if let Some(sort) = &query.sort {
            matched.sort_by(|a, b| {
                let left = a.get(&sort.field).map(Comparable::from).unwrap_or(Comparable::Null);
                let right = b.get(&sort.field).map(Comparable::from).unwrap_or(Comparable::Null);

                match sort.direction {
                    SortDirection::Asc => left.partial_cmp(&right).unwrap_or(Ordering::Equal),
                    SortDirection::Desc => right.partial_cmp(&left).unwrap_or(Ordering::Equal),
                }
            });
        }

        Ok(matched
            .into_iter()
            .skip(query.offset.unwrap_or(0))
            .take(query.limit.unwrap_or(usize::MAX))
            .collect())
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: Option<Expr>,
    ) -> StoreResult<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).and_then(|documents| {
            documents
                .iter()
                .find(|document| DocumentEvaluator::matches(document, filter.as_ref()))
                .cloned()
        }))
    }

    async fn count(&self, collection: &str, filter: Option<Expr>) -> StoreResult<u64> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|documents| {
                documents
                    .iter()
                    .filter(|document| DocumentEvaluator::matches(document, filter.as_ref()))
                    .count() as u64
            })
            .unwrap_or(0))
    }

    async fn delete_one(&self, collection: &str, filter: Expr) -> StoreResult<u64> {
        let mut collections = self.collections.write().await;
        let documents = match collections.get_mut(collection) {
            Some(documents) => documents,
            None => return Ok(0),
        };

        match documents
            .iter()
            .position(|document| DocumentEvaluator::matches(document, Some(&filter)))
        {
            Some(position) => {
                documents.remove(position);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_many(&self, collection: &str, filter: Option<Expr>) -> StoreResult<u64> {
        let mut collections = self.collections.write().await;
        let documents = match collections.get_mut(collection) {
            Some(documents) => documents,
            None => return Ok(0),
        };

        let before = documents.len();
        documents.retain(|document| !DocumentEvaluator::matches(document, filter.as_ref()));

        Ok((before - documents.len()) as u64)
    }

    async fn create_index(&self, collection: &str, index: IndexSpec) -> StoreResult<String> {
        let collections = self.collections.read().await;
        let mut indexes = self.indexes.write().await;
        let name = index.name();

        let collection_indexes = indexes.entry(collection.to_string()).or_default();
        if collection_indexes.iter().any(|stored| stored.name == name) {
            return Ok(name);
        }

        if index.is_unique() {
            let empty = Vec::new();
            let documents = collections.get(collection).unwrap_or(&empty);
            for (position, document) in documents.iter().enumerate() {
                let Some(key) = index_key(document, &index) else {
                    continue;
                };
                if documents[position + 1..]
                    .iter()
                    .any(|other| index_key(other, &index).as_ref() == Some(&key))
                {
                    return Err(StoreError::Backend(format!(
                        "cannot build unique index {name:?} on collection {collection:?}: \
                         duplicate key"
                    )));
                }
            }
        }

        collection_indexes.push(StoredIndex { name: name.clone(), spec: index });
        Ok(name)
    }

    async fn drop_index(&self, collection: &str, name: &str) -> StoreResult<()> {
        let mut indexes = self.indexes.write().await;
        let collection_indexes = indexes.entry(collection.to_string()).or_default();

        let before = collection_indexes.len();
        collection_indexes.retain(|stored| stored.name != name);

        if collection_indexes.len() == before {
            return Err(StoreError::Backend(format!(
                "index {name:?} not found on collection {collection:?}"
            )));
        }

        Ok(())
    }

    async fn list_indexes(&self, collection: &str) -> StoreResult<Vec<String>> {
        let indexes = self.indexes.read().await;
        let mut names = vec!["_id_".to_string()];
        if let Some(collection_indexes) = indexes.get(collection) {
            names.extend(collection_indexes.iter().map(|stored| stored.name.clone()));
        }

        Ok(names)
    }

    async fn drop_collection(&self, name: &str) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        let mut indexes = self.indexes.write().await;
        indexes.remove(name);

        if collections.remove(name).is_none() {
            return Err(StoreError::CollectionNotFound(name.to_string()));
        }

        Ok(())
    }

    async fn list_collections(&self) -> StoreResult<Vec<String>> {
        Ok(self.collections.read().await.keys().cloned().collect())
    }

    async fn reindex_collection(&self, collection: &str) -> StoreResult<()> {
        // Nothing to rebuild for scan-based storage; only check the target.
        let collections = self.collections.read().await;
        if !collections.contains_key(collection) {
            return Err(StoreError::CollectionNotFound(collection.to_string()));
        }

        Ok(())
    }

    async fn collection_stats(&self, collection: &str) -> StoreResult<CollectionStats> {
        let collections = self.collections.read().await;
        let documents = collections
            .get(collection)
            .ok_or_else(|| StoreError::CollectionNotFound(collection.to_string()))?;

        // Extended-JSON length as a size proxy; exact byte accounting is a
        // real store's job.
        let data_size: u64 = documents
            .iter()
            .map(|document| document.to_string().len() as u64)
            .sum();

        Ok(CollectionStats {
            count: documents.len() as u64,
            data_size,
            storage_size: data_size,
            capped: false,
        })
    }

    async fn validate_collection(&self, collection: &str) -> StoreResult<ValidationReport> {
        let collections = self.collections.read().await;
        if !collections.contains_key(collection) {
            return Err(StoreError::CollectionNotFound(collection.to_string()));
        }

        Ok(ValidationReport { valid: true, errors: vec![] })
    }
}

/// Builder for constructing [`MemoryStore`] instances.
#[derive(Default)]
pub struct MemoryStoreBuilder;

#[async_trait]
impl StoreBackendBuilder for MemoryStoreBuilder {
    type Backend = MemoryStore;

    async fn build(self) -> StoreResult<Self::Backend> {
        Ok(MemoryStore::new())
    }
}
