//! Storage backend abstraction.
//!
//! [`StoreBackend`] is the collaborator interface this layer expects from a
//! document store: filter-based CRUD, replace-with-upsert, index
//! management, and the collection admin commands (stats, validate). The
//! backend owns connections, pooling, retries and network I/O; this layer
//! never retries and passes backend failures through unchanged.
//!
//! All methods are async, thread-safe (`Send + Sync`) and single-shot; no
//! call blocks on another call made by this layer.

use async_trait::async_trait;
use bson::Document;
use std::fmt::Debug;

use crate::error::StoreResult;
use crate::query::{Expr, Query};
use crate::update::Update;

/// Sort order of an index key.
#[derive(Debug, Clone, Copy)]
pub enum IndexOrder {
    /// Ascending key order.
    Ascending,
    /// Descending key order.
    Descending,
}

/// An index definition: one or more keys plus uniqueness/sparseness flags.
///
/// ```ignore
/// use repolayer::backend::IndexSpec;
///
/// let index = IndexSpec::on("email").unique();
/// let compound = IndexSpec::on("lastName").and("firstName").descending();
/// ```
#[derive(Debug, Clone)]
pub struct IndexSpec {
    keys: Vec<(String, IndexOrder)>,
    unique: bool,
    sparse: bool,
}

impl IndexSpec {
    /// Starts an ascending index on the given field.
    pub fn on(field: impl Into<String>) -> Self {
        IndexSpec {
            keys: vec![(field.into(), IndexOrder::Ascending)],
            unique: false,
            sparse: false,
        }
    }

    /// Adds another ascending key to the index.
    pub fn and(mut self, field: impl Into<String>) -> Self {
        self.keys.push((field.into(), IndexOrder::Ascending));
        self
    }

    /// Flips the most recently added key to descending order.
    pub fn descending(mut self) -> Self {
        if let Some(last) = self.keys.last_mut() {
            last.1 = IndexOrder::Descending;
        }
        self
    }

    /// Marks the index as unique.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Marks the index as sparse.
    pub fn sparse(mut self) -> Self {
        self.sparse = true;
        self
    }

    /// The index keys, in declaration order.
    pub fn keys(&self) -> &[(String, IndexOrder)] {
        &self.keys
    }

    /// Whether the index enforces uniqueness.
    pub fn is_unique(&self) -> bool {
        self.unique
    }

    /// Whether the index skips documents missing the keys.
    pub fn is_sparse(&self) -> bool {
        self.sparse
    }

    /// The generated index name, `<field>_<order>` segments joined by `_`
    /// (`1` ascending, `-1` descending).
    pub fn name(&self) -> String {
        self.keys
            .iter()
            .map(|(field, order)| match order {
                IndexOrder::Ascending => format!("{field}_1"),
                IndexOrder::Descending => format!("{field}_-1"),
            })
            .collect::<Vec<_>>()
            .join("_")
    }
}

/// Collection statistics reported by the store.
#[derive(Debug, Clone, Default)]
pub struct CollectionStats {
    /// Number of documents in the collection.
    pub count: u64,
    /// Total size of the documents, in bytes.
    pub data_size: u64,
    /// Storage allocated for the collection, in bytes.
    pub storage_size: u64,
    /// Whether the collection is capped.
    pub capped: bool,
}

/// Result of a collection validation admin command.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    /// Whether the collection passed validation.
    pub valid: bool,
    /// Validation errors reported by the store, if any.
    pub errors: Vec<String>,
}

/// Abstract interface for document storage backends.
///
/// Collections are created implicitly on first insert. Filters are the
/// [`Expr`] AST; `None` means "match everything". Implementations must be
/// safe for concurrent use from multiple async tasks.
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Inserts a single document.
    ///
    /// Fails if a document with the same `_id` already exists.
    async fn insert_one(&self, collection: &str, document: Document) -> StoreResult<()>;

    /// Inserts a batch of documents.
    async fn insert_many(&self, collection: &str, documents: Vec<Document>) -> StoreResult<()>;

    /// Replaces the first document matching `filter` with `document`;
    /// inserts it when nothing matches and `upsert` is set.
    async fn replace_one(
        &self,
        collection: &str,
        filter: Expr,
        document: Document,
        upsert: bool,
    ) -> StoreResult<()>;

    /// Applies `update` to every document matching `filter` and returns the
    /// number of matched documents.
    async fn update_many(
        &self,
        collection: &str,
        filter: Option<Expr>,
        update: Update,
    ) -> StoreResult<u64>;

    /// Returns the documents matching `query`, honoring its sort, offset
    /// and limit.
    async fn find(&self, collection: &str, query: Query) -> StoreResult<Vec<Document>>;

    /// Returns the first document matching `filter`, or `None`.
    async fn find_one(&self, collection: &str, filter: Option<Expr>)
    -> StoreResult<Option<Document>>;

    /// Counts the documents matching `filter`.
    async fn count(&self, collection: &str, filter: Option<Expr>) -> StoreResult<u64>;

    /// Deletes the first document matching `filter`; returns the number of
    /// deleted documents (0 or 1).
    async fn delete_one(&self, collection: &str, filter: Expr) -> StoreResult<u64>;

    /// Deletes every document matching `filter`; returns the number of
    /// deleted documents.
    async fn delete_many(&self, collection: &str, filter: Option<Expr>) -> StoreResult<u64>;

    /// Creates an index and returns its name.
    async fn create_index(&self, collection: &str, index: IndexSpec) -> StoreResult<String>;

    /// Drops an index by name.
    async fn drop_index(&self, collection: &str, name: &str) -> StoreResult<()>;

    /// Lists the names of the indexes on a collection.
    async fn list_indexes(&self, collection: &str) -> StoreResult<Vec<String>>;

    /// Drops a collection and all its documents.
    async fn drop_collection(&self, name: &str) -> StoreResult<()>;

    /// Lists the names of all collections in the store.
    async fn list_collections(&self) -> StoreResult<Vec<String>>;

    /// Rebuilds all indexes on a collection.
    async fn reindex_collection(&self, collection: &str) -> StoreResult<()>;

    /// Returns collection statistics (document count, sizes, capped flag).
    async fn collection_stats(&self, collection: &str) -> StoreResult<CollectionStats>;

    /// Runs the store's validation command against a collection.
    async fn validate_collection(&self, collection: &str) -> StoreResult<ValidationReport>;

    /// Cleanly shuts down the backend, releasing connections and caches.
    ///
    /// The default implementation is a no-op.
    async fn shutdown(self) -> StoreResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

/// Factory trait for constructing backend instances.
#[async_trait]
pub trait StoreBackendBuilder {
    /// The backend type this builder produces.
    type Backend: StoreBackend;

    /// Builds the backend, establishing whatever connections it needs.
    async fn build(self) -> StoreResult<Self::Backend>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_names_follow_the_key_order_convention() {
        assert_eq!(IndexSpec::on("email").name(), "email_1");
        assert_eq!(
            IndexSpec::on("lastName").and("firstName").descending().name(),
            "lastName_1_firstName_-1"
        );
    }

    #[test]
    fn index_flags_default_off() {
        let index = IndexSpec::on("email");
        assert!(!index.is_unique());
        assert!(!index.is_sparse());

        let index = IndexSpec::on("email").unique().sparse();
        assert!(index.is_unique());
        assert!(index.is_sparse());
    }
}
