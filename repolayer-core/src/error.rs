//! Error types and result types for repository operations.
//!
//! Configuration problems (contradictory entity metadata, malformed
//! connection descriptors, missing default virtual collection names) are
//! surfaced at construction time and are never retried. Backend failures
//! carry the underlying driver's message unchanged. Absence of a document
//! is modeled as `Ok(None)` on single lookups, never as an error.

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors raised by the repository layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Invalid or contradictory configuration: both an explicit collection
    /// name and a virtual collection declared on one type, an empty default
    /// virtual collection name when one is required, or a malformed
    /// connection descriptor. Raised at construction time.
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// The operation is not available on this handle (e.g. requesting the
    /// raw physical collection from a virtual working handle).
    #[error("Operation not supported: {0}")]
    NotSupported(String),
    /// Serialization/deserialization error when converting between entities
    /// and BSON/JSON, including malformed object-id key strings.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Error during store initialization or connection setup.
    #[error("Initialization error: {0}")]
    Initialization(String),
    /// A document with the given id already exists in the collection.
    #[error("Document {0} already exists in collection {1}")]
    DocumentAlreadyExists(String, String),
    /// The requested collection does not exist in the store.
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),
    /// The document violates structural expectations (e.g. an entity that
    /// does not serialize to a BSON document).
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
    /// An error reported by the underlying storage backend, passed through
    /// with the driver's native message preserved.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// A specialized `Result` type for repository operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl From<BsonError> for StoreError {
    fn from(err: BsonError) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for StoreError {
    fn from(err: SerdeJsonError) -> Self {
        StoreError::Serialization(err.to_string())
    }
}
