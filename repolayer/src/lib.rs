//! Main repolayer crate providing a typed repository layer over document
//! databases.
//!
//! This crate is the primary entry point for users of the repolayer
//! framework. It re-exports the core types from the sub-crates, the
//! `Entity` derive macro, and the storage backends.
//!
//! # Features
//!
//! - **Declarative entity storage** - Entity types declare their collection
//!   placement once (explicit name, virtual collection, discriminator
//!   override, collection group, key representation) and the layer resolves
//!   the physical collection for them
//! - **Virtual collections** - Several logical entity types share one
//!   physical collection, transparently tagged and filtered by a
//!   discriminator field
//! - **Pluggable backends** - In-memory and MongoDB backends behind one
//!   trait
//! - **Typed repositories** - CRUD plus administrative operations (indexes,
//!   stats, validation) per entity type
//!
//! # Quick Start
//!
//! ```ignore
//! use repolayer::{prelude::*, memory::MemoryStore};
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
//!
//! #[tokio::main]
//! async fn main() -> StoreResult<()> {
//!     // Virtual collections are switched on per connection descriptor.
//!     let config = StoreConfig::parse("mongodb://localhost/app?virtual=true")?;
//!     let store = EntityStore::new(MemoryStore::new(), config);
//!
//!     let users = store.repository::<User>()?;
//!     users
//!         .add(&User {
//!             id: repolayer::codec::new_object_id(),
//!             created_on: bson::DateTime::now(),
//!             object_type_id: None,
//!             name: "Alice".to_string(),
//!         })
//!         .await?;
//!
//!     assert_eq!(users.count().await?, 1);
//!     assert_eq!(users.collection_name(), "entities");
//!
//!     store.shutdown().await
//! }
//! ```
//!
//! # Virtual collections
//!
//! With `?virtual=true`, entity types declaring
//! `#[entity(virtual_collection = "entities")]` multiplex into the
//! `entities` physical collection. Each repository sees only its own type's
//! documents: writes are tagged with the type's discriminator and every
//! read, count and delete is scoped by it. `?virtualCollectionGlobal=true`
//! forces *every* entity type into the default collection named by
//! `?virtualCollection=...`; construction fails when that default is
//! missing.
//!
//! # Backends
//!
//! - [`memory`] - Fast in-memory storage for development and testing
//! - [`mongodb`] - Persistent MongoDB backend (requires the `mongodb`
//!   feature)

pub mod prelude;

pub use repolayer_core::{
    backend, codec, collection, config, entity, error, query, registry, repository, resolver,
    store, update,
};

pub use repolayer_macros::Entity;

// Re-exported for the derive macro's generated code and for convenience.
pub use bson;
pub use chrono;
pub use inventory;

/// In-memory storage backend implementations.
pub mod memory {
    pub use repolayer_memory::{MemoryStore, MemoryStoreBuilder};
}

/// MongoDB storage backend implementations.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use repolayer_mongodb::{MongoStore, MongoStoreBuilder};
}
