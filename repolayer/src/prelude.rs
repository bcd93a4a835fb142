//! Convenient re-exports of commonly used types from repolayer.
//!
//! Import this prelude module to quickly access the most frequently used
//! types and traits without needing to import from multiple sub-modules:
//!
//! ```ignore
//! use repolayer::prelude::*;
//! ```
//!
//! This provides access to:
//! - The entity contract and its derive macro
//! - The store, repository and manager façades
//! - Query, update and index construction
//! - Error types

pub use repolayer_core::{
    backend::{CollectionStats, IndexOrder, IndexSpec, StoreBackend, StoreBackendBuilder, ValidationReport},
    codec::EntityExt,
    collection::{Collection, EntityCollection, VirtualCollection},
    config::StoreConfig,
    entity::{Entity, EntityKey, EntityMetadata, KeyKind},
    error::{StoreError, StoreResult},
    query::{Expr, Field, FieldOp, Filter, Query, QueryBuilder, QueryVisitor, Sort, SortDirection, field},
    repository::{Repository, RepositoryManager},
    store::EntityStore,
    update::Update,
};

pub use repolayer_macros::Entity;
