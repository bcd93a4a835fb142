//! In-memory storage backend for repolayer.
//!
//! A thread-safe, scan-based implementation of the `StoreBackend` trait,
//! intended for development and tests. Supports filtering, sorting,
//! pagination, update operators, unique indexes and synthesized collection
//! stats.
//!
//! # Quick Start
//!
//! ```ignore
//! use repolayer::{config::StoreConfig, memory::MemoryStore, store::EntityStore};
//!
//! #[tokio::main]
//! async fn main() -> repolayer::error::StoreResult<()> {
//!     let config = StoreConfig::parse("mongodb://localhost/app?virtual=true")?;
//!     let store = EntityStore::new(MemoryStore::new(), config);
//!     let users = store.repository::<User>()?;
//!     // ...
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as repolayer_memory;

pub mod evaluator;
pub mod store;

pub use store::{MemoryStore, MemoryStoreBuilder};
