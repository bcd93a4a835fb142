//! MongoDB backend implementation for repolayer.
//!
//! Implements the `StoreBackend` trait over the official MongoDB driver:
//! filters and updates translate to native operator documents, indexes map
//! to `IndexModel`s, and collection stats/validation go through the
//! `collStats`/`validate` admin commands.
//!
//! To use this backend, enable the `mongodb` feature of the facade crate:
//!
//! ```toml
//! [dependencies]
//! repolayer = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Example
//!
//! ```ignore
//! use repolayer::{backend::StoreBackendBuilder, config::StoreConfig, mongodb::MongoStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = StoreConfig::parse("mongodb://localhost:27017/app?virtual=true")?;
//!     let backend = MongoStore::builder(&config).build().await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as repolayer_mongodb;

pub mod query;
pub mod store;

pub use store::{MongoStore, MongoStoreBuilder};
