//! A typed repository layer over document databases.
//!
//! This crate is the core of the repolayer project and provides:
//!
//! - **The entity contract** ([`entity`]) - identity, creation timestamp,
//!   discriminator slot, and the static storage metadata table
//! - **Store configuration** ([`config`]) - connection descriptor parsing,
//!   including the virtual-collection policy flags
//! - **Collection-name resolution** ([`resolver`]) - the rules mapping an
//!   entity type and a configuration to a physical collection name
//! - **Query and update ASTs** ([`query`], [`update`]) - backend-agnostic
//!   filter and mutation expressions
//! - **Storage backend abstraction** ([`backend`]) - the collaborator
//!   interface expected from a document store
//! - **Collection handles** ([`collection`]) - physical collections and the
//!   virtual-collection decorator that multiplexes several logical entity
//!   types into one physical collection
//! - **Repository façade** ([`repository`], [`store`]) - CRUD and
//!   administrative operations over a working handle
//! - **Entity registry** ([`registry`]) - one-time, process-wide entity
//!   registration
//! - **Error handling** ([`error`]) - the error taxonomy and result alias
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

#[allow(unused_extern_crates)]
extern crate self as repolayer_core;

pub mod backend;
pub mod codec;
pub mod collection;
pub mod config;
pub mod entity;
pub mod error;
pub mod query;
pub mod registry;
pub mod repository;
pub mod resolver;
pub mod store;
pub mod update;
