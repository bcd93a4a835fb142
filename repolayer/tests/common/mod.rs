#![allow(dead_code)]

use repolayer::memory::MemoryStore;
use repolayer::prelude::*;
use serde::{Deserialize, Serialize};

/// The shared virtual collection used by the test entities.
pub const ENTITIES: &str = "entities";

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn open_store(descriptor: &str) -> (MemoryStore, EntityStore<MemoryStore>) {
    init_logging();
    let backend = MemoryStore::new();
    let config = StoreConfig::parse(descriptor).expect("descriptor must parse");
    (backend.clone(), EntityStore::new(backend, config))
}

#[derive(Debug, Clone, Serialize, Deserialize, Entity)]
#[entity(virtual_collection = "entities", key = "object_id")]
pub struct VirtualProduct {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "createdOn")]
    pub created_on: bson::DateTime,
    #[serde(rename = "objectTypeId", skip_serializing_if = "Option::is_none")]
    pub object_type_id: Option<String>,
    pub name: String,
}

impl VirtualProduct {
    pub fn new(name: &str) -> Self {
        Self {
            id: repolayer::codec::new_object_id(),
            created_on: bson::DateTime::now(),
            object_type_id: None,
            name: name.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Entity)]
#[entity(virtual_collection = "entities", key = "object_id")]
pub struct VirtualUser {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "createdOn")]
    pub created_on: bson::DateTime,
    #[serde(rename = "objectTypeId", skip_serializing_if = "Option::is_none")]
    pub object_type_id: Option<String>,
    pub name: String,
}

impl VirtualUser {
    pub fn new(name: &str) -> Self {
        Self {
            id: repolayer::codec::new_object_id(),
            created_on: bson::DateTime::now(),
            object_type_id: None,
            name: name.to_string(),
        }
    }
}

/// A virtual entity whose discriminator is overridden.
#[derive(Debug, Clone, Serialize, Deserialize, Entity)]
#[entity(virtual_collection = "entities", virtual_type = "legacy-order", key = "object_id")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "createdOn")]
    pub created_on: bson::DateTime,
    #[serde(rename = "objectTypeId", skip_serializing_if = "Option::is_none")]
    pub object_type_id: Option<String>,
    pub total: i64,
}

impl Order {
    pub fn new(total: i64) -> Self {
        Self {
            id: repolayer::codec::new_object_id(),
            created_on: bson::DateTime::now(),
            object_type_id: None,
            total,
        }
    }
}

/// A plain entity with no placement declarations.
#[derive(Debug, Clone, Serialize, Deserialize, Entity)]
#[entity(key = "object_id")]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "createdOn")]
    pub created_on: bson::DateTime,
    #[serde(rename = "objectTypeId", skip_serializing_if = "Option::is_none")]
    pub object_type_id: Option<String>,
    pub name: String,
    pub price: i64,
}

impl Product {
    pub fn new(name: &str, price: i64) -> Self {
        Self {
            id: repolayer::codec::new_object_id(),
            created_on: bson::DateTime::now(),
            object_type_id: None,
            name: name.to_string(),
            price,
        }
    }
}

/// An entity with an explicit collection name and an opaque uuid key.
#[derive(Debug, Clone, Serialize, Deserialize, Entity)]
#[entity(collection = "MyTestCollection")]
pub struct CustomIdEntity {
    #[serde(rename = "_id")]
    pub id: bson::Uuid,
    #[serde(rename = "createdOn")]
    pub created_on: bson::DateTime,
    #[serde(rename = "objectTypeId", skip_serializing_if = "Option::is_none")]
    pub object_type_id: Option<String>,
    pub label: String,
}

impl CustomIdEntity {
    pub fn new(label: &str) -> Self {
        Self {
            id: bson::Uuid::new(),
            created_on: bson::DateTime::now(),
            object_type_id: None,
            label: label.to_string(),
        }
    }
}
