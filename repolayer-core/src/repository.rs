//! The repository and manager façades.
//!
//! [`Repository`] is the CRUD surface applications talk to. It forwards
//! every operation verbatim to its working handle — whether documents are
//! discriminator-tagged and filtered is decided entirely by whether the
//! handle is a plain physical collection or a virtual one. The only logic a
//! repository owns is `_id` filter construction, which honors the entity's
//! declared key representation.
//!
//! [`RepositoryManager`] is the administrative surface for the same
//! physical collection: existence, drop, index management, stats and
//! validation.

use std::marker::PhantomData;

use crate::backend::{CollectionStats, IndexSpec, StoreBackend, ValidationReport};
use crate::codec;
use crate::collection::{Collection, EntityCollection};
use crate::entity::Entity;
use crate::error::StoreResult;
use crate::query::{Expr, Query};
use crate::update::Update;

/// A typed CRUD repository over one entity type.
#[derive(Debug)]
pub struct Repository<'a, B: StoreBackend, E: Entity> {
    handle: EntityCollection<'a, B, E>,
}

impl<'a, B: StoreBackend, E: Entity> Repository<'a, B, E> {
    pub(crate) fn new(handle: EntityCollection<'a, B, E>) -> Self {
        Self { handle }
    }

    /// The resolved physical collection name.
    pub fn collection_name(&self) -> &str {
        self.handle.name()
    }

    /// The working collection handle this repository forwards to.
    pub fn collection(&self) -> &EntityCollection<'a, B, E> {
        &self.handle
    }

    /// The raw physical collection, for advanced operations. Fails with a
    /// not-supported error on a virtual handle.
    pub fn physical(&self) -> StoreResult<&Collection<'a, B, E>> {
        self.handle.physical()
    }

    /// Adds a new entity.
    pub async fn add(&self, entity: &E) -> StoreResult<()> {
        self.handle.insert_one(entity).await
    }

    /// Adds a batch of new entities.
    pub async fn add_many(&self, entities: &[E]) -> StoreResult<()> {
        self.handle.insert_many(entities).await
    }

    /// Upserts an entity by id: replaces the stored document, inserting it
    /// when absent.
    pub async fn update(&self, entity: &E) -> StoreResult<()> {
        let filter = codec::id_filter::<E>(entity.id())?;
        self.handle.replace_one(filter, entity, true).await
    }

    /// Applies `update` to every entity matching `filter`; returns the
    /// matched count.
    pub async fn update_where(&self, filter: Expr, update: Update) -> StoreResult<u64> {
        self.handle.update_many(Some(filter), update).await
    }

    /// Returns the entity with the given id, or `None`.
    pub async fn get_by_id(&self, id: &E::Key) -> StoreResult<Option<E>> {
        self.handle
            .find_one(Some(codec::id_filter::<E>(id)?))
            .await
    }

    /// Returns the entities matching `query`.
    pub async fn find(&self, query: Query) -> StoreResult<Vec<E>> {
        self.handle.find(query).await
    }

    /// Returns the first entity matching `filter`, or `None`.
    pub async fn find_one(&self, filter: Expr) -> StoreResult<Option<E>> {
        self.handle.find_one(Some(filter)).await
    }

    /// Counts all entities in the repository.
    pub async fn count(&self) -> StoreResult<u64> {
        self.handle.count(None).await
    }

    /// Counts the entities matching `filter`.
    pub async fn count_where(&self, filter: Expr) -> StoreResult<u64> {
        self.handle.count(Some(filter)).await
    }

    /// Whether any entity matches `filter`.
    pub async fn exists(&self, filter: Expr) -> StoreResult<bool> {
        Ok(self.handle.find_one(Some(filter)).await?.is_some())
    }

    /// Deletes the entity with the given id.
    pub async fn delete_by_id(&self, id: &E::Key) -> StoreResult<()> {
        self.handle
            .delete_one(codec::id_filter::<E>(id)?)
            .await?;
        Ok(())
    }

    /// Deletes the given entity (by its id).
    pub async fn delete(&self, entity: &E) -> StoreResult<()> {
        self.delete_by_id(entity.id()).await
    }

    /// Deletes every entity matching `filter`; returns the deleted count.
    pub async fn delete_where(&self, filter: Expr) -> StoreResult<u64> {
        self.handle.delete_many(Some(filter)).await
    }

    /// Deletes every entity in the repository; returns the deleted count.
    pub async fn delete_all(&self) -> StoreResult<u64> {
        self.handle.delete_many(None).await
    }
}

/// Administrative operations for one entity type's physical collection.
#[derive(Debug)]
pub struct RepositoryManager<'a, B: StoreBackend, E: Entity> {
    name: String,
    backend: &'a B,
    _marker: PhantomData<E>,
}

impl<'a, B: StoreBackend, E: Entity> RepositoryManager<'a, B, E> {
    pub(crate) fn new(name: String, backend: &'a B) -> Self {
        Self { name, backend, _marker: PhantomData }
    }

    /// The resolved physical collection name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the collection exists in the store.
    pub async fn exists(&self) -> StoreResult<bool> {
        Ok(self
            .backend
            .list_collections()
            .await?
            .iter()
            .any(|collection| collection == &self.name))
    }

    /// Drops the collection and all its documents.
    pub async fn drop(&self) -> StoreResult<()> {
        self.backend.drop_collection(&self.name).await
    }

    /// Ensures an index exists; returns its name.
    pub async fn ensure_index(&self, index: IndexSpec) -> StoreResult<String> {
        self.backend.create_index(&self.name, index).await
    }

    /// Ensures a set of indexes exists; returns their names.
    pub async fn ensure_indexes(&self, indexes: Vec<IndexSpec>) -> StoreResult<Vec<String>> {
        let mut names = Vec::with_capacity(indexes.len());
        for index in indexes {
            names.push(self.ensure_index(index).await?);
        }
        Ok(names)
    }

    /// Drops an index by name.
    pub async fn drop_index(&self, name: &str) -> StoreResult<()> {
        self.backend.drop_index(&self.name, name).await
    }

    /// Drops a set of indexes by name.
    pub async fn drop_indexes(&self, names: &[&str]) -> StoreResult<()> {
        for name in names {
            self.drop_index(name).await?;
        }
        Ok(())
    }

    /// Drops every index except the mandatory `_id_` index.
    pub async fn drop_all_indexes(&self) -> StoreResult<()> {
        for name in self.list_indexes().await? {
            if name != "_id_" {
                self.drop_index(&name).await?;
            }
        }
        Ok(())
    }

    /// Lists the names of the indexes on the collection.
    pub async fn list_indexes(&self) -> StoreResult<Vec<String>> {
        self.backend.list_indexes(&self.name).await
    }

    /// Whether an index with the given name exists.
    pub async fn index_exists(&self, name: &str) -> StoreResult<bool> {
        Ok(self.list_indexes().await?.iter().any(|index| index == name))
    }

    /// Whether every named index exists.
    pub async fn indexes_exist(&self, names: &[&str]) -> StoreResult<bool> {
        let existing = self.list_indexes().await?;
        Ok(names
            .iter()
            .all(|name| existing.iter().any(|index| index == name)))
    }

    /// Rebuilds all indexes on the collection.
    pub async fn reindex(&self) -> StoreResult<()> {
        self.backend.reindex_collection(&self.name).await
    }

    /// Collection statistics.
    pub async fn stats(&self) -> StoreResult<CollectionStats> {
        self.backend.collection_stats(&self.name).await
    }

    /// Total size of the collection's documents, in bytes.
    pub async fn data_size(&self) -> StoreResult<u64> {
        Ok(self.stats().await?.data_size)
    }

    /// Storage allocated for the collection, in bytes.
    pub async fn storage_size(&self) -> StoreResult<u64> {
        Ok(self.stats().await?.storage_size)
    }

    /// Whether the collection is capped.
    pub async fn is_capped(&self) -> StoreResult<bool> {
        Ok(self.stats().await?.capped)
    }

    /// Runs the store's validation command against the collection.
    pub async fn validate(&self) -> StoreResult<ValidationReport> {
        self.backend.validate_collection(&self.name).await
    }
}
