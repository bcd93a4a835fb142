//! Typed collection handles: physical, virtual, and the working-handle
//! enum the repository operates through.
//!
//! A [`Collection`] is a typed view of one physical collection. A
//! [`VirtualCollection`] decorates it: every write is tagged with the
//! entity type's discriminator and every read, count and delete conjoins a
//! discriminator equality predicate onto the caller's filter — several
//! logical entity types share one physical collection while behaving as
//! independent collections.
//!
//! Both handles are stateless request transformers over an immutable
//! `(backend, name)` pair; neither owns the backend.

use std::marker::PhantomData;

use crate::backend::{IndexSpec, StoreBackend};
use crate::codec::{self, OBJECT_TYPE_FIELD};
use crate::entity::Entity;
use crate::error::{StoreError, StoreResult};
use crate::query::{Expr, Query, field};
use crate::resolver;
use crate::update::Update;

/// A typed handle on a physical collection.
#[derive(Debug)]
pub struct Collection<'a, B: StoreBackend, E: Entity> {
    name: String,
    backend: &'a B,
    _marker: PhantomData<E>,
}

impl<'a, B: StoreBackend, E: Entity> Collection<'a, B, E> {
    pub(crate) fn new(name: String, backend: &'a B) -> Self {
        Self { name, backend, _marker: PhantomData }
    }

    /// The physical collection name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Re-views the same physical collection under a different entity type.
    pub fn with_type<T: Entity>(&self) -> Collection<'a, B, T> {
        Collection { name: self.name.clone(), backend: self.backend, _marker: PhantomData }
    }

    /// Inserts a single entity.
    pub async fn insert_one(&self, entity: &E) -> StoreResult<()> {
        self.backend
            .insert_one(&self.name, codec::to_document(entity)?)
            .await
    }

    /// Inserts a batch of entities.
    pub async fn insert_many(&self, entities: &[E]) -> StoreResult<()> {
        let documents = entities
            .iter()
            .map(codec::to_document)
            .collect::<StoreResult<Vec<_>>>()?;
        self.backend.insert_many(&self.name, documents).await
    }

    /// Replaces the first entity matching `filter`, inserting when nothing
    /// matches and `upsert` is set.
    pub async fn replace_one(&self, filter: Expr, entity: &E, upsert: bool) -> StoreResult<()> {
        self.backend
            .replace_one(&self.name, filter, codec::to_document(entity)?, upsert)
            .await
    }

    /// Applies `update` to every entity matching `filter`; returns the
    /// matched count.
    pub async fn update_many(&self, filter: Option<Expr>, update: Update) -> StoreResult<u64> {
        self.backend.update_many(&self.name, filter, update).await
    }

    /// Returns the entities matching `query`.
    pub async fn find(&self, query: Query) -> StoreResult<Vec<E>> {
        self.backend
            .find(&self.name, query)
            .await?
            .into_iter()
            .map(codec::from_document)
            .collect()
    }

    /// Returns the first entity matching `filter`, or `None`.
    pub async fn find_one(&self, filter: Option<Expr>) -> StoreResult<Option<E>> {
        self.backend
            .find_one(&self.name, filter)
            .await?
            .map(codec::from_document)
            .transpose()
    }

    /// Counts the entities matching `filter`.
    pub async fn count(&self, filter: Option<Expr>) -> StoreResult<u64> {
        self.backend.count(&self.name, filter).await
    }

    /// Deletes the first entity matching `filter`; returns 0 or 1.
    pub async fn delete_one(&self, filter: Expr) -> StoreResult<u64> {
        self.backend.delete_one(&self.name, filter).await
    }

    /// Deletes every entity matching `filter`; returns the deleted count.
    pub async fn delete_many(&self, filter: Option<Expr>) -> StoreResult<u64> {
        self.backend.delete_many(&self.name, filter).await
    }

    /// Creates an index on the physical collection; returns its name.
    pub async fn create_index(&self, index: IndexSpec) -> StoreResult<String> {
        self.backend.create_index(&self.name, index).await
    }

    /// Drops an index by name.
    pub async fn drop_index(&self, name: &str) -> StoreResult<()> {
        self.backend.drop_index(&self.name, name).await
    }

    /// Lists the names of the indexes on the physical collection.
    pub async fn list_indexes(&self) -> StoreResult<Vec<String>> {
        self.backend.list_indexes(&self.name).await
    }
}

/// A virtual collection: a typed, discriminator-scoped view of a shared
/// physical collection.
///
/// The discriminator is computed once at construction (the type's declared
/// override, or its simple name) and never changes; the proxy carries no
/// other state.
#[derive(Debug)]
pub struct VirtualCollection<'a, B: StoreBackend, E: Entity> {
    inner: Collection<'a, B, E>,
    type_name: String,
}

impl<'a, B: StoreBackend, E: Entity> VirtualCollection<'a, B, E> {
    pub(crate) fn new(inner: Collection<'a, B, E>) -> Self {
        let type_name = resolver::discriminator::<E>().to_string();
        log::debug!(
            "virtual collection for {} in {:?} with discriminator {type_name:?}",
            E::type_name(),
            inner.name()
        );
        Self { inner, type_name }
    }

    /// The shared physical collection name.
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// The discriminator value written and matched for this type.
    pub fn discriminator(&self) -> &str {
        &self.type_name
    }

    /// Re-wraps the same physical collection for a different entity type,
    /// with that type's discriminator.
    pub fn with_type<T: Entity>(&self) -> VirtualCollection<'a, B, T> {
        VirtualCollection::new(self.inner.with_type::<T>())
    }

    fn tagged(&self, entity: &E) -> E {
        let mut tagged = entity.clone();
        tagged.set_object_type_id(Some(self.type_name.clone()));
        tagged
    }

    fn scope(&self) -> Expr {
        field(OBJECT_TYPE_FIELD).eq(self.type_name.clone())
    }

    fn scoped(&self, filter: Option<Expr>) -> Expr {
        match filter {
            Some(filter) => filter.and(self.scope()),
            None => self.scope(),
        }
    }

    fn scoped_query(&self, query: Query) -> Query {
        let Query { filter, limit, offset, sort } = query;
        Query { filter: Some(self.scoped(filter)), limit, offset, sort }
    }

    /// Inserts a single entity, tagged with this type's discriminator.
    pub async fn insert_one(&self, entity: &E) -> StoreResult<()> {
        self.inner.insert_one(&self.tagged(entity)).await
    }

    /// Inserts a batch of entities, each tagged with this type's
    /// discriminator.
    pub async fn insert_many(&self, entities: &[E]) -> StoreResult<()> {
        let tagged: Vec<E> = entities.iter().map(|entity| self.tagged(entity)).collect();
        self.inner.insert_many(&tagged).await
    }

    /// Replaces the first entity of this type matching `filter`; the
    /// replacement document carries the discriminator.
    pub async fn replace_one(&self, filter: Expr, entity: &E, upsert: bool) -> StoreResult<()> {
        self.inner
            .replace_one(self.scoped(Some(filter)), &self.tagged(entity), upsert)
            .await
    }

    /// Applies `update` to every entity of this type matching `filter`.
    ///
    /// A `Set(objectTypeId, discriminator)` operator is appended to the
    /// caller's update so documents keep the correct tag through updates.
    pub async fn update_many(&self, filter: Option<Expr>, update: Update) -> StoreResult<u64> {
        self.inner
            .update_many(
                Some(self.scoped(filter)),
                update.set(OBJECT_TYPE_FIELD, self.type_name.clone()),
            )
            .await
    }

    /// Returns the entities of this type matching `query`.
    pub async fn find(&self, query: Query) -> StoreResult<Vec<E>> {
        self.inner.find(self.scoped_query(query)).await
    }

    /// Returns the first entity of this type matching `filter`, or `None`.
    pub async fn find_one(&self, filter: Option<Expr>) -> StoreResult<Option<E>> {
        self.inner.find_one(Some(self.scoped(filter))).await
    }

    /// Counts the entities of this type matching `filter`.
    pub async fn count(&self, filter: Option<Expr>) -> StoreResult<u64> {
        self.inner.count(Some(self.scoped(filter))).await
    }

    /// Deletes the first entity of this type matching `filter`.
    pub async fn delete_one(&self, filter: Expr) -> StoreResult<u64> {
        self.inner.delete_one(self.scoped(Some(filter))).await
    }

    /// Deletes every entity of this type matching `filter`. Entities of
    /// other types sharing the physical collection are never touched.
    pub async fn delete_many(&self, filter: Option<Expr>) -> StoreResult<u64> {
        self.inner.delete_many(Some(self.scoped(filter))).await
    }

    /// Creates an index on the shared physical collection.
    pub async fn create_index(&self, index: IndexSpec) -> StoreResult<String> {
        self.inner.create_index(index).await
    }

    /// Drops an index on the shared physical collection.
    pub async fn drop_index(&self, name: &str) -> StoreResult<()> {
        self.inner.drop_index(name).await
    }

    /// Lists the indexes on the shared physical collection.
    pub async fn list_indexes(&self) -> StoreResult<Vec<String>> {
        self.inner.list_indexes().await
    }
}

/// The working handle a repository operates through: a plain physical
/// collection, or a virtual one when virtual collections are enabled.
///
/// Correctness of discriminator tagging and filtering is decided entirely
/// by which variant the handle is; the repository forwards verbatim.
#[derive(Debug)]
pub enum EntityCollection<'a, B: StoreBackend, E: Entity> {
    /// A plain physical collection handle.
    Physical(Collection<'a, B, E>),
    /// A discriminator-scoped virtual collection handle.
    Virtual(VirtualCollection<'a, B, E>),
}

impl<'a, B: StoreBackend, E: Entity> EntityCollection<'a, B, E> {
    /// The physical collection name.
    pub fn name(&self) -> &str {
        match self {
            EntityCollection::Physical(collection) => collection.name(),
            EntityCollection::Virtual(collection) => collection.name(),
        }
    }

    /// Whether this handle is discriminator-scoped.
    pub fn is_virtual(&self) -> bool {
        matches!(self, EntityCollection::Virtual(_))
    }

    /// The raw physical collection, for advanced operations outside the
    /// virtual layer's capability surface.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotSupported`] on a virtual handle: unscoped
    /// access would bypass the discriminator and observe other types'
    /// documents.
    pub fn physical(&self) -> StoreResult<&Collection<'a, B, E>> {
        match self {
            EntityCollection::Physical(collection) => Ok(collection),
            EntityCollection::Virtual(collection) => Err(StoreError::NotSupported(format!(
                "collection {:?} is virtual; raw physical access would bypass the \
                 discriminator scope",
                collection.name()
            ))),
        }
    }

    /// Inserts a single entity.
    pub async fn insert_one(&self, entity: &E) -> StoreResult<()> {
        match self {
            EntityCollection::Physical(collection) => collection.insert_one(entity).await,
            EntityCollection::Virtual(collection) => collection.insert_one(entity).await,
        }
    }

    /// Inserts a batch of entities.
    pub async fn insert_many(&self, entities: &[E]) -> StoreResult<()> {
        match self {
            EntityCollection::Physical(collection) => collection.insert_many(entities).await,
            EntityCollection::Virtual(collection) => collection.insert_many(entities).await,
        }
    }

    /// Replaces the first entity matching `filter`, optionally upserting.
    pub async fn replace_one(&self, filter: Expr, entity: &E, upsert: bool) -> StoreResult<()> {
        match self {
            EntityCollection::Physical(collection) => {
                collection.replace_one(filter, entity, upsert).await
            }
            EntityCollection::Virtual(collection) => {
                collection.replace_one(filter, entity, upsert).await
            }
        }
    }

    /// Applies `update` to every entity matching `filter`.
    pub async fn update_many(&self, filter: Option<Expr>, update: Update) -> StoreResult<u64> {
        match self {
            EntityCollection::Physical(collection) => collection.update_many(filter, update).await,
            EntityCollection::Virtual(collection) => collection.update_many(filter, update).await,
        }
    }

    /// Returns the entities matching `query`.
    pub async fn find(&self, query: Query) -> StoreResult<Vec<E>> {
        match self {
            EntityCollection::Physical(collection) => collection.find(query).await,
            EntityCollection::Virtual(collection) => collection.find(query).await,
        }
    }

    /// Returns the first entity matching `filter`, or `None`.
    pub async fn find_one(&self, filter: Option<Expr>) -> StoreResult<Option<E>> {
        match self {
            EntityCollection::Physical(collection) => collection.find_one(filter).await,
            EntityCollection::Virtual(collection) => collection.find_one(filter).await,
        }
    }

    /// Counts the entities matching `filter`.
    pub async fn count(&self, filter: Option<Expr>) -> StoreResult<u64> {
        match self {
            EntityCollection::Physical(collection) => collection.count(filter).await,
            EntityCollection::Virtual(collection) => collection.count(filter).await,
        }
    }

    /// Deletes the first entity matching `filter`.
    pub async fn delete_one(&self, filter: Expr) -> StoreResult<u64> {
        match self {
            EntityCollection::Physical(collection) => collection.delete_one(filter).await,
            EntityCollection::Virtual(collection) => collection.delete_one(filter).await,
        }
    }

    /// Deletes every entity matching `filter`.
    pub async fn delete_many(&self, filter: Option<Expr>) -> StoreResult<u64> {
        match self {
            EntityCollection::Physical(collection) => collection.delete_many(filter).await,
            EntityCollection::Virtual(collection) => collection.delete_many(filter).await,
        }
    }

    /// Creates an index on the physical collection.
    pub async fn create_index(&self, index: IndexSpec) -> StoreResult<String> {
        match self {
            EntityCollection::Physical(collection) => collection.create_index(index).await,
            EntityCollection::Virtual(collection) => collection.create_index(index).await,
        }
    }

    /// Drops an index by name.
    pub async fn drop_index(&self, name: &str) -> StoreResult<()> {
        match self {
            EntityCollection::Physical(collection) => collection.drop_index(name).await,
            EntityCollection::Virtual(collection) => collection.drop_index(name).await,
        }
    }

    /// Lists the indexes on the physical collection.
    pub async fn list_indexes(&self) -> StoreResult<Vec<String>> {
        match self {
            EntityCollection::Physical(collection) => collection.list_indexes().await,
            EntityCollection::Virtual(collection) => collection.list_indexes().await,
        }
    }
}
