//! The entity store: configuration plus backend, and the factory for
//! repositories, managers and working handles.

use crate::backend::StoreBackend;
use crate::collection::{Collection, EntityCollection, VirtualCollection};
use crate::config::StoreConfig;
use crate::entity::Entity;
use crate::error::StoreResult;
use crate::registry;
use crate::repository::{Repository, RepositoryManager};
use crate::resolver::resolve_collection_name;

/// A store bound to a specific backend implementation and configuration.
///
/// Construction finalizes the process-wide entity registry. Handle
/// construction resolves the physical collection name for the entity type
/// and, when virtual collections are enabled, wraps the physical handle in
/// a [`VirtualCollection`] — every repository operation then flows through
/// the discriminator-scoping proxy.
///
/// # Example
///
/// ```ignore
/// let config = StoreConfig::parse("mongodb://localhost/app?virtual=true")?;
/// let store = EntityStore::new(backend, config);
/// let users = store.repository::<User>()?;
/// ```
#[derive(Debug)]
pub struct EntityStore<B: StoreBackend> {
    backend: B,
    config: StoreConfig,
}

impl<B: StoreBackend> EntityStore<B> {
    /// Creates a store over the given backend and configuration.
    pub fn new(backend: B, config: StoreConfig) -> Self {
        registry::ensure_initialized();
        log::debug!(
            "entity store opened for database {:?} (virtual collections {})",
            config.database(),
            if config.virtual_enabled() { "enabled" } else { "disabled" }
        );
        Self { backend, config }
    }

    /// The store configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Builds the working collection handle for an entity type: the
    /// resolved physical collection, virtual-wrapped when enabled.
    ///
    /// # Errors
    ///
    /// Fails with a configuration error when name resolution does (see
    /// [`resolve_collection_name`]).
    pub fn collection<E: Entity>(&self) -> StoreResult<EntityCollection<'_, B, E>> {
        let name = resolve_collection_name::<E>(&self.config)?;
        let physical = Collection::new(name, &self.backend);

        Ok(if self.config.virtual_enabled() {
            EntityCollection::Virtual(VirtualCollection::new(physical))
        } else {
            EntityCollection::Physical(physical)
        })
    }

    /// Builds a repository for an entity type.
    pub fn repository<E: Entity>(&self) -> StoreResult<Repository<'_, B, E>> {
        Ok(Repository::new(self.collection::<E>()?))
    }

    /// Builds an administrative manager for an entity type's physical
    /// collection.
    pub fn manager<E: Entity>(&self) -> StoreResult<RepositoryManager<'_, B, E>> {
        let name = resolve_collection_name::<E>(&self.config)?;
        Ok(RepositoryManager::new(name, &self.backend))
    }

    /// Drops a collection by name.
    pub async fn drop_collection(&self, name: &str) -> StoreResult<()> {
        self.backend.drop_collection(name).await
    }

    /// Lists the names of all collections in the store.
    pub async fn list_collections(&self) -> StoreResult<Vec<String>> {
        self.backend.list_collections().await
    }

    /// Shuts down the store, releasing backend resources.
    pub async fn shutdown(self) -> StoreResult<()> {
        self.backend.shutdown().await
    }
}
