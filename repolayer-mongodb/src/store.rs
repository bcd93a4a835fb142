use async_trait::async_trait;
use bson::{Bson, Document, doc};
use futures::TryStreamExt;
use mongodb::{
    Client, Collection as MongoCollection, IndexModel,
    options::{ClientOptions, FindOptions, IndexOptions},
};

use repolayer_core::{
    backend::{CollectionStats, IndexOrder, IndexSpec, StoreBackend, StoreBackendBuilder, ValidationReport},
    config::StoreConfig,
    error::{StoreError, StoreResult},
    query::{Expr, Query, QueryVisitor, SortDirection},
    update::Update,
};

use crate::query::{MongoQueryTranslator, to_update_document};

#[derive(Debug)]
pub struct MongoStore {
    client: Client,
    database: String,
}

impl MongoStore {
    pub fn new(client: Client, database: String) -> Self {
        Self { client, database }
    }

    /// Builds a store from a parsed configuration. The connection
    /// descriptor is handed to the driver as-is; the virtual-collection
    /// query parameters are unknown URI options the driver ignores.
    pub fn builder(config: &StoreConfig) -> MongoStoreBuilder {
        MongoStoreBuilder::new(config)
    }

    fn collection(&self, collection_name: &str) -> MongoCollection<Document> {
        self.client
            .database(&self.database)
            .collection(collection_name)
    }

    fn filter_document(filter: Option<&Expr>) -> StoreResult<Document> {
        match filter {
            Some(expr) => MongoQueryTranslator.visit_expr(expr),
            None => Ok(doc! {}),
        }
    }
}

fn get_u64(document: &Document, key: &str) -> u64 {
    match document.get(key) {
        Some(Bson::Int32(value)) => *value as u64,
        Some(Bson::Int64(value)) => *value as u64,
        Some(Bson::Double(value)) => *value as u64,
        _ => 0,
    }
}

#[async_trait]
impl StoreBackend for MongoStore {
    async fn insert_one(&self, collection: &str, document: Document) -> StoreResult<()> {
        self.collection(collection)
            .insert_one(document)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(())
    }

    async fn insert_many(&self, collection: &str, documents: Vec<Document>) -> StoreResult<()> {
        self.collection(collection)
            .insert_many(documents)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(())
    }

    async fn replace_one(
        &self,
        collection: &str,
        filter: Expr,
        document: Document,
        upsert: bool,
    ) -> StoreResult<()> {
        self.collection(collection)
            .replace_one(Self::filter_document(Some(&filter))?, document)
            .upsert(upsert)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(())
    }

    async fn update_many(
        &self,
        collection: &str,
        filter: Option<Expr>,
        update: Update,
    ) -> StoreResult<u64> {
        let update_document = to_update_document(&update);
        if update_document.is_empty() {
            return Ok(0);
        }

        let result = self
            .collection(collection)
            .update_many(Self::filter_document(filter.as_ref())?, update_document)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(result.matched_count)
    }

    async fn find(&self, collection: &str, query: Query) -> StoreResult<Vec<Document>> {
        let mut options = FindOptions::default();

        if let Some(limit) = query.limit {
            options.limit = Some(limit as i64);
        }
        if let Some(skip) = query.offset {
            options.skip = Some(skip as u64);
        }
        if let Some(sort) = &query.sort {
            options.sort = Some(doc! {
                sort.field.clone(): match sort.direction {
                    SortDirection::Asc => 1,
                    SortDirection::Desc => -1,
                }
            });
        }

        Ok(self
            .collection(collection)
            .find(Self::filter_document(query.filter.as_ref())?)
            .with_options(options)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?)
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: Option<Expr>,
    ) -> StoreResult<Option<Document>> {
        self.collection(collection)
            .find_one(Self::filter_document(filter.as_ref())?)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    async fn count(&self, collection: &str, filter: Option<Expr>) -> StoreResult<u64> {
        self.collection(collection)
            .count_documents(Self::filter_document(filter.as_ref())?)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    async fn delete_one(&self, collection: &str, filter: Expr) -> StoreResult<u64> {
        let result = self
            .collection(collection)
            .delete_one(Self::filter_document(Some(&filter))?)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(result.deleted_count)
    }

    async fn delete_many(&self, collection: &str, filter: Option<Expr>) -> StoreResult<u64> {
        let result = self
            .collection(collection)
            .delete_many(Self::filter_document(filter.as_ref())?)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(result.deleted_count)
    }

    async fn create_index(&self, collection: &str, index: IndexSpec) -> StoreResult<String> {
        let mut keys = Document::new();
        for (field, order) in index.keys() {
            keys.insert(
                field.clone(),
                match order {
                    IndexOrder::Ascending => Bson::Int32(1),
                    IndexOrder::Descending => Bson::Int32(-1),
                },
            );
        }

        let result = self
            .collection(collection)
            .create_index(
                IndexModel::builder()
                    .keys(keys)
                    .options(
                        IndexOptions::builder()
                            .name(index.name())
                            .unique(index.is_unique())
                            .sparse(index.is_sparse())
                            .build(),
                    )
                    .build(),
            )
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(result.index_name)
    }

    async fn drop_index(&self, collection: &str, name: &str) -> StoreResult<()> {
        self.collection(collection)
            .drop_index(name)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(())
    }

    async fn list_indexes(&self, collection: &str) -> StoreResult<Vec<String>> {
        self.collection(collection)
            .list_index_names()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    async fn drop_collection(&self, name: &str) -> StoreResult<()> {
        self.collection(name)
            .drop()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(())
    }

    async fn list_collections(&self) -> StoreResult<Vec<String>> {
        self.client
            .database(&self.database)
            .list_collection_names()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    async fn reindex_collection(&self, collection: &str) -> StoreResult<()> {
        self.client
            .database(&self.database)
            .run_command(doc! { "reIndex": collection })
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(())
    }

    async fn collection_stats(&self, collection: &str) -> StoreResult<CollectionStats> {
        let stats = self
            .client
            .database(&self.database)
            .run_command(doc! { "collStats": collection })
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(CollectionStats {
            count: get_u64(&stats, "count"),
            data_size: get_u64(&stats, "size"),
            storage_size: get_u64(&stats, "storageSize"),
            capped: stats.get_bool("capped").unwrap_or(false),
        })
    }

    async fn validate_collection(&self, collection: &str) -> StoreResult<ValidationReport> {
        let report = self
            .client
            .database(&self.database)
            .run_command(doc! { "validate": collection })
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let errors = report
            .get_array("errors")
            .map(|errors| {
                errors
                    .iter()
                    .filter_map(|error| error.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        Ok(ValidationReport {
            valid: report.get_bool("valid").unwrap_or(false),
            errors,
        })
    }

    async fn shutdown(self) -> StoreResult<()> {
        self.client.shutdown().await;

        Ok(())
    }
}

pub struct MongoStoreBuilder {
    config: StoreConfig,
}

impl MongoStoreBuilder {
    pub fn new(config: &StoreConfig) -> Self {
        Self { config: config.clone() }
    }
}

#[async_trait]
impl StoreBackendBuilder for MongoStoreBuilder {
    type Backend = MongoStore;

    async fn build(self) -> StoreResult<Self::Backend> {
        Ok(MongoStore::new(
            Client::with_options(
                ClientOptions::parse(self.config.connection_string())
                    .await
                    .map_err(|e| StoreError::Initialization(e.to_string()))?,
            )
            .map_err(|e| StoreError::Initialization(e.to_string()))?,
            self.config.database().to_string(),
        ))
    }
}
