mod common;

use common::*;
use repolayer::prelude::*;

const PLAIN: &str = "mongodb://localhost/app";

#[tokio::test]
async fn add_and_get_by_id_round_trips() {
    let (backend, store) = open_store(PLAIN);
    let products = store.repository::<Product>().unwrap();

    let product = Product::new("apple", 3);
    products.add(&product).await.unwrap();

    let fetched = products.get_by_id(&product.id).await.unwrap().unwrap();
    assert_eq!(fetched.id, product.id);
    assert_eq!(fetched.name, "apple");

    // Object-id keys are stored in the native representation `_id` is
    // indexed under, not as strings.
    let stored = backend.find_one("Product", None).await.unwrap().unwrap();
    assert!(matches!(stored.get("_id"), Some(bson::Bson::ObjectId(_))));
}

#[tokio::test]
async fn get_by_id_returns_none_for_unknown_ids() {
    let (_, store) = open_store(PLAIN);
    let products = store.repository::<Product>().unwrap();

    let absent = products
        .get_by_id(&repolayer::codec::new_object_id())
        .await
        .unwrap();
    assert!(absent.is_none());
}

#[tokio::test]
async fn update_upserts_by_id() {
    let (_, store) = open_store(PLAIN);
    let products = store.repository::<Product>().unwrap();

    // Updating a never-added entity inserts it.
    let mut product = Product::new("apple", 3);
    products.update(&product).await.unwrap();
    assert_eq!(products.count().await.unwrap(), 1);

    product.price = 4;
    products.update(&product).await.unwrap();
    assert_eq!(products.count().await.unwrap(), 1);

    let fetched = products.get_by_id(&product.id).await.unwrap().unwrap();
    assert_eq!(fetched.price, 4);
}

#[tokio::test]
async fn add_many_and_find_with_query() {
    let (_, store) = open_store(PLAIN);
    let products = store.repository::<Product>().unwrap();

    products
        .add_many(&[
            Product::new("apple", 3),
            Product::new("pear", 5),
            Product::new("plum", 7),
        ])
        .await
        .unwrap();

    let cheapest = products
        .find(
            Query::builder()
                .filter(field("price").lte(5i64))
                .sort("price", SortDirection::Asc)
                .limit(1)
                .build(),
        )
        .await
        .unwrap();

    assert_eq!(cheapest.len(), 1);
    assert_eq!(cheapest[0].name, "apple");
}

#[tokio::test]
async fn count_where_and_exists() {
    let (_, store) = open_store(PLAIN);
    let products = store.repository::<Product>().unwrap();

    products
        .add_many(&[Product::new("apple", 3), Product::new("pear", 5)])
        .await
        .unwrap();

    assert_eq!(
        products.count_where(field("price").gt(3i64)).await.unwrap(),
        1
    );
    assert!(products.exists(field("name").eq("pear")).await.unwrap());
    assert!(!products.exists(field("name").eq("fig")).await.unwrap());
}

#[tokio::test]
async fn delete_by_entity_id_and_filter() {
    let (_, store) = open_store(PLAIN);
    let products = store.repository::<Product>().unwrap();

    let apple = Product::new("apple", 3);
    let pear = Product::new("pear", 5);
    let plum = Product::new("plum", 7);
    products.add_many(&[apple.clone(), pear.clone(), plum.clone()]).await.unwrap();

    products.delete(&apple).await.unwrap();
    assert!(products.get_by_id(&apple.id).await.unwrap().is_none());

    products.delete_by_id(&pear.id).await.unwrap();
    assert_eq!(products.count().await.unwrap(), 1);

    let deleted = products.delete_where(field("name").eq("plum")).await.unwrap();
    assert_eq!(deleted, 1);
    assert_eq!(products.count().await.unwrap(), 0);
}

#[tokio::test]
async fn explicit_collection_name_and_opaque_keys() {
    let (backend, store) = open_store(PLAIN);
    let customs = store.repository::<CustomIdEntity>().unwrap();

    assert_eq!(customs.collection_name(), "MyTestCollection");

    let entity = CustomIdEntity::new("first");
    customs.add(&entity).await.unwrap();

    let fetched = customs.get_by_id(&entity.id).await.unwrap().unwrap();
    assert_eq!(fetched.label, "first");

    // Opaque keys are compared exactly as they serialize.
    let stored = backend
        .find_one("MyTestCollection", None)
        .await
        .unwrap()
        .unwrap();
    assert!(stored.get("_id").is_some());
    assert!(!matches!(stored.get("_id"), Some(bson::Bson::ObjectId(_))));
}

#[tokio::test]
async fn update_where_applies_operators() {
    let (_, store) = open_store(PLAIN);
    let products = store.repository::<Product>().unwrap();

    products
        .add_many(&[Product::new("apple", 3), Product::new("pear", 5)])
        .await
        .unwrap();

    let matched = products
        .update_where(field("price").lt(10i64), Update::new().inc("price", 1))
        .await
        .unwrap();
    assert_eq!(matched, 2);

    assert_eq!(
        products.count_where(field("price").eq(4i64)).await.unwrap(),
        1
    );
    assert_eq!(
        products.count_where(field("price").eq(6i64)).await.unwrap(),
        1
    );
}

#[tokio::test]
async fn manager_tracks_collection_lifecycle() {
    let (_, store) = open_store(PLAIN);
    let products = store.repository::<Product>().unwrap();
    let manager = store.manager::<Product>().unwrap();

    assert_eq!(manager.name(), "Product");
    assert!(!manager.exists().await.unwrap());

    products.add(&Product::new("apple", 3)).await.unwrap();
    assert!(manager.exists().await.unwrap());

    manager.drop().await.unwrap();
    assert!(!manager.exists().await.unwrap());
}

#[tokio::test]
async fn manager_index_round_trip() {
    let (_, store) = open_store(PLAIN);
    let products = store.repository::<Product>().unwrap();
    let manager = store.manager::<Product>().unwrap();

    products.add(&Product::new("apple", 3)).await.unwrap();

    let name = manager.ensure_index(IndexSpec::on("name").unique()).await.unwrap();
    assert_eq!(name, "name_1");
    assert!(manager.index_exists("name_1").await.unwrap());

    let names = manager
        .ensure_indexes(vec![IndexSpec::on("price").descending(), IndexSpec::on("name").and("price")])
        .await
        .unwrap();
    assert_eq!(names, vec!["price_-1", "name_1_price_1"]);
    assert!(manager
        .indexes_exist(&["name_1", "price_-1", "name_1_price_1"])
        .await
        .unwrap());

    manager.drop_index("price_-1").await.unwrap();
    assert!(!manager.index_exists("price_-1").await.unwrap());

    manager.drop_all_indexes().await.unwrap();
    assert_eq!(manager.list_indexes().await.unwrap(), vec!["_id_"]);
}

#[tokio::test]
async fn manager_stats_and_validation() {
    let (_, store) = open_store(PLAIN);
    let products = store.repository::<Product>().unwrap();
    let manager = store.manager::<Product>().unwrap();

    products
        .add_many(&[Product::new("apple", 3), Product::new("pear", 5)])
        .await
        .unwrap();

    let stats = manager.stats().await.unwrap();
    assert_eq!(stats.count, 2);
    assert!(manager.data_size().await.unwrap() > 0);
    assert!(manager.storage_size().await.unwrap() > 0);
    assert!(!manager.is_capped().await.unwrap());

    let report = manager.validate().await.unwrap();
    assert!(report.valid);
    assert!(report.errors.is_empty());

    manager.reindex().await.unwrap();
}

#[tokio::test]
async fn duplicate_ids_surface_the_backend_error() {
    let (_, store) = open_store(PLAIN);
    let products = store.repository::<Product>().unwrap();

    let product = Product::new("apple", 3);
    products.add(&product).await.unwrap();

    assert!(matches!(
        products.add(&product).await,
        Err(StoreError::DocumentAlreadyExists(..))
    ));
}

#[tokio::test]
async fn store_lists_and_drops_collections() {
    let (_, store) = open_store(PLAIN);
    let products = store.repository::<Product>().unwrap();
    let customs = store.repository::<CustomIdEntity>().unwrap();

    products.add(&Product::new("apple", 3)).await.unwrap();
    customs.add(&CustomIdEntity::new("first")).await.unwrap();

    let mut collections = store.list_collections().await.unwrap();
    collections.sort();
    assert_eq!(collections, vec!["MyTestCollection", "Product"]);

    store.drop_collection("Product").await.unwrap();
    let collections = store.list_collections().await.unwrap();
    assert_eq!(collections, vec!["MyTestCollection"]);
}
