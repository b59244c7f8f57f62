// These tests require a running PostgreSQL database.
// Run with: DATABASE_URL=postgres://... cargo test -p capacity_postgres -- --ignored

use std::time::{SystemTime, UNIX_EPOCH};

use capacity_core::error::CapacityError;
use capacity_core::model::{Capacity, SortOrder};
use capacity_core::ports::{CapacityPersistencePort, CapacityTransaction};
use capacity_postgres::PgCapacityStore;
use sqlx::PgPool;

async fn store() -> PgCapacityStore {
    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "postgresql:///capacity?user=postgres".to_string());
    let pool = PgPool::connect(&database_url).await.unwrap();
    let store = PgCapacityStore::new(pool);
    store.run_migrations().await.unwrap();
    store
}

/// A suffix unique enough to keep test rows apart across runs.
fn unique() -> i64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    (nanos % 1_000_000_000_000) as i64
}

fn capacity(name: &str) -> Capacity {
    Capacity::new(name, "integration test", vec![1, 2, 3])
}

#[tokio::test]
#[ignore = "Requires DATABASE_URL"]
async fn upsert_then_find_by_name() {
    let store = store().await;
    let name = format!("pg-{}", unique());

    let saved = store.upsert(&capacity(&name)).await.unwrap();
    assert!(saved.id.is_some());

    let found = store.find_by_name(&name).await.unwrap().unwrap();
    assert_eq!(found.id, saved.id);
    assert_eq!(found.description, "integration test");
}

#[tokio::test]
#[ignore = "Requires DATABASE_URL"]
async fn duplicate_name_is_already_exists() {
    let store = store().await;
    let name = format!("dup-{}", unique());
    store.upsert(&capacity(&name)).await.unwrap();

    let err = store.upsert(&capacity(&name)).await.unwrap_err();
    assert!(matches!(err, CapacityError::EntityAlreadyExists(_)));
}

#[tokio::test]
#[ignore = "Requires DATABASE_URL"]
async fn uncommitted_transaction_is_discarded() {
    let store = store().await;
    let name = format!("rollback-{}", unique());

    {
        let mut tx = store.begin().await.unwrap();
        tx.upsert(&capacity(&name)).await.unwrap();
    }

    assert!(store.find_by_name(&name).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "Requires DATABASE_URL"]
async fn assignments_and_other_bootcamp_check() {
    let store = store().await;
    let seed = unique();
    let a = store
        .upsert(&capacity(&format!("a-{seed}")))
        .await
        .unwrap()
        .id
        .unwrap();
    let b = store
        .upsert(&capacity(&format!("b-{seed}")))
        .await
        .unwrap()
        .id
        .unwrap();
    let bootcamp_1 = seed;
    let bootcamp_2 = seed + 1;

    store
        .assign_capabilities_to_bootcamp(bootcamp_1, &[a, b])
        .await
        .unwrap();
    store
        .assign_capabilities_to_bootcamp(bootcamp_2, &[a])
        .await
        .unwrap();

    let linked = store
        .find_capabilities_by_bootcamp_id(bootcamp_1)
        .await
        .unwrap();
    assert_eq!(linked.len(), 2);

    assert!(store.verify_other_assignations(a, bootcamp_1).await.unwrap());
    assert!(!store.verify_other_assignations(b, bootcamp_1).await.unwrap());

    let grouped = store
        .find_capabilities_by_bootcamps_ids(&[bootcamp_2, bootcamp_1])
        .await
        .unwrap();
    assert_eq!(grouped.len(), 2);
    assert_eq!(grouped[0].id, bootcamp_2);
    assert_eq!(grouped[1].capabilities.len(), 2);

    store.delete_all_assignations(bootcamp_1).await.unwrap();
    store.delete_all_capabilities(&[b]).await.unwrap();
    assert!(store.find_all_by_ids(&[b]).await.unwrap().is_empty());
    assert!(store
        .find_capabilities_by_bootcamp_id(bootcamp_1)
        .await
        .unwrap()
        .is_empty());

    store.delete_all_assignations(bootcamp_2).await.unwrap();
    store.delete_all_capabilities(&[a]).await.unwrap();
}

#[tokio::test]
#[ignore = "Requires DATABASE_URL"]
async fn name_page_respects_size() {
    let store = store().await;
    store
        .upsert(&capacity(&format!("order-{}", unique())))
        .await
        .unwrap();

    let page = store
        .find_paginated_and_sort_by_name(SortOrder::Ascending, 50, 0)
        .await
        .unwrap();
    assert!(!page.is_empty());
    assert!(page.len() <= 50);
    assert!(store.count_capabilities().await.unwrap() >= page.len() as i64);
}
