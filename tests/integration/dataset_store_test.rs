// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{comp, item, items, setup_db};
use metacrawl::domain::models::entity_type::EntityType;
use metacrawl::domain::repositories::dataset_repository::{DatasetRepository, RepositoryError};
use metacrawl::domain::services::dataset_validator::DatasetValidator;
use metacrawl::infrastructure::database::entities::{comp_detail, item as item_entity};
use metacrawl::infrastructure::repositories::dataset_repo_impl::AtomicReplaceStore;
use sea_orm::{EntityTrait, PaginatorTrait, QueryOrder};
use serde_json::json;

#[tokio::test]
async fn test_validated_dataset_is_stored() {
    let db = setup_db().await;
    let store = AtomicReplaceStore::new(db.clone());
    let validator = DatasetValidator::new(10);

    let too_few = items(7);
    assert!(validator.ensure_valid(EntityType::Items, &too_few).is_err());

    let enough = items(11);
    validator.ensure_valid(EntityType::Items, &enough).unwrap();
    let summary = store
        .replace(EntityType::Items, &enough, "stats-site-items")
        .await
        .unwrap();

    assert_eq!(summary.previous, 0);
    assert_eq!(summary.written, 11);
    assert_eq!(store.count(EntityType::Items).await.unwrap(), 11);

    let rows = item_entity::Entity::find()
        .order_by_asc(item_entity::Column::Name)
        .all(db.as_ref())
        .await
        .unwrap();
    assert_eq!(rows[0].name, "Item 0");
    assert_eq!(rows[0].source, "stats-site-items");
    assert_eq!(rows[0].components, json!(["B.F. Sword", "Recurve Bow"]));
    assert_eq!(rows[0].games, Some(1200));
}

#[tokio::test]
async fn test_repeated_rows_never_reach_storage() {
    let db = setup_db().await;
    let store = AtomicReplaceStore::new(db);
    let validator = DatasetValidator::new(10);

    let repeated: Vec<_> = (0..12)
        .map(|i| item(&format!("Item {}", i % 3), 4.0))
        .collect();
    let err = validator
        .ensure_valid(EntityType::Items, &repeated)
        .unwrap_err();

    assert!(err.reason.contains("got 3"));
    assert_eq!(store.count(EntityType::Items).await.unwrap(), 0);
}

#[tokio::test]
async fn test_failed_write_keeps_previous_dataset() {
    let db = setup_db().await;
    let store = AtomicReplaceStore::new(db.clone());

    store
        .replace(EntityType::Items, &items(11), "stats-site-items")
        .await
        .unwrap();

    // 空名称违反表约束，写入在事务中途失败
    let mut broken = items(12);
    broken.push(item("", 4.5));
    let result = store
        .replace(EntityType::Items, &broken, "stats-site-items")
        .await;
    assert!(matches!(result, Err(RepositoryError::Database(_))));

    assert_eq!(store.count(EntityType::Items).await.unwrap(), 11);
    let names: Vec<String> = item_entity::Entity::find()
        .all(db.as_ref())
        .await
        .unwrap()
        .into_iter()
        .map(|row| row.name)
        .collect();
    assert!(!names.contains(&"Item 11".to_string()));
}

#[tokio::test]
async fn test_replace_is_idempotent_and_keeps_created_at() {
    let db = setup_db().await;
    let store = AtomicReplaceStore::new(db.clone());
    let records = items(11);

    store
        .replace(EntityType::Items, &records, "stats-site-items")
        .await
        .unwrap();
    let first = item_entity::Entity::find_by_id("Item 3".to_string())
        .one(db.as_ref())
        .await
        .unwrap()
        .unwrap();

    let summary = store
        .replace(EntityType::Items, &records, "static-mirror-items")
        .await
        .unwrap();
    assert_eq!(summary.previous, 11);
    assert_eq!(summary.written, 11);
    assert_eq!(store.count(EntityType::Items).await.unwrap(), 11);

    let second = item_entity::Entity::find_by_id("Item 3".to_string())
        .one(db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(second.created_at, first.created_at);
    assert!(second.updated_at >= first.updated_at);
    assert_eq!(second.source, "static-mirror-items");
    assert_eq!(second.avg_placement, first.avg_placement);
}

#[tokio::test]
async fn test_duplicate_keys_collapse_to_one_row() {
    let db = setup_db().await;
    let store = AtomicReplaceStore::new(db.clone());

    let mut records = items(11);
    records.push(item("Item 0", 2.0));
    let summary = store
        .replace(EntityType::Items, &records, "stats-site-items")
        .await
        .unwrap();

    assert_eq!(summary.written, 11);
    let row = item_entity::Entity::find_by_id("Item 0".to_string())
        .one(db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.avg_placement, Some(2.0));
}

#[tokio::test]
async fn test_comp_details_follow_comps() {
    let db = setup_db().await;
    let store = AtomicReplaceStore::new(db.clone());

    let records = vec![
        comp("reroll-jinx", Some(json!({ "carry": "Jinx" }))),
        comp("fast-8", None),
        comp("vertical-enforcer", Some(json!({ "carry": "Vi" }))),
    ];
    let summary = store
        .replace(EntityType::Comps, &records, "stats-site-comps")
        .await
        .unwrap();
    assert_eq!(summary.written, 3);
    assert_eq!(summary.details_written, 2);

    let detail = comp_detail::Entity::find_by_id("reroll-jinx".to_string())
        .one(db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(detail.payload, json!({ "carry": "Jinx" }));

    let without_details = vec![comp("fast-8", None), comp("reroll-jinx", None)];
    let summary = store
        .replace(EntityType::Comps, &without_details, "static-mirror-comps")
        .await
        .unwrap();
    assert_eq!(summary.previous, 3);
    assert_eq!(summary.details_written, 0);
    assert_eq!(store.count(EntityType::Comps).await.unwrap(), 2);
    assert_eq!(comp_detail::Entity::find().count(db.as_ref()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_mismatched_records_are_refused() {
    let db = setup_db().await;
    let store = AtomicReplaceStore::new(db);

    let result = store
        .replace(EntityType::Champions, &items(11), "stats-site-items")
        .await;

    assert!(matches!(
        result,
        Err(RepositoryError::EntityMismatch {
            expected: EntityType::Champions,
            found: EntityType::Items,
        })
    ));
    assert_eq!(store.count(EntityType::Champions).await.unwrap(), 0);
}
