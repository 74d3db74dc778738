// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{item_names, items_table, setup_db, UnavailableBrowser};
use config::Config;
use metacrawl::application::use_cases::dataset_tasks::register_dataset_tasks;
use metacrawl::config::settings::Settings;
use metacrawl::domain::models::entity_type::EntityType;
use metacrawl::domain::repositories::dataset_repository::DatasetRepository;
use metacrawl::engines::source_profile::SourceCatalog;
use metacrawl::infrastructure::repositories::dataset_repo_impl::AtomicReplaceStore;
use metacrawl::scheduler::task_scheduler::TaskScheduler;
use std::collections::HashMap;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings() -> Settings {
    let builder = Settings::with_defaults(Config::builder())
        .unwrap()
        .set_override("extraction.retry_attempts", 2)
        .unwrap()
        .set_override("extraction.retry_base_delay_ms", 5)
        .unwrap();
    Settings::from_builder(builder).unwrap()
}

/// 浏览器主来源加静态镜像，只覆盖物品
fn catalog(base: &str) -> SourceCatalog {
    let yaml = format!(
        r#"
sources:
  - name: stats-site-items
    kind: browser
    entity: items
    priority: 0
    url: {base}/app/items
    schema:
      row: "table.items tbody tr"
      fields:
        name: "td.name"
  - name: static-mirror-items
    kind: http
    entity: items
    priority: 10
    url: {base}/items
    schema:
      row: "table.items tbody tr"
      fields:
        name: "td.name"
        icon_url: {{ selector: "td.name img", attr: src }}
        avg_placement: "td.avg"
"#
    );
    SourceCatalog::from_yaml_str(&yaml).unwrap()
}

async fn serve_items(server: &MockServer, count: usize) {
    server.reset().await;
    Mock::given(method("GET"))
        .and(path("/items"))
        .respond_with(ResponseTemplate::new(200).set_body_string(items_table(item_names(0..count))))
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_manual_refresh_falls_back_and_replaces_dataset() {
    let server = MockServer::start().await;
    serve_items(&server, 12).await;

    let db = setup_db().await;
    let store = Arc::new(AtomicReplaceStore::new(db));
    let scheduler = TaskScheduler::new().await.unwrap();

    let registered = register_dataset_tasks(
        &scheduler,
        &settings(),
        &catalog(&server.uri()),
        Arc::new(UnavailableBrowser),
        store.clone(),
        |_: &str| None,
    )
    .await
    .unwrap();
    assert_eq!(registered, vec!["items".to_string()]);

    assert!(scheduler.trigger("items").await);
    assert_eq!(store.count(EntityType::Items).await.unwrap(), 12);

    let status = scheduler.status().await;
    assert_eq!(status.len(), 1);
    assert_eq!(status[0].entity_type, Some(EntityType::Items));
    assert_eq!(status[0].last_success, Some(true));
    assert!(!status[0].in_progress);

    scheduler.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_thin_result_leaves_stored_dataset_untouched() {
    let server = MockServer::start().await;
    serve_items(&server, 12).await;

    let db = setup_db().await;
    let store = Arc::new(AtomicReplaceStore::new(db));
    let scheduler = TaskScheduler::new().await.unwrap();
    register_dataset_tasks(
        &scheduler,
        &settings(),
        &catalog(&server.uri()),
        Arc::new(UnavailableBrowser),
        store.clone(),
        |_: &str| None,
    )
    .await
    .unwrap();

    assert!(scheduler.trigger("items").await);

    serve_items(&server, 5).await;
    assert!(!scheduler.trigger("items").await);
    assert_eq!(store.count(EntityType::Items).await.unwrap(), 12);

    let status = scheduler.status().await;
    assert_eq!(status[0].last_success, Some(false));

    scheduler.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_schedule_overrides_come_from_lookup() {
    let server = MockServer::start().await;
    let db = setup_db().await;
    let store = Arc::new(AtomicReplaceStore::new(db));
    let scheduler = TaskScheduler::new().await.unwrap();

    let env: HashMap<&str, &str> = HashMap::from([
        ("METACRAWL_ITEMS_SCHEDULE", "0 4 * * 1"),
        ("METACRAWL_ITEMS_ENABLED", "false"),
    ]);
    register_dataset_tasks(
        &scheduler,
        &settings(),
        &catalog(&server.uri()),
        Arc::new(UnavailableBrowser),
        store,
        |key: &str| env.get(key).map(|v| v.to_string()),
    )
    .await
    .unwrap();

    let status = scheduler.status().await;
    assert_eq!(status[0].name, "items");
    assert_eq!(status[0].schedule, "0 4 * * 1");
    assert!(!status[0].enabled);
    assert!(!status[0].running);
    assert!(scheduler.enabled_tasks().await.is_empty());

    scheduler.shutdown().await.unwrap();
}
