// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum_test::TestServer;
use metacrawl::domain::models::entity_type::EntityType;
use metacrawl::presentation::routes;
use metacrawl::scheduler::task::{ScheduledTaskConfig, TaskAction};
use metacrawl::scheduler::task_scheduler::TaskScheduler;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::util::ServiceExt;

struct CountingAction {
    runs: Arc<AtomicUsize>,
}

#[async_trait]
impl TaskAction for CountingAction {
    async fn execute(&self) -> anyhow::Result<()> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

async fn scheduler_with_comps(runs: Arc<AtomicUsize>) -> Arc<TaskScheduler> {
    let scheduler = TaskScheduler::new().await.unwrap();
    scheduler
        .register(
            ScheduledTaskConfig::new("comps", "0 */6 * * *", Arc::new(CountingAction { runs }))
                .for_entity(EntityType::Comps),
        )
        .await
        .unwrap();
    Arc::new(scheduler)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_health_check() {
    let scheduler = scheduler_with_comps(Arc::new(AtomicUsize::new(0))).await;
    let app = routes::routes(scheduler);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_status_lists_registered_tasks() {
    let scheduler = scheduler_with_comps(Arc::new(AtomicUsize::new(0))).await;
    let server = TestServer::new(routes::routes(scheduler.clone())).unwrap();

    let response = server.get("/scheduler/status").await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body: Value = response.json();
    let tasks = body.as_array().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["name"], "comps");
    assert_eq!(tasks[0]["schedule"], "0 */6 * * *");
    assert_eq!(tasks[0]["entity_type"], "comps");
    assert_eq!(tasks[0]["enabled"], true);
    assert!(tasks[0]["last_run"].is_null());

    scheduler.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_trigger_runs_task_now() {
    let runs = Arc::new(AtomicUsize::new(0));
    let scheduler = scheduler_with_comps(runs.clone()).await;
    let server = TestServer::new(routes::routes(scheduler.clone())).unwrap();

    let response = server.post("/scheduler/trigger/comps").await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["task"], "comps");
    assert_eq!(runs.load(Ordering::SeqCst), 1);

    let status: Value = server.get("/scheduler/status").await.json();
    assert_eq!(status[0]["last_success"], true);

    scheduler.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_trigger_unknown_task_is_rejected() {
    let runs = Arc::new(AtomicUsize::new(0));
    let scheduler = scheduler_with_comps(runs.clone()).await;
    let server = TestServer::new(routes::routes(scheduler.clone())).unwrap();

    let response = server.post("/scheduler/trigger/patch-notes").await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("patch-notes"));
    assert_eq!(runs.load(Ordering::SeqCst), 0);

    scheduler.shutdown().await.unwrap();
}
