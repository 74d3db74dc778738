// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::presentation::handlers::scheduler_handler;
use crate::scheduler::task_scheduler::TaskScheduler;
use axum::{
    routing::{get, post},
    Extension, Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// 创建应用路由
///
/// # 参数
///
/// * `scheduler` - 共享的任务调度器
///
/// # 返回值
///
/// 返回配置好的路由
pub fn routes(scheduler: Arc<TaskScheduler>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/version", get(version))
        .route("/scheduler/status", get(scheduler_handler::get_status))
        .route(
            "/scheduler/trigger/{name}",
            post(scheduler_handler::trigger_task),
        )
        .layer(Extension(scheduler))
        .layer(TraceLayer::new_for_http())
}

/// 健康检查端点
pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// 版本信息端点
///
/// # 返回值
///
/// 返回应用版本号
pub async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
