// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::presentation::errors::AppError;
use crate::scheduler::task::{SchedulerError, TaskStatus};
use crate::scheduler::task_scheduler::TaskScheduler;
use axum::extract::{Extension, Path};
use axum::Json;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

/// 所有已注册任务的状态
pub async fn get_status(
    Extension(scheduler): Extension<Arc<TaskScheduler>>,
) -> Json<Vec<TaskStatus>> {
    Json(scheduler.status().await)
}

/// 手动触发任务
///
/// 等待本次执行结束后返回 `{"success": bool, "task": name}`，
/// 任务名未注册时返回 400
pub async fn trigger_task(
    Extension(scheduler): Extension<Arc<TaskScheduler>>,
    Path(name): Path<String>,
) -> Result<Json<Value>, AppError> {
    if !scheduler.is_registered(&name).await {
        return Err(SchedulerError::UnknownTask(name).into());
    }

    info!(task = %name, "Manual trigger requested");
    let success = scheduler.trigger(&name).await;
    Ok(Json(json!({ "success": success, "task": name })))
}
