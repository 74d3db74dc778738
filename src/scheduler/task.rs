// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::entity_type::EntityType;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio_cron_scheduler::JobSchedulerError;

/// 调度器错误类型
#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("Unknown task: {0}")]
    UnknownTask(String),
    #[error("Invalid schedule '{expression}' for task {name}: {reason}")]
    InvalidSchedule {
        name: String,
        expression: String,
        reason: String,
    },
    #[error("Scheduler backend error: {0}")]
    Backend(#[from] JobSchedulerError),
}

/// 任务执行体
///
/// 定时触发和手动触发走同一个执行入口
#[async_trait]
pub trait TaskAction: Send + Sync {
    async fn execute(&self) -> anyhow::Result<()>;
}

/// 任务注册配置
#[derive(Clone)]
pub struct ScheduledTaskConfig {
    /// 任务名称，注册表中唯一
    pub name: String,
    /// 标准 5 字段 cron 表达式
    pub cron_expression: String,
    /// 注册时是否自动启动
    pub enabled: bool,
    pub entity_type: Option<EntityType>,
    pub action: Arc<dyn TaskAction>,
}

impl ScheduledTaskConfig {
    pub fn new(
        name: impl Into<String>,
        cron_expression: impl Into<String>,
        action: Arc<dyn TaskAction>,
    ) -> Self {
        Self {
            name: name.into(),
            cron_expression: cron_expression.into(),
            enabled: true,
            entity_type: None,
            action,
        }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn for_entity(mut self, entity: EntityType) -> Self {
        self.entity_type = Some(entity);
        self
    }
}

/// 任务状态快照
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskStatus {
    pub name: String,
    pub schedule: String,
    pub enabled: bool,
    /// 是否存在活动的 cron 句柄
    pub running: bool,
    /// 当前是否有一次执行尚未结束
    pub in_progress: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<EntityType>,
    pub last_run: Option<DateTime<Utc>>,
    pub last_success: Option<bool>,
    pub last_duration_ms: Option<u64>,
}
