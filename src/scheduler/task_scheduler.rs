// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::scheduler::schedule_config::normalize_cron;
use crate::scheduler::task::{ScheduledTaskConfig, SchedulerError, TaskAction, TaskStatus};
use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy)]
struct RunRecord {
    finished_at: DateTime<Utc>,
    success: bool,
    duration: Duration,
}

/// 任务运行期状态，重新注册同名任务时保留
#[derive(Default)]
struct TaskRuntime {
    in_progress: AtomicBool,
    last: parking_lot::Mutex<Option<RunRecord>>,
}

/// 执行期间持有运行锁，离开作用域（包括 panic）时释放
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

struct TaskEntry {
    config: ScheduledTaskConfig,
    /// 后端使用的秒级表达式
    schedule: String,
    job: Option<Uuid>,
    runtime: Arc<TaskRuntime>,
}

/// 定时任务调度器
///
/// 状态流转：注册 → 运行（存在 cron 句柄）→ 停止（句柄移除，配置保留）→ 注销。
/// 执行失败只记录日志和指标，任务保持注册，等待下一次触发。
pub struct TaskScheduler {
    cron: JobScheduler,
    tasks: Mutex<HashMap<String, TaskEntry>>,
}

/// 定时和手动触发共用的执行路径
///
/// 同名任务已在执行时跳过本次调用并返回 false
async fn execute(name: &str, action: &dyn TaskAction, runtime: &TaskRuntime, origin: &'static str) -> bool {
    if runtime.in_progress.swap(true, Ordering::SeqCst) {
        warn!(task = name, origin, "Task is already running, skipping invocation");
        counter!("task_runs_total", "task" => name.to_string(), "outcome" => "skipped").increment(1);
        return false;
    }
    let _guard = RunGuard(&runtime.in_progress);

    info!(task = name, origin, "Task started");
    let started = Instant::now();
    let result = action.execute().await;
    let duration = started.elapsed();

    *runtime.last.lock() = Some(RunRecord {
        finished_at: Utc::now(),
        success: result.is_ok(),
        duration,
    });
    histogram!("task_run_duration_seconds", "task" => name.to_string()).record(duration.as_secs_f64());

    match result {
        Ok(()) => {
            counter!("task_runs_total", "task" => name.to_string(), "outcome" => "success").increment(1);
            info!(task = name, origin, duration_ms = duration.as_millis() as u64, "Task completed");
            true
        }
        Err(e) => {
            counter!("task_runs_total", "task" => name.to_string(), "outcome" => "failure").increment(1);
            error!(
                task = name,
                origin,
                duration_ms = duration.as_millis() as u64,
                "Task failed: {:#}",
                e
            );
            false
        }
    }
}

impl TaskScheduler {
    /// 创建调度器并启动 cron 后端
    pub async fn new() -> Result<Self, SchedulerError> {
        let cron = JobScheduler::new().await?;
        cron.start().await?;
        Ok(Self {
            cron,
            tasks: Mutex::new(HashMap::new()),
        })
    }

    fn build_job(entry: &TaskEntry) -> Result<Job, SchedulerError> {
        let name = entry.config.name.clone();
        let action = entry.config.action.clone();
        let runtime = entry.runtime.clone();

        Job::new_async(entry.schedule.as_str(), move |_uuid, _lock| {
            let name = name.clone();
            let action = action.clone();
            let runtime = runtime.clone();
            Box::pin(async move {
                execute(&name, action.as_ref(), &runtime, "schedule").await;
            })
        })
        .map_err(|e| SchedulerError::InvalidSchedule {
            name: entry.config.name.clone(),
            expression: entry.config.cron_expression.clone(),
            reason: e.to_string(),
        })
    }

    async fn start_entry(&self, entry: &mut TaskEntry) -> Result<(), SchedulerError> {
        if entry.job.is_some() {
            return Ok(());
        }
        let job = Self::build_job(entry)?;
        entry.job = Some(self.cron.add(job).await?);
        info!(task = %entry.config.name, schedule = %entry.config.cron_expression, "Task started on schedule");
        Ok(())
    }

    async fn stop_entry(&self, entry: &mut TaskEntry) -> Result<(), SchedulerError> {
        if let Some(job) = entry.job.take() {
            self.cron.remove(&job).await?;
            info!(task = %entry.config.name, "Task schedule stopped");
        }
        Ok(())
    }

    /// 注册任务
    ///
    /// 同名任务先停止旧句柄再替换；`enabled` 为 true 时立即启动
    pub async fn register(&self, config: ScheduledTaskConfig) -> Result<(), SchedulerError> {
        let schedule =
            normalize_cron(&config.cron_expression).map_err(|reason| SchedulerError::InvalidSchedule {
                name: config.name.clone(),
                expression: config.cron_expression.clone(),
                reason,
            })?;

        let mut tasks = self.tasks.lock().await;
        let runtime = tasks
            .get(&config.name)
            .map(|old| old.runtime.clone())
            .unwrap_or_default();
        let mut entry = TaskEntry {
            config,
            schedule,
            job: None,
            runtime,
        };
        // 禁用的任务同样校验表达式；校验失败时旧任务保持不变
        Self::build_job(&entry)?;

        if let Some(mut old) = tasks.remove(&entry.config.name) {
            info!(task = %entry.config.name, "Replacing registered task");
            if let Err(e) = self.stop_entry(&mut old).await {
                tasks.insert(old.config.name.clone(), old);
                return Err(e);
            }
            if entry.config.enabled {
                if let Err(e) = self.start_entry(&mut entry).await {
                    if old.config.enabled {
                        if let Err(restore) = self.start_entry(&mut old).await {
                            warn!(task = %old.config.name, "Failed to restore previous schedule: {}", restore);
                        }
                    }
                    tasks.insert(old.config.name.clone(), old);
                    return Err(e);
                }
            }
        } else if entry.config.enabled {
            self.start_entry(&mut entry).await?;
        }

        tasks.insert(entry.config.name.clone(), entry);
        Ok(())
    }

    pub async fn start(&self, name: &str) -> Result<(), SchedulerError> {
        let mut tasks = self.tasks.lock().await;
        let entry = tasks
            .get_mut(name)
            .ok_or_else(|| SchedulerError::UnknownTask(name.to_string()))?;
        self.start_entry(entry).await
    }

    pub async fn stop(&self, name: &str) -> Result<(), SchedulerError> {
        let mut tasks = self.tasks.lock().await;
        let entry = tasks
            .get_mut(name)
            .ok_or_else(|| SchedulerError::UnknownTask(name.to_string()))?;
        self.stop_entry(entry).await
    }

    /// 停止并移除任务配置
    pub async fn unregister(&self, name: &str) -> Result<(), SchedulerError> {
        let mut tasks = self.tasks.lock().await;
        let mut entry = tasks
            .remove(name)
            .ok_or_else(|| SchedulerError::UnknownTask(name.to_string()))?;
        self.stop_entry(&mut entry).await?;
        info!(task = name, "Task unregistered");
        Ok(())
    }

    /// 启动所有已启用但未运行的任务
    pub async fn start_all(&self) -> Result<(), SchedulerError> {
        let mut tasks = self.tasks.lock().await;
        for entry in tasks.values_mut().filter(|e| e.config.enabled) {
            self.start_entry(entry).await?;
        }
        Ok(())
    }

    pub async fn stop_all(&self) -> Result<(), SchedulerError> {
        let mut tasks = self.tasks.lock().await;
        for entry in tasks.values_mut() {
            self.stop_entry(entry).await?;
        }
        Ok(())
    }

    /// 立即执行一次任务，不影响 cron 注册
    ///
    /// # 返回值
    ///
    /// 执行成功返回 true；任务不存在、正在执行或执行失败返回 false
    pub async fn trigger(&self, name: &str) -> bool {
        let (action, runtime) = {
            let tasks = self.tasks.lock().await;
            match tasks.get(name) {
                Some(entry) => (entry.config.action.clone(), entry.runtime.clone()),
                None => {
                    warn!(task = name, "Trigger requested for unknown task");
                    return false;
                }
            }
        };
        execute(name, action.as_ref(), &runtime, "manual").await
    }

    pub async fn is_registered(&self, name: &str) -> bool {
        self.tasks.lock().await.contains_key(name)
    }

    /// 所有已注册任务的状态，按名称排序
    pub async fn status(&self) -> Vec<TaskStatus> {
        let tasks = self.tasks.lock().await;
        let mut statuses: Vec<TaskStatus> = tasks
            .values()
            .map(|entry| {
                let last = *entry.runtime.last.lock();
                TaskStatus {
                    name: entry.config.name.clone(),
                    schedule: entry.config.cron_expression.clone(),
                    enabled: entry.config.enabled,
                    running: entry.job.is_some(),
                    in_progress: entry.runtime.in_progress.load(Ordering::SeqCst),
                    entity_type: entry.config.entity_type,
                    last_run: last.map(|r| r.finished_at),
                    last_success: last.map(|r| r.success),
                    last_duration_ms: last.map(|r| r.duration.as_millis() as u64),
                }
            })
            .collect();
        statuses.sort_by(|a, b| a.name.cmp(&b.name));
        statuses
    }

    /// 已启用任务的名称
    pub async fn enabled_tasks(&self) -> Vec<String> {
        let tasks = self.tasks.lock().await;
        let mut names: Vec<String> = tasks
            .values()
            .filter(|e| e.config.enabled)
            .map(|e| e.config.name.clone())
            .collect();
        names.sort();
        names
    }

    /// 停止所有任务并关闭 cron 后端
    pub async fn shutdown(&self) -> Result<(), SchedulerError> {
        self.stop_all().await?;
        let mut cron = self.cron.clone();
        cron.shutdown().await?;
        info!("Scheduler shut down");
        Ok(())
    }

    #[cfg(test)]
    async fn job_id(&self, name: &str) -> Option<Uuid> {
        self.tasks.lock().await.get(name).and_then(|e| e.job)
    }
}
