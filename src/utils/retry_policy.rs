// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// 重试策略配置
///
/// 线性退避：第 n 次失败后等待 `base_delay * n`，最多执行 `max_attempts` 次
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// 最大尝试次数（包含首次执行）
    pub max_attempts: u32,
    /// 基础退避时间
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// 创建新的重试策略
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// 不重试的策略
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// 计算第 `attempt` 次失败后的退避时间
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }

    /// 是否应该重试
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts.max(1)
    }

    /// 执行操作，失败时按策略重试并记录警告日志
    ///
    /// # 参数
    ///
    /// * `label` - 日志中使用的操作名称
    /// * `op` - 每次调用生成一个新的 future
    pub async fn run<T, E, F, Fut>(&self, label: &str, op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.run_observed(op, |error, attempt| {
            warn!(
                operation = label,
                attempt,
                max_attempts = self.max_attempts,
                "Attempt failed, retrying: {}",
                error
            );
        })
        .await
    }

    /// 执行操作，每次重试前调用观察者回调
    ///
    /// 观察者收到错误和失败的尝试序号（从 1 开始）。
    /// 所有尝试耗尽后返回最后一次的错误。
    pub async fn run_observed<T, E, F, Fut, O>(&self, mut op: F, mut on_retry: O) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        O: FnMut(&E, u32),
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(error) => {
                    if !self.should_retry(attempt) {
                        return Err(error);
                    }
                    on_retry(&error, attempt);
                    tokio::time::sleep(self.calculate_backoff(attempt)).await;
                    attempt += 1;
                }
            }
        }
    }
}
