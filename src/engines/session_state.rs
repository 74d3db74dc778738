// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::engines::browser_session::BrowserSession;
use crate::engines::traits::ExtractionError;
use tracing::{info, warn};

pub const DEFAULT_REFRESH_INTERVAL: u32 = 20;
pub const DEFAULT_MAX_CONSECUTIVE_FAILURES: u32 = 3;

/// 浏览器会话状态管理器
///
/// 统计单个会话内的操作次数和连续失败次数，决定何时整页刷新。
/// 长时间循环抓取详情页时，DOM 和会话状态会逐渐损坏，定期刷新可以恢复。
#[derive(Debug, Clone)]
pub struct SessionStateManager {
    refresh_interval: u32,
    max_consecutive_failures: u32,
    operations: u32,
    consecutive_failures: u32,
    refreshes: u32,
}

impl Default for SessionStateManager {
    fn default() -> Self {
        Self::new(DEFAULT_REFRESH_INTERVAL, DEFAULT_MAX_CONSECUTIVE_FAILURES)
    }
}

impl SessionStateManager {
    /// 创建状态管理器
    ///
    /// # 参数
    ///
    /// * `refresh_interval` - 每多少次操作刷新一次，0 表示不按节奏刷新
    /// * `max_consecutive_failures` - 连续失败上限，达到后强制刷新
    pub fn new(refresh_interval: u32, max_consecutive_failures: u32) -> Self {
        Self {
            refresh_interval,
            max_consecutive_failures: max_consecutive_failures.max(1),
            operations: 0,
            consecutive_failures: 0,
            refreshes: 0,
        }
    }

    /// 每完成一个工作单元后调用
    pub fn record_operation(&mut self) {
        self.operations = self.operations.saturating_add(1);
    }

    pub fn should_refresh(&self) -> bool {
        self.refresh_interval > 0 && self.operations >= self.refresh_interval
    }

    /// 记录一次失败
    ///
    /// # 返回值
    ///
    /// 连续失败达到上限时返回 true，调用方应强制刷新
    pub fn record_failure(&mut self) -> bool {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.consecutive_failures >= self.max_consecutive_failures
    }

    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
    }

    /// 整页重新加载，成功后重置操作计数和连续失败计数
    ///
    /// 刷新失败时计数保持不变，由调用方决定是否中止
    pub async fn refresh(&mut self, session: &dyn BrowserSession) -> Result<(), ExtractionError> {
        info!(
            operations = self.operations,
            consecutive_failures = self.consecutive_failures,
            "Refreshing browser session"
        );
        if let Err(e) = session.reload().await {
            warn!("Session refresh failed: {}", e);
            return Err(e);
        }
        self.operations = 0;
        self.consecutive_failures = 0;
        self.refreshes += 1;
        Ok(())
    }

    pub fn operations(&self) -> u32 {
        self.operations
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// 本会话内成功刷新的次数
    pub fn refreshes(&self) -> u32 {
        self.refreshes
    }
}
