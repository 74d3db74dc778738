// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::entity_type::EntityType;
use crate::domain::models::extraction::RawRecord;
use async_trait::async_trait;
use thiserror::Error;

/// 抓取错误类型
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// 页面导航失败
    #[error("Navigation failed: {0}")]
    Navigation(String),
    /// 超时
    #[error("Timed out: {0}")]
    Timeout(String),
    /// 等待的元素未出现
    #[error("Selector not found: {0}")]
    SelectorNotFound(String),
    /// 浏览器会话错误
    #[error("Browser session error: {0}")]
    Session(String),
    /// 文档解析错误
    #[error("Parse error: {0}")]
    Parse(String),
    /// HTTP 请求失败
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// 来源配置错误
    #[error("Source configuration error: {0}")]
    Config(String),
    /// 所有来源都失败
    #[error("No source succeeded for {entity}: {}", .failures.join("; "))]
    AllSourcesFailed {
        entity: EntityType,
        failures: Vec<String>,
    },
}

impl ExtractionError {
    /// 判断错误是否可重试
    ///
    /// # 返回值
    ///
    /// 如果错误是可重试的则返回true，否则返回false
    pub fn is_retryable(&self) -> bool {
        match self {
            ExtractionError::Navigation(_)
            | ExtractionError::Timeout(_)
            | ExtractionError::SelectorNotFound(_)
            | ExtractionError::Session(_) => true,
            ExtractionError::Http(e) => {
                e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
            }
            _ => false,
        }
    }
}

/// 抓取来源特质
///
/// 每个外部站点或抓取策略实现一次
#[async_trait]
pub trait ExtractionSource: Send + Sync {
    /// 抓取指定实体类型的原始记录
    async fn fetch(&self, entity: EntityType) -> Result<Vec<RawRecord>, ExtractionError>;

    /// 来源名称
    fn name(&self) -> &str;

    /// 优先级，数值越小越先尝试
    fn priority(&self) -> u32 {
        0
    }
}
