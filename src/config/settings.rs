// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::entity_type::EntityType;
use crate::domain::services::dataset_validator::DatasetValidator;
use crate::engines::browser_source::CrawlTuning;
use crate::utils::retry_policy::RetryPolicy;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use validator::Validate;

/// 应用程序配置设置
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Settings {
    /// 数据库配置
    pub database: DatabaseSettings,
    /// 服务器配置
    pub server: ServerSettings,
    /// 浏览器配置
    pub browser: BrowserSettings,
    /// 抓取配置
    #[validate(nested)]
    pub extraction: ExtractionSettings,
    /// 数据集校验配置
    pub validation: ValidationSettings,
    /// 调度配置
    pub scheduler: SchedulerSettings,
    /// 指标配置
    pub metrics: MetricsSettings,
}

/// 数据库配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// 数据库连接URL
    pub url: String,
    /// 最大连接数
    pub max_connections: Option<u32>,
    /// 最小连接数
    pub min_connections: Option<u32>,
    /// 连接超时时间（秒）
    pub connect_timeout: Option<u64>,
    /// 空闲连接超时时间（秒）
    pub idle_timeout: Option<u64>,
    /// 是否输出 SQL 日志
    #[serde(default)]
    pub sqlx_logging: bool,
}

/// 服务器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// 服务器监听主机地址
    pub host: String,
    /// 服务器监听端口
    pub port: u16,
}

/// 浏览器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserSettings {
    /// 远程 Chrome 调试地址，为空时在本地启动
    pub remote_url: Option<String>,
    pub headless: bool,
    /// CDP 请求超时（秒）
    pub request_timeout_secs: u64,
    /// 额外的启动参数
    #[serde(default)]
    pub args: Vec<String>,
}

/// 抓取配置设置
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ExtractionSettings {
    /// 来源定义文件
    pub sources_file: String,
    #[validate(range(min = 1, max = 20))]
    pub retry_attempts: u32,
    pub retry_base_delay_ms: u64,
    /// 每个浏览器会话内按节奏刷新的操作数，0 表示关闭
    pub refresh_interval: u32,
    #[validate(range(min = 1))]
    pub max_consecutive_failures: u32,
    #[validate(range(min = 1))]
    pub wait_timeout_secs: u64,
    #[validate(range(min = 1))]
    pub attempt_timeout_secs: u64,
    /// HTTP 来源的请求超时（秒）
    #[validate(range(min = 1))]
    pub http_timeout_secs: u64,
    /// 默认质量阈值
    pub quality_threshold: usize,
    /// 按实体类型覆盖的质量阈值
    #[serde(default)]
    pub quality_thresholds: HashMap<EntityType, usize>,
}

impl ExtractionSettings {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry_attempts,
            Duration::from_millis(self.retry_base_delay_ms),
        )
    }

    pub fn crawl_tuning(&self) -> CrawlTuning {
        CrawlTuning {
            retry: self.retry_policy(),
            wait_timeout: Duration::from_secs(self.wait_timeout_secs),
            refresh_interval: self.refresh_interval,
            max_consecutive_failures: self.max_consecutive_failures,
            attempt_timeout: Duration::from_secs(self.attempt_timeout_secs),
        }
    }

    pub fn quality_threshold_for(&self, entity: EntityType) -> usize {
        self.quality_thresholds
            .get(&entity)
            .copied()
            .unwrap_or(self.quality_threshold)
    }
}

/// 数据集校验配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ValidationSettings {
    /// 默认最小记录数，结果必须严格大于该值
    pub min_records: usize,
    /// 按实体类型覆盖的最小记录数
    #[serde(default)]
    pub overrides: HashMap<EntityType, usize>,
}

impl ValidationSettings {
    pub fn validator(&self) -> DatasetValidator {
        self.overrides.iter().fold(
            DatasetValidator::new(self.min_records),
            |validator, (entity, min)| validator.with_min_records(*entity, *min),
        )
    }
}

/// 调度配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerSettings {
    /// 任务调度环境变量前缀，如 `METACRAWL_COMPS_SCHEDULE`
    pub env_prefix: String,
    /// 启动时立即执行一次所有已启用的任务
    pub run_on_startup: bool,
}

/// 指标配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSettings {
    pub enabled: bool,
    /// Prometheus 监听地址
    pub listen: String,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次加载内置默认值、`config/default`、`config/{APP_ENVIRONMENT}`
    /// 和 `METACRAWL__` 前缀的环境变量
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载并校验的配置
    /// * `Err(ConfigError)` - 配置加载或校验失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());

        let builder = Self::with_defaults(Config::builder())?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("METACRAWL").separator("__"));

        Self::from_builder(builder)
    }

    /// 构建并校验配置
    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings
            .validate()
            .map_err(|e| ConfigError::Message(format!("invalid configuration: {}", e)))?;
        Ok(settings)
    }

    /// 内置默认值
    pub fn with_defaults(
        builder: ConfigBuilder<DefaultState>,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        builder
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("database.url", "sqlite://data/metacrawl.db?mode=rwc")?
            .set_default("database.max_connections", 5)?
            .set_default("database.min_connections", 1)?
            .set_default("database.connect_timeout", 10)?
            .set_default("database.idle_timeout", 300)?
            .set_default("browser.headless", true)?
            .set_default("browser.request_timeout_secs", 30)?
            .set_default("browser.args", vec!["--disable-gpu", "--disable-dev-shm-usage"])?
            .set_default("extraction.sources_file", "config/sources.yaml")?
            .set_default("extraction.retry_attempts", 3)?
            .set_default("extraction.retry_base_delay_ms", 1000)?
            .set_default("extraction.refresh_interval", 20)?
            .set_default("extraction.max_consecutive_failures", 3)?
            .set_default("extraction.wait_timeout_secs", 15)?
            .set_default("extraction.attempt_timeout_secs", 600)?
            .set_default("extraction.http_timeout_secs", 30)?
            .set_default("extraction.quality_threshold", 10)?
            .set_default("validation.min_records", 10)?
            .set_default("scheduler.env_prefix", "METACRAWL")?
            .set_default("scheduler.run_on_startup", false)?
            .set_default("metrics.enabled", true)?
            .set_default("metrics.listen", "0.0.0.0:9000")
    }
}
