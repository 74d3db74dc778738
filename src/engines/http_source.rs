// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::entity_type::EntityType;
use crate::domain::models::extraction::RawRecord;
use crate::engines::html_document::records_from_html;
use crate::engines::source_profile::SourceDefinition;
use crate::engines::traits::{ExtractionError, ExtractionSource};
use crate::utils::retry_policy::RetryPolicy;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = "Mozilla/5.0 (compatible; metacrawl/0.1)";

/// 静态 HTML 来源
///
/// 适用于服务端渲染的页面，作为浏览器来源的降级选项
pub struct HttpSource {
    definition: SourceDefinition,
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl HttpSource {
    /// 创建 HTTP 来源
    ///
    /// # 参数
    ///
    /// * `definition` - 来源定义
    /// * `retry` - 每个页面请求的重试策略
    /// * `timeout` - 单次请求超时
    pub fn new(
        definition: SourceDefinition,
        retry: RetryPolicy,
        timeout: Duration,
    ) -> Result<Self, ExtractionError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .cookie_store(true)
            .build()?;
        Ok(Self {
            definition,
            client,
            retry,
        })
    }

    async fn get_page(&self, url: &str) -> Result<String, ExtractionError> {
        let client = &self.client;
        self.retry
            .run("http_get", move || async move {
                let response = client.get(url).send().await?.error_for_status()?;
                Ok::<_, ExtractionError>(response.text().await?)
            })
            .await
    }
}

#[async_trait]
impl ExtractionSource for HttpSource {
    async fn fetch(&self, entity: EntityType) -> Result<Vec<RawRecord>, ExtractionError> {
        if entity != self.definition.entity {
            return Err(ExtractionError::Config(format!(
                "source '{}' serves {}, not {}",
                self.definition.name, self.definition.entity, entity
            )));
        }

        let paginated = self
            .definition
            .pagination
            .as_ref()
            .is_some_and(|p| p.page_param.is_some());
        let pages = if paginated { self.definition.max_pages() } else { 1 };

        let mut records = Vec::new();
        for page in 1..=pages {
            let url = self.definition.page_url(page)?;
            let html = self.get_page(&url).await?;
            let mut batch = records_from_html(&html, &self.definition.schema)?;
            debug!(source = %self.definition.name, page, rows = batch.len(), "Fetched page");
            if batch.is_empty() {
                break;
            }
            records.append(&mut batch);
        }

        self.definition.resolve_links(&mut records);
        Ok(records)
    }

    fn name(&self) -> &str {
        &self.definition.name
    }

    fn priority(&self) -> u32 {
        self.definition.priority
    }
}
