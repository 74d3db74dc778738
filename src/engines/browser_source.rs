// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::entity_type::EntityType;
use crate::domain::models::extraction::RawRecord;
use crate::engines::browser_session::{BrowserSession, SessionFactory};
use crate::engines::html_document::{fields_from_html, records_from_html};
use crate::engines::session_state::{
    SessionStateManager, DEFAULT_MAX_CONSECUTIVE_FAILURES, DEFAULT_REFRESH_INTERVAL,
};
use crate::engines::source_profile::{DetailSpec, SourceDefinition};
use crate::engines::traits::{ExtractionError, ExtractionSource};
use crate::utils::retry_policy::RetryPolicy;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// 浏览器抓取的调优参数
#[derive(Debug, Clone)]
pub struct CrawlTuning {
    /// 导航、等待和单条提取各自使用的重试策略
    pub retry: RetryPolicy,
    /// 等待就绪元素的超时
    pub wait_timeout: Duration,
    pub refresh_interval: u32,
    pub max_consecutive_failures: u32,
    /// 单次抓取尝试的总超时
    pub attempt_timeout: Duration,
}

impl Default for CrawlTuning {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            wait_timeout: Duration::from_secs(15),
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            max_consecutive_failures: DEFAULT_MAX_CONSECUTIVE_FAILURES,
            attempt_timeout: Duration::from_secs(600),
        }
    }
}

/// 浏览器抓取来源
///
/// 每次 `fetch` 打开一个独立会话，无论成功失败都会关闭
pub struct BrowserSource {
    definition: SourceDefinition,
    factory: Arc<dyn SessionFactory>,
    tuning: CrawlTuning,
}

impl BrowserSource {
    pub fn new(
        definition: SourceDefinition,
        factory: Arc<dyn SessionFactory>,
        tuning: CrawlTuning,
    ) -> Self {
        Self {
            definition,
            factory,
            tuning,
        }
    }

    async fn wait_ready(&self, session: &dyn BrowserSession, selector: Option<&str>) -> Result<(), ExtractionError> {
        if let Some(selector) = selector {
            let timeout = self.tuning.wait_timeout;
            self.tuning
                .retry
                .run("wait_for_selector", move || session.wait_for_selector(selector, timeout))
                .await?;
        }
        if self.definition.settle_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.definition.settle_ms)).await;
        }
        Ok(())
    }

    async fn crawl(&self, session: &dyn BrowserSession) -> Result<Vec<RawRecord>, ExtractionError> {
        let definition = &self.definition;
        let retry = &self.tuning.retry;

        let url = definition.url.as_str();
        retry.run("navigate", move || session.navigate(url)).await?;
        self.wait_ready(session, definition.ready_selector.as_deref())
            .await?;

        let schema = &definition.schema;
        let next_selector = definition
            .pagination
            .as_ref()
            .and_then(|p| p.next_selector.as_deref());
        let max_pages = definition.max_pages();

        let mut records = Vec::new();
        let mut page = 1;
        loop {
            let mut batch = retry
                .run("extract_page", move || async move {
                    let html = session.content().await?;
                    records_from_html(&html, schema)
                })
                .await?;
            debug!(source = %definition.name, page, rows = batch.len(), "Extracted page");
            records.append(&mut batch);

            let Some(next) = next_selector else {
                break;
            };
            if page >= max_pages {
                break;
            }
            if let Err(e) = session.click(next).await {
                debug!(source = %definition.name, "No further pages: {}", e);
                break;
            }
            page += 1;
            self.wait_ready(session, definition.ready_selector.as_deref())
                .await?;
        }

        definition.resolve_links(&mut records);

        if let Some(detail) = &definition.detail {
            self.enrich_details(session, detail, &mut records).await;
        }
        Ok(records)
    }

    /// 逐条抓取详情页
    ///
    /// 单条失败只影响该条记录；连续失败达到上限时强制刷新会话，
    /// 刷新失败则停止循环并保留已抓取的数据
    async fn enrich_details(
        &self,
        session: &dyn BrowserSession,
        detail: &DetailSpec,
        records: &mut [RawRecord],
    ) {
        let mut state = SessionStateManager::new(
            self.tuning.refresh_interval,
            self.tuning.max_consecutive_failures,
        );
        let mut enriched = 0usize;
        let mut failed = 0usize;

        for record in records.iter_mut() {
            if state.should_refresh() && state.refresh(session).await.is_err() {
                warn!(source = %self.definition.name, "Aborting detail crawl after refresh failure");
                break;
            }

            let Some(link) = record.text(&detail.link_field).map(str::to_string) else {
                continue;
            };

            match self.fetch_detail(session, detail, &link).await {
                Ok(fields) => {
                    state.record_success();
                    if !fields.fields.is_empty() {
                        record.detail = Some(fields.fields);
                        enriched += 1;
                    }
                }
                Err(e) => {
                    failed += 1;
                    warn!(source = %self.definition.name, link = %link, "Detail extraction failed: {}", e);
                    if state.record_failure() && state.refresh(session).await.is_err() {
                        warn!(source = %self.definition.name, "Aborting detail crawl after refresh failure");
                        break;
                    }
                }
            }
            state.record_operation();
        }

        info!(
            source = %self.definition.name,
            enriched,
            failed,
            refreshes = state.refreshes(),
            "Detail crawl finished"
        );
    }

    async fn fetch_detail(
        &self,
        session: &dyn BrowserSession,
        detail: &DetailSpec,
        link: &str,
    ) -> Result<RawRecord, ExtractionError> {
        let ready = detail.ready_selector.as_deref();
        let fields = &detail.fields;
        let timeout = self.tuning.wait_timeout;

        self.tuning
            .retry
            .run("extract_detail", move || async move {
                session.navigate(link).await?;
                if let Some(selector) = ready {
                    session.wait_for_selector(selector, timeout).await?;
                }
                let html = session.content().await?;
                fields_from_html(&html, fields)
            })
            .await
    }
}

#[async_trait]
impl ExtractionSource for BrowserSource {
    async fn fetch(&self, entity: EntityType) -> Result<Vec<RawRecord>, ExtractionError> {
        if entity != self.definition.entity {
            return Err(ExtractionError::Config(format!(
                "source '{}' serves {}, not {}",
                self.definition.name, self.definition.entity, entity
            )));
        }

        let session = self.factory.open().await?;
        let outcome =
            match tokio::time::timeout(self.tuning.attempt_timeout, self.crawl(session.as_ref()))
                .await
            {
                Ok(outcome) => outcome,
                Err(_) => Err(ExtractionError::Timeout(format!(
                    "source '{}' exceeded {:?}",
                    self.definition.name, self.tuning.attempt_timeout
                ))),
            };

        if let Err(e) = session.close().await {
            warn!(source = %self.definition.name, "Failed to close browser session: {}", e);
        }
        outcome
    }

    fn name(&self) -> &str {
        &self.definition.name
    }

    fn priority(&self) -> u32 {
        self.definition.priority
    }
}
