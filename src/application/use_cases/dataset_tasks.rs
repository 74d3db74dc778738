// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::use_cases::refresh_dataset::RefreshDatasetUseCase;
use crate::config::settings::{ExtractionSettings, Settings};
use crate::domain::models::entity_type::EntityType;
use crate::domain::repositories::dataset_repository::DatasetRepository;
use crate::engines::browser_session::SessionFactory;
use crate::engines::browser_source::BrowserSource;
use crate::engines::fallback_chain::SourceFallbackChain;
use crate::engines::http_source::HttpSource;
use crate::engines::source_profile::{SourceCatalog, SourceKind};
use crate::engines::traits::{ExtractionError, ExtractionSource};
use crate::scheduler::schedule_config::{default_schedule, resolve_schedule};
use crate::scheduler::task::ScheduledTaskConfig;
use crate::scheduler::task_scheduler::TaskScheduler;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// 按来源目录构建某实体类型的全部来源
pub fn build_sources(
    catalog: &SourceCatalog,
    entity: EntityType,
    extraction: &ExtractionSettings,
    factory: Arc<dyn SessionFactory>,
) -> Result<Vec<Arc<dyn ExtractionSource>>, ExtractionError> {
    catalog
        .for_entity(entity)
        .into_iter()
        .map(|definition| {
            let source: Arc<dyn ExtractionSource> = match definition.kind {
                SourceKind::Browser => Arc::new(BrowserSource::new(
                    definition.clone(),
                    factory.clone(),
                    extraction.crawl_tuning(),
                )),
                SourceKind::Http => Arc::new(HttpSource::new(
                    definition.clone(),
                    extraction.retry_policy(),
                    Duration::from_secs(extraction.http_timeout_secs),
                )?),
            };
            Ok(source)
        })
        .collect()
}

/// 为每种实体类型注册一个刷新任务
///
/// 没有配置来源的实体类型跳过。调度表达式和启用状态可由
/// `<PREFIX>_<TASK>_SCHEDULE` / `<PREFIX>_<TASK>_ENABLED` 覆盖。
///
/// # 返回值
///
/// 已注册的任务名称
pub async fn register_dataset_tasks<R, F>(
    scheduler: &TaskScheduler,
    settings: &Settings,
    catalog: &SourceCatalog,
    factory: Arc<dyn SessionFactory>,
    store: Arc<R>,
    lookup: F,
) -> anyhow::Result<Vec<String>>
where
    R: DatasetRepository + 'static,
    F: Fn(&str) -> Option<String>,
{
    let validator = Arc::new(settings.validation.validator());
    let mut registered = Vec::new();

    for entity in EntityType::ALL {
        let sources = build_sources(catalog, entity, &settings.extraction, factory.clone())?;
        if sources.is_empty() {
            warn!(entity = %entity, "No sources configured, task not registered");
            continue;
        }

        let chain = SourceFallbackChain::new(
            entity,
            sources,
            settings.extraction.quality_threshold_for(entity),
        );
        info!(entity = %entity, sources = ?chain.source_names(), "Fallback chain ready");
        let use_case = RefreshDatasetUseCase::new(entity, chain, validator.clone(), store.clone());

        let spec = resolve_schedule(
            &settings.scheduler.env_prefix,
            entity.as_str(),
            default_schedule(entity),
            &lookup,
        );
        scheduler
            .register(
                ScheduledTaskConfig::new(entity.as_str(), spec.expression, Arc::new(use_case))
                    .enabled(spec.enabled)
                    .for_entity(entity),
            )
            .await?;
        registered.push(entity.as_str().to_string());
    }

    Ok(registered)
}
