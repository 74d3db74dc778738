// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::entity_type::EntityType;
use crate::domain::repositories::dataset_repository::{
    DatasetRepository, RepositoryError, ReplaceSummary,
};
use crate::domain::services::dataset_validator::{DatasetValidator, ValidationError};
use crate::engines::fallback_chain::SourceFallbackChain;
use crate::engines::traits::ExtractionError;
use crate::scheduler::task::TaskAction;
use async_trait::async_trait;
use metrics::counter;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum RefreshError {
    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractionError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Storage failed: {0}")]
    Storage(#[from] RepositoryError),
}

/// 刷新单个实体类型的数据集：抓取 → 校验 → 原子替换
///
/// 校验失败时不会调用存储，旧数据集保持不变
pub struct RefreshDatasetUseCase<R> {
    entity: EntityType,
    chain: SourceFallbackChain,
    validator: Arc<DatasetValidator>,
    store: Arc<R>,
}

impl<R> RefreshDatasetUseCase<R>
where
    R: DatasetRepository + 'static,
{
    pub fn new(
        entity: EntityType,
        chain: SourceFallbackChain,
        validator: Arc<DatasetValidator>,
        store: Arc<R>,
    ) -> Self {
        Self {
            entity,
            chain,
            validator,
            store,
        }
    }

    pub fn entity(&self) -> EntityType {
        self.entity
    }

    pub async fn run(&self) -> Result<ReplaceSummary, RefreshError> {
        let result = self.chain.run().await?;

        if let Err(e) = self.validator.ensure_valid(self.entity, &result.records) {
            counter!("validation_rejections_total", "entity" => self.entity.as_str()).increment(1);
            warn!(
                entity = %self.entity,
                source = %result.source,
                records = result.len(),
                "Extraction rejected, keeping previous dataset: {}",
                e.reason
            );
            return Err(e.into());
        }

        let summary = self
            .store
            .replace(self.entity, &result.records, &result.source)
            .await?;
        info!(
            entity = %self.entity,
            source = %result.source,
            previous = summary.previous,
            written = summary.written,
            extraction_ms = result.duration.as_millis() as u64,
            "Dataset refreshed"
        );
        Ok(summary)
    }
}

#[async_trait]
impl<R> TaskAction for RefreshDatasetUseCase<R>
where
    R: DatasetRepository + 'static,
{
    async fn execute(&self) -> anyhow::Result<()> {
        self.run().await?;
        Ok(())
    }
}
