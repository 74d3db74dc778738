// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::entity_type::EntityType;
use crate::domain::models::extraction::ExtractionResult;
use crate::domain::models::record::ExtractionRecord;
use crate::engines::traits::{ExtractionError, ExtractionSource};
use metrics::counter;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

pub const DEFAULT_QUALITY_THRESHOLD: usize = 10;

/// 多来源降级链
///
/// 按优先级依次尝试来源。某个来源的记录数超过质量阈值时立即返回，
/// 否则保留记录数最多的结果并继续尝试下一个来源。
pub struct SourceFallbackChain {
    entity: EntityType,
    sources: Vec<Arc<dyn ExtractionSource>>,
    quality_threshold: usize,
}

impl SourceFallbackChain {
    /// 创建降级链，来源按优先级稳定排序
    pub fn new(
        entity: EntityType,
        mut sources: Vec<Arc<dyn ExtractionSource>>,
        quality_threshold: usize,
    ) -> Self {
        sources.sort_by_key(|s| s.priority());
        Self {
            entity,
            sources,
            quality_threshold,
        }
    }

    pub fn entity(&self) -> EntityType {
        self.entity
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// 执行降级链
    ///
    /// # 返回值
    ///
    /// 第一个超过阈值的结果，或所有来源中记录数最多的非空结果。
    /// 没有任何来源返回记录时返回 [`ExtractionError::AllSourcesFailed`]
    pub async fn run(&self) -> Result<ExtractionResult, ExtractionError> {
        let mut best: Option<ExtractionResult> = None;
        let mut failures = Vec::new();

        for source in &self.sources {
            let started = Instant::now();
            debug!(entity = %self.entity, source = source.name(), "Trying source");

            let raw = match source.fetch(self.entity).await {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(
                        entity = %self.entity,
                        source = source.name(),
                        retryable = e.is_retryable(),
                        "Source failed: {}",
                        e
                    );
                    counter!("source_attempts_total", "source" => source.name().to_string(), "outcome" => "error")
                        .increment(1);
                    failures.push(format!("{}: {}", source.name(), e));
                    continue;
                }
            };

            let raw_rows = raw.len();
            let records: Vec<ExtractionRecord> = raw
                .iter()
                .filter_map(|r| ExtractionRecord::from_raw(self.entity, r))
                .collect();
            let result = ExtractionResult {
                entity: self.entity,
                source: source.name().to_string(),
                records,
                duration: started.elapsed(),
            };
            counter!("source_attempts_total", "source" => source.name().to_string(), "outcome" => "ok")
                .increment(1);

            let distinct = result.distinct_len();
            if distinct > self.quality_threshold {
                info!(
                    entity = %self.entity,
                    source = source.name(),
                    records = distinct,
                    dropped = raw_rows - distinct,
                    duration_ms = result.duration.as_millis() as u64,
                    "Source met quality threshold"
                );
                return Ok(result);
            }

            warn!(
                entity = %self.entity,
                source = source.name(),
                records = distinct,
                rows = result.len(),
                threshold = self.quality_threshold,
                "Source below quality threshold, trying next"
            );
            failures.push(format!("{}: only {} records", source.name(), distinct));
            if best.as_ref().map_or(true, |b| distinct > b.distinct_len()) {
                best = Some(result);
            }
        }

        match best {
            Some(result) if !result.is_empty() => {
                info!(
                    entity = %self.entity,
                    source = %result.source,
                    records = result.len(),
                    "Using best available result"
                );
                Ok(result)
            }
            _ => Err(ExtractionError::AllSourcesFailed {
                entity: self.entity,
                failures,
            }),
        }
    }
}
