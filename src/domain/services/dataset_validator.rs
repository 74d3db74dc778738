// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::entity_type::EntityType;
use crate::domain::models::record::{distinct_keys, ExtractionRecord};
use std::collections::HashMap;
use thiserror::Error;

/// 默认最小记录数，结果必须严格大于该值
pub const DEFAULT_MIN_RECORDS: usize = 10;

/// 校验结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub reason: Option<String>,
}

impl ValidationOutcome {
    fn accepted() -> Self {
        Self {
            valid: true,
            reason: None,
        }
    }

    fn rejected(reason: String) -> Self {
        Self {
            valid: false,
            reason: Some(reason),
        }
    }
}

/// 校验失败错误，携带可读原因
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Validation failed for {entity}: {reason}")]
pub struct ValidationError {
    pub entity: EntityType,
    pub reason: String,
}

/// 数据集校验器
///
/// 依次检查：记录结构、非空、记录数严格大于实体的最小阈值。
/// 低于阈值的结果视为部分失败的抓取，绝不写入存储。
#[derive(Debug, Clone)]
pub struct DatasetValidator {
    default_min_records: usize,
    min_records: HashMap<EntityType, usize>,
}

impl Default for DatasetValidator {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_RECORDS)
    }
}

impl DatasetValidator {
    pub fn new(default_min_records: usize) -> Self {
        Self {
            default_min_records,
            min_records: HashMap::new(),
        }
    }

    /// 为单个实体类型设置阈值
    pub fn with_min_records(mut self, entity: EntityType, min_records: usize) -> Self {
        self.min_records.insert(entity, min_records);
        self
    }

    pub fn min_records_for(&self, entity: EntityType) -> usize {
        self.min_records
            .get(&entity)
            .copied()
            .unwrap_or(self.default_min_records)
    }

    pub fn validate(&self, entity: EntityType, records: &[ExtractionRecord]) -> ValidationOutcome {
        for (index, record) in records.iter().enumerate() {
            if record.entity_type() != entity {
                return ValidationOutcome::rejected(format!(
                    "record #{} is a {} record",
                    index,
                    record.entity_type()
                ));
            }
            if record.natural_key().trim().is_empty() {
                return ValidationOutcome::rejected(format!(
                    "record #{} has no natural key",
                    index
                ));
            }
            if !record.stats().is_well_formed() {
                return ValidationOutcome::rejected(format!(
                    "record '{}' has non-finite statistics",
                    record.natural_key()
                ));
            }
        }

        if records.is_empty() {
            return ValidationOutcome::rejected("no records extracted".to_string());
        }

        let min_records = self.min_records_for(entity);
        let distinct = distinct_keys(records);
        if distinct <= min_records {
            return ValidationOutcome::rejected(format!(
                "expected more than {} records but got {} ({} rows), probable partial scrape",
                min_records,
                distinct,
                records.len()
            ));
        }

        ValidationOutcome::accepted()
    }

    /// 校验并在拒绝时返回类型化错误
    pub fn ensure_valid(
        &self,
        entity: EntityType,
        records: &[ExtractionRecord],
    ) -> Result<(), ValidationError> {
        let outcome = self.validate(entity, records);
        if outcome.valid {
            Ok(())
        } else {
            Err(ValidationError {
                entity,
                reason: outcome.reason.unwrap_or_default(),
            })
        }
    }
}
