// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::entity_type::EntityType;
use crate::domain::models::record::ExtractionRecord;
use async_trait::async_trait;
use thiserror::Error;

/// 仓库层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 数据库错误
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
    /// 记录与目标集合的实体类型不一致
    #[error("Record for {found} cannot be stored in the {expected} collection")]
    EntityMismatch {
        expected: EntityType,
        found: EntityType,
    },
}

/// 一次整体替换的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaceSummary {
    pub entity: EntityType,
    /// 替换前的记录数
    pub previous: u64,
    /// 写入的记录数（去重后）
    pub written: u64,
    /// 写入的阵容详情数
    pub details_written: u64,
}

/// 数据集仓库特质
///
/// 每种实体类型对应一个集合，集合始终只保存一次完整且已校验的抓取结果
#[async_trait]
pub trait DatasetRepository: Send + Sync {
    /// 在单个事务内删除并重写整个集合
    ///
    /// # 参数
    ///
    /// * `entity` - 目标集合
    /// * `records` - 已校验的完整数据集
    /// * `source` - 产出该数据集的来源名称，随每条记录保存
    async fn replace(
        &self,
        entity: EntityType,
        records: &[ExtractionRecord],
        source: &str,
    ) -> Result<ReplaceSummary, RepositoryError>;

    /// 集合中的记录数
    async fn count(&self, entity: EntityType) -> Result<u64, RepositoryError>;
}
