// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::entity_type::EntityType;
use crate::domain::models::record::{
    AugmentRecord, ChampionRecord, CompRecord, ExtractionRecord, ItemRecord,
};
use crate::domain::repositories::dataset_repository::{
    DatasetRepository, RepositoryError, ReplaceSummary,
};
use crate::infrastructure::database::entities::{augment, champion, comp, comp_detail, item};
use async_trait::async_trait;
use chrono::Utc;
use metrics::gauge;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::OnConflict;
use sea_orm::*;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// 单条 INSERT 语句的最大行数，避免超出数据库的绑定参数上限
const INSERT_CHUNK: usize = 200;

/// 原子替换存储
///
/// 在一个事务内读取旧快照的创建时间、删除全部旧记录、批量写入新记录。
/// 任何一步失败时事务被丢弃并回滚，旧数据集保持完整。
#[derive(Clone)]
pub struct AtomicReplaceStore {
    db: Arc<DatabaseConnection>,
}

impl AtomicReplaceStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

/// 按自然键去重，保持首次出现的位置，后出现的记录覆盖先出现的
fn dedupe(records: &[ExtractionRecord]) -> Vec<&ExtractionRecord> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut unique: Vec<&ExtractionRecord> = Vec::with_capacity(records.len());
    for record in records {
        match positions.get(record.natural_key()) {
            Some(&i) => unique[i] = record,
            None => {
                positions.insert(record.natural_key(), unique.len());
                unique.push(record);
            }
        }
    }
    unique
}

/// 旧快照中每个键的创建时间
async fn created_index<E>(
    txn: &DatabaseTransaction,
    key: E::Column,
    created: E::Column,
) -> Result<HashMap<String, DateTimeWithTimeZone>, DbErr>
where
    E: EntityTrait,
{
    let rows: Vec<(String, DateTimeWithTimeZone)> = E::find()
        .select_only()
        .column(key)
        .column(created)
        .into_tuple()
        .all(txn)
        .await?;
    Ok(rows.into_iter().collect())
}

/// 分批写入，键冲突时更新非键列
async fn insert_all<E, A>(
    txn: &DatabaseTransaction,
    models: Vec<A>,
    key: E::Column,
    update: &[E::Column],
) -> Result<u64, DbErr>
where
    E: EntityTrait,
    E::Model: IntoActiveModel<A>,
    A: ActiveModelTrait<Entity = E>,
{
    let total = models.len() as u64;
    let mut models = models.into_iter().peekable();
    while models.peek().is_some() {
        let chunk: Vec<A> = models.by_ref().take(INSERT_CHUNK).collect();
        E::insert_many(chunk)
            .on_conflict(
                OnConflict::column(key)
                    .update_columns(update.iter().copied())
                    .to_owned(),
            )
            .exec_without_returning(txn)
            .await?;
    }
    Ok(total)
}

fn json_list(values: &[String]) -> serde_json::Value {
    serde_json::Value::from(values.to_vec())
}

struct Stamp<'a> {
    source: &'a str,
    now: DateTimeWithTimeZone,
    created: &'a HashMap<String, DateTimeWithTimeZone>,
}

impl Stamp<'_> {
    fn created_at(&self, key: &str) -> DateTimeWithTimeZone {
        self.created.get(key).copied().unwrap_or(self.now)
    }
}

fn champion_model(r: &ChampionRecord, stamp: &Stamp<'_>) -> champion::ActiveModel {
    champion::ActiveModel {
        name: Set(r.name.clone()),
        icon_url: Set(r.icon_url.clone()),
        cost: Set(r.cost),
        tier: Set(r.tier.clone()),
        traits: Set(json_list(&r.traits)),
        avg_placement: Set(r.stats.avg_placement),
        top4_rate: Set(r.stats.top4_rate),
        win_rate: Set(r.stats.win_rate),
        pick_rate: Set(r.stats.pick_rate),
        games: Set(r.stats.games),
        source: Set(stamp.source.to_string()),
        created_at: Set(stamp.created_at(&r.name)),
        updated_at: Set(stamp.now),
    }
}

fn item_model(r: &ItemRecord, stamp: &Stamp<'_>) -> item::ActiveModel {
    item::ActiveModel {
        name: Set(r.name.clone()),
        icon_url: Set(r.icon_url.clone()),
        category: Set(r.category.clone()),
        components: Set(json_list(&r.components)),
        avg_placement: Set(r.stats.avg_placement),
        top4_rate: Set(r.stats.top4_rate),
        win_rate: Set(r.stats.win_rate),
        pick_rate: Set(r.stats.pick_rate),
        games: Set(r.stats.games),
        source: Set(stamp.source.to_string()),
        created_at: Set(stamp.created_at(&r.name)),
        updated_at: Set(stamp.now),
    }
}

fn augment_model(r: &AugmentRecord, stamp: &Stamp<'_>) -> augment::ActiveModel {
    augment::ActiveModel {
        name: Set(r.name.clone()),
        icon_url: Set(r.icon_url.clone()),
        tier: Set(r.tier.clone()),
        avg_placement: Set(r.stats.avg_placement),
        top4_rate: Set(r.stats.top4_rate),
        win_rate: Set(r.stats.win_rate),
        pick_rate: Set(r.stats.pick_rate),
        games: Set(r.stats.games),
        source: Set(stamp.source.to_string()),
        created_at: Set(stamp.created_at(&r.name)),
        updated_at: Set(stamp.now),
    }
}

fn comp_model(r: &CompRecord, stamp: &Stamp<'_>) -> comp::ActiveModel {
    comp::ActiveModel {
        id: Set(r.id.clone()),
        name: Set(r.name.clone()),
        tier: Set(r.tier.clone()),
        champions: Set(json_list(&r.champions)),
        traits: Set(json_list(&r.traits)),
        avg_placement: Set(r.stats.avg_placement),
        top4_rate: Set(r.stats.top4_rate),
        win_rate: Set(r.stats.win_rate),
        pick_rate: Set(r.stats.pick_rate),
        games: Set(r.stats.games),
        source: Set(stamp.source.to_string()),
        created_at: Set(stamp.created_at(&r.id)),
        updated_at: Set(stamp.now),
    }
}

/// 按变体取出记录，调用前已检查实体类型
fn of_kind<'a, T: 'a>(
    records: &[&'a ExtractionRecord],
    pick: impl Fn(&'a ExtractionRecord) -> Option<&'a T>,
) -> Vec<&'a T> {
    records.iter().filter_map(|r| pick(*r)).collect()
}

impl AtomicReplaceStore {
    async fn replace_champions(
        txn: &DatabaseTransaction,
        records: &[&ExtractionRecord],
        source: &str,
        now: DateTimeWithTimeZone,
    ) -> Result<(u64, u64), DbErr> {
        use champion::{Column, Entity};
        let created =
            created_index::<Entity>(txn, Column::Name, Column::CreatedAt).await?;
        Entity::delete_many().exec(txn).await?;

        let stamp = Stamp { source, now, created: &created };
        let models: Vec<champion::ActiveModel> = of_kind(records, |r| match r {
            ExtractionRecord::Champion(c) => Some(c),
            _ => None,
        })
        .into_iter()
        .map(|c| champion_model(c, &stamp))
        .collect();
        let written = insert_all::<Entity, _>(
            txn,
            models,
            Column::Name,
            &[
                Column::IconUrl,
                Column::Cost,
                Column::Tier,
                Column::Traits,
                Column::AvgPlacement,
                Column::Top4Rate,
                Column::WinRate,
                Column::PickRate,
                Column::Games,
                Column::Source,
                Column::UpdatedAt,
            ],
        )
        .await?;
        Ok((created.len() as u64, written))
    }

    async fn replace_items(
        txn: &DatabaseTransaction,
        records: &[&ExtractionRecord],
        source: &str,
        now: DateTimeWithTimeZone,
    ) -> Result<(u64, u64), DbErr> {
        use item::{Column, Entity};
        let created =
            created_index::<Entity>(txn, Column::Name, Column::CreatedAt).await?;
        Entity::delete_many().exec(txn).await?;

        let stamp = Stamp { source, now, created: &created };
        let models: Vec<item::ActiveModel> = of_kind(records, |r| match r {
            ExtractionRecord::Item(i) => Some(i),
            _ => None,
        })
        .into_iter()
        .map(|i| item_model(i, &stamp))
        .collect();
        let written = insert_all::<Entity, _>(
            txn,
            models,
            Column::Name,
            &[
                Column::IconUrl,
                Column::Category,
                Column::Components,
                Column::AvgPlacement,
                Column::Top4Rate,
                Column::WinRate,
                Column::PickRate,
                Column::Games,
                Column::Source,
                Column::UpdatedAt,
            ],
        )
        .await?;
        Ok((created.len() as u64, written))
    }

    async fn replace_augments(
        txn: &DatabaseTransaction,
        records: &[&ExtractionRecord],
        source: &str,
        now: DateTimeWithTimeZone,
    ) -> Result<(u64, u64), DbErr> {
        use augment::{Column, Entity};
        let created =
            created_index::<Entity>(txn, Column::Name, Column::CreatedAt).await?;
        Entity::delete_many().exec(txn).await?;

        let stamp = Stamp { source, now, created: &created };
        let models: Vec<augment::ActiveModel> = of_kind(records, |r| match r {
            ExtractionRecord::Augment(a) => Some(a),
            _ => None,
        })
        .into_iter()
        .map(|a| augment_model(a, &stamp))
        .collect();
        let written = insert_all::<Entity, _>(
            txn,
            models,
            Column::Name,
            &[
                Column::IconUrl,
                Column::Tier,
                Column::AvgPlacement,
                Column::Top4Rate,
                Column::WinRate,
                Column::PickRate,
                Column::Games,
                Column::Source,
                Column::UpdatedAt,
            ],
        )
        .await?;
        Ok((created.len() as u64, written))
    }

    /// 阵容和阵容详情在同一事务内替换
    async fn replace_comps(
        txn: &DatabaseTransaction,
        records: &[&ExtractionRecord],
        source: &str,
        now: DateTimeWithTimeZone,
    ) -> Result<(u64, u64, u64), DbErr> {
        let comps = of_kind(records, |r| match r {
            ExtractionRecord::Comp(c) => Some(c),
            _ => None,
        });

        let created =
            created_index::<comp::Entity>(txn, comp::Column::Id, comp::Column::CreatedAt).await?;
        comp::Entity::delete_many().exec(txn).await?;

        let stamp = Stamp { source, now, created: &created };
        let models: Vec<comp::ActiveModel> = comps.iter().map(|c| comp_model(c, &stamp)).collect();
        let written = insert_all::<comp::Entity, _>(
            txn,
            models,
            comp::Column::Id,
            &[
                comp::Column::Name,
                comp::Column::Tier,
                comp::Column::Champions,
                comp::Column::Traits,
                comp::Column::AvgPlacement,
                comp::Column::Top4Rate,
                comp::Column::WinRate,
                comp::Column::PickRate,
                comp::Column::Games,
                comp::Column::Source,
                comp::Column::UpdatedAt,
            ],
        )
        .await?;

        let detail_created = created_index::<comp_detail::Entity>(
            txn,
            comp_detail::Column::CompId,
            comp_detail::Column::CreatedAt,
        )
        .await?;
        comp_detail::Entity::delete_many().exec(txn).await?;

        let details: Vec<comp_detail::ActiveModel> = comps
            .iter()
            .filter_map(|c| {
                let payload = c.detail.clone()?;
                Some(comp_detail::ActiveModel {
                    comp_id: Set(c.id.clone()),
                    payload: Set(payload),
                    created_at: Set(detail_created.get(&c.id).copied().unwrap_or(now)),
                    updated_at: Set(now),
                })
            })
            .collect();
        let details_written = insert_all::<comp_detail::Entity, _>(
            txn,
            details,
            comp_detail::Column::CompId,
            &[comp_detail::Column::Payload, comp_detail::Column::UpdatedAt],
        )
        .await?;

        Ok((created.len() as u64, written, details_written))
    }
}

#[async_trait]
impl DatasetRepository for AtomicReplaceStore {
    async fn replace(
        &self,
        entity: EntityType,
        records: &[ExtractionRecord],
        source: &str,
    ) -> Result<ReplaceSummary, RepositoryError> {
        if let Some(stray) = records.iter().find(|r| r.entity_type() != entity) {
            return Err(RepositoryError::EntityMismatch {
                expected: entity,
                found: stray.entity_type(),
            });
        }

        let unique = dedupe(records);
        let now = Utc::now().fixed_offset();

        // 未提交的事务在 drop 时回滚
        let txn = self.db.begin().await?;
        let (previous, written, details_written) = match entity {
            EntityType::Champions => {
                let (p, w) = Self::replace_champions(&txn, &unique, source, now).await?;
                (p, w, 0)
            }
            EntityType::Items => {
                let (p, w) = Self::replace_items(&txn, &unique, source, now).await?;
                (p, w, 0)
            }
            EntityType::Augments => {
                let (p, w) = Self::replace_augments(&txn, &unique, source, now).await?;
                (p, w, 0)
            }
            EntityType::Comps => Self::replace_comps(&txn, &unique, source, now).await?,
        };
        txn.commit().await?;

        gauge!("dataset_records", "entity" => entity.as_str()).set(written as f64);
        info!(
            entity = %entity,
            previous,
            written,
            details_written,
            source,
            "Dataset replaced"
        );

        Ok(ReplaceSummary {
            entity,
            previous,
            written,
            details_written,
        })
    }

    async fn count(&self, entity: EntityType) -> Result<u64, RepositoryError> {
        let db = self.db.as_ref();
        let count = match entity {
            EntityType::Champions => champion::Entity::find().count(db).await?,
            EntityType::Items => item::Entity::find().count(db).await?,
            EntityType::Augments => augment::Entity::find().count(db).await?,
            EntityType::Comps => comp::Entity::find().count(db).await?,
        };
        Ok(count)
    }
}
