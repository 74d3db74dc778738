// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::entity_type::EntityType;
use super::extraction::RawRecord;
use crate::utils::text::{clean_text, parse_integer, parse_number, slugify};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// 对局表现统计，全部字段可缺省
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceStats {
    /// 平均名次
    pub avg_placement: Option<f64>,
    /// 前四率（百分比数值）
    pub top4_rate: Option<f64>,
    /// 吃鸡率（百分比数值）
    pub win_rate: Option<f64>,
    /// 出场率
    pub pick_rate: Option<f64>,
    /// 样本对局数
    pub games: Option<i64>,
}

impl PerformanceStats {
    fn from_raw(raw: &RawRecord) -> Self {
        Self {
            avg_placement: raw.text("avg_placement").and_then(parse_number),
            top4_rate: raw.text("top4_rate").and_then(parse_number),
            win_rate: raw.text("win_rate").and_then(parse_number),
            pick_rate: raw.text("pick_rate").and_then(parse_number),
            games: raw.text("games").and_then(parse_integer),
        }
    }

    /// 所有已填写的数值均为有限值
    pub fn is_well_formed(&self) -> bool {
        [self.avg_placement, self.top4_rate, self.win_rate, self.pick_rate]
            .iter()
            .flatten()
            .all(|v| v.is_finite())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChampionRecord {
    pub name: String,
    pub icon_url: Option<String>,
    pub cost: Option<i32>,
    pub tier: Option<String>,
    pub traits: Vec<String>,
    pub stats: PerformanceStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub name: String,
    pub icon_url: Option<String>,
    pub category: Option<String>,
    pub components: Vec<String>,
    pub stats: PerformanceStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AugmentRecord {
    pub name: String,
    pub icon_url: Option<String>,
    pub tier: Option<String>,
    pub stats: PerformanceStats,
}

/// 阵容记录
///
/// `id` 由阵容名与排序后的英雄列表派生，同一阵容每次抓取得到相同的键。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompRecord {
    pub id: String,
    pub name: String,
    pub tier: Option<String>,
    pub champions: Vec<String>,
    pub traits: Vec<String>,
    pub stats: PerformanceStats,
    /// 详情页数据，仅在详情抓取成功时存在
    pub detail: Option<Value>,
}

/// 类型化抓取记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entity", rename_all = "lowercase")]
pub enum ExtractionRecord {
    Champion(ChampionRecord),
    Item(ItemRecord),
    Augment(AugmentRecord),
    Comp(CompRecord),
}

impl ExtractionRecord {
    /// 将原始记录转换为指定实体类型的记录
    ///
    /// 缺少自然键的行返回 `None`
    pub fn from_raw(entity: EntityType, raw: &RawRecord) -> Option<Self> {
        let name = raw.text("name").map(clean_text);
        let icon_url = raw.text("icon_url").map(str::to_string);
        let tier = raw.text("tier").map(clean_text);
        let stats = PerformanceStats::from_raw(raw);

        match entity {
            EntityType::Champions => Some(ExtractionRecord::Champion(ChampionRecord {
                name: name?,
                icon_url,
                cost: raw
                    .text("cost")
                    .and_then(parse_integer)
                    .and_then(|c| i32::try_from(c).ok()),
                tier,
                traits: raw.list("traits"),
                stats,
            })),
            EntityType::Items => Some(ExtractionRecord::Item(ItemRecord {
                name: name?,
                icon_url,
                category: raw.text("category").map(clean_text),
                components: raw.list("components"),
                stats,
            })),
            EntityType::Augments => Some(ExtractionRecord::Augment(AugmentRecord {
                name: name?,
                icon_url,
                tier,
                stats,
            })),
            EntityType::Comps => {
                let champions = raw.list("champions");
                let name = match name {
                    Some(name) => name,
                    None if !champions.is_empty() => champions.join(" / "),
                    None => return None,
                };
                let id = comp_id(&name, &champions);
                if id.is_empty() {
                    return None;
                }
                Some(ExtractionRecord::Comp(CompRecord {
                    id,
                    name,
                    tier,
                    champions,
                    traits: raw.list("traits"),
                    stats,
                    detail: raw.detail.clone().map(Value::Object),
                }))
            }
        }
    }

    pub fn entity_type(&self) -> EntityType {
        match self {
            ExtractionRecord::Champion(_) => EntityType::Champions,
            ExtractionRecord::Item(_) => EntityType::Items,
            ExtractionRecord::Augment(_) => EntityType::Augments,
            ExtractionRecord::Comp(_) => EntityType::Comps,
        }
    }

    /// 自然唯一键：阵容为派生 id，其余为名称
    pub fn natural_key(&self) -> &str {
        match self {
            ExtractionRecord::Champion(r) => &r.name,
            ExtractionRecord::Item(r) => &r.name,
            ExtractionRecord::Augment(r) => &r.name,
            ExtractionRecord::Comp(r) => &r.id,
        }
    }

    pub fn stats(&self) -> &PerformanceStats {
        match self {
            ExtractionRecord::Champion(r) => &r.stats,
            ExtractionRecord::Item(r) => &r.stats,
            ExtractionRecord::Augment(r) => &r.stats,
            ExtractionRecord::Comp(r) => &r.stats,
        }
    }
}

/// 不同自然键的数量，即去重后实际会写入的记录数
pub fn distinct_keys(records: &[ExtractionRecord]) -> usize {
    records
        .iter()
        .map(ExtractionRecord::natural_key)
        .collect::<HashSet<_>>()
        .len()
}

/// 派生阵容复合键
pub fn comp_id(name: &str, champions: &[String]) -> String {
    let mut members: Vec<String> = champions
        .iter()
        .map(|c| slugify(c))
        .filter(|c| !c.is_empty())
        .collect();
    members.sort();
    members.dedup();

    let name_slug = slugify(name);
    match (name_slug.is_empty(), members.is_empty()) {
        (_, true) => name_slug,
        (true, false) => members.join("-"),
        (false, false) => format!("{}--{}", name_slug, members.join("-")),
    }
}
