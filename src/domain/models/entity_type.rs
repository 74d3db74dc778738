// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 数据集实体类型
///
/// 每种类型对应独立的抓取来源、校验阈值和存储表。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    /// 英雄
    Champions,
    /// 装备
    Items,
    /// 强化符文
    Augments,
    /// 阵容
    Comps,
}

impl EntityType {
    /// 所有实体类型，按默认调度顺序排列
    pub const ALL: [EntityType; 4] = [
        EntityType::Champions,
        EntityType::Items,
        EntityType::Augments,
        EntityType::Comps,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Champions => "champions",
            EntityType::Items => "items",
            EntityType::Augments => "augments",
            EntityType::Comps => "comps",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "champions" => Ok(EntityType::Champions),
            "items" => Ok(EntityType::Items),
            "augments" => Ok(EntityType::Augments),
            "comps" => Ok(EntityType::Comps),
            other => Err(format!("unknown entity type: {}", other)),
        }
    }
}
