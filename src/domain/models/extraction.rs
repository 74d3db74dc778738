// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::entity_type::EntityType;
use super::record::{distinct_keys, ExtractionRecord};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

/// 来源返回的原始记录
///
/// 字段值为字符串或字符串列表；`detail` 保存详情页抓取到的附加数据
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub fields: Map<String, Value>,
    pub detail: Option<Map<String, Value>>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// 读取非空文本字段
    pub fn text(&self, key: &str) -> Option<&str> {
        match self.fields.get(key) {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim()),
            Some(Value::Array(values)) => values
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .find(|s| !s.is_empty()),
            _ => None,
        }
    }

    /// 读取列表字段，单个字符串视为只有一个元素的列表
    pub fn list(&self, key: &str) -> Vec<String> {
        match self.fields.get(key) {
            Some(Value::Array(values)) => values
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
            _ => Vec::new(),
        }
    }

    pub fn set_text(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), Value::String(value.into()));
    }

    pub fn set_list(&mut self, key: impl Into<String>, values: Vec<String>) {
        self.fields.insert(
            key.into(),
            Value::Array(values.into_iter().map(Value::String).collect()),
        );
    }
}

/// 一次抓取尝试的结果
///
/// 包含类型化记录和来源信息，校验和存储之后即被丢弃
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    /// 实体类型
    pub entity: EntityType,
    /// 来源名称
    pub source: String,
    /// 类型化记录，保持来源给出的顺序
    pub records: Vec<ExtractionRecord>,
    /// 抓取耗时
    pub duration: Duration,
}

impl ExtractionResult {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 去重后的记录数
    pub fn distinct_len(&self) -> usize {
        distinct_keys(&self.records)
    }
}
