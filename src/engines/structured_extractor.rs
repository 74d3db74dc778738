// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 结构化提取器
//!
//! 按 [`RecordSchema`] 描述的选择器从已解析文档中组装记录，
//! 只依赖 [`ParsedNode`] 接口，与具体的 HTML 解析库无关。

use crate::domain::models::extraction::RawRecord;
use crate::engines::traits::ExtractionError;
use crate::utils::text::clean_text;
use serde::Deserialize;
use std::collections::BTreeMap;

/// 已解析文档中的节点
pub trait ParsedNode: Clone {
    /// 查询匹配 CSS 选择器的所有后代节点
    fn select_all(&self, selector: &str) -> Result<Vec<Self>, ExtractionError>;

    /// 节点的文本内容
    fn text_content(&self) -> String;

    /// 节点属性
    fn attribute(&self, name: &str) -> Option<String>;
}

/// 单个字段的提取规则
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "FieldSpecRepr")]
pub struct FieldSpec {
    /// 相对于行节点的选择器，缺省时取行节点本身
    pub selector: Option<String>,
    /// 读取的属性，缺省时取文本
    pub attr: Option<String>,
    /// 是否收集所有匹配节点
    pub many: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FieldSpecRepr {
    Selector(String),
    Full {
        #[serde(default)]
        selector: Option<String>,
        #[serde(default)]
        attr: Option<String>,
        #[serde(default)]
        many: bool,
    },
}

impl From<FieldSpecRepr> for FieldSpec {
    fn from(repr: FieldSpecRepr) -> Self {
        match repr {
            FieldSpecRepr::Selector(selector) => FieldSpec {
                selector: Some(selector),
                attr: None,
                many: false,
            },
            FieldSpecRepr::Full {
                selector,
                attr,
                many,
            } => FieldSpec {
                selector,
                attr,
                many,
            },
        }
    }
}

/// 记录模式：行选择器加字段规则
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RecordSchema {
    pub row: String,
    pub fields: BTreeMap<String, FieldSpec>,
}

/// 按行提取记录，跳过没有任何字段的行
pub fn extract_records<N: ParsedNode>(
    root: &N,
    schema: &RecordSchema,
) -> Result<Vec<RawRecord>, ExtractionError> {
    let mut records = Vec::new();
    for row in root.select_all(&schema.row)? {
        let record = extract_fields(&row, &schema.fields)?;
        if !record.fields.is_empty() {
            records.push(record);
        }
    }
    Ok(records)
}

/// 从单个节点提取一组字段
pub fn extract_fields<N: ParsedNode>(
    node: &N,
    fields: &BTreeMap<String, FieldSpec>,
) -> Result<RawRecord, ExtractionError> {
    let mut record = RawRecord::new();
    for (name, spec) in fields {
        let targets = match &spec.selector {
            Some(selector) => node.select_all(selector)?,
            None => vec![node.clone()],
        };

        let mut values = targets.iter().filter_map(|target| {
            let value = match &spec.attr {
                Some(attr) => target.attribute(attr)?,
                None => target.text_content(),
            };
            let value = clean_text(&value);
            (!value.is_empty()).then_some(value)
        });

        if spec.many {
            let values: Vec<String> = values.collect();
            if !values.is_empty() {
                record.set_list(name.clone(), values);
            }
        } else if let Some(value) = values.next() {
            record.set_text(name.clone(), value);
        }
    }
    Ok(record)
}
