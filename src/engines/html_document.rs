// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::extraction::RawRecord;
use crate::engines::structured_extractor::{
    extract_fields, extract_records, FieldSpec, ParsedNode, RecordSchema,
};
use crate::engines::traits::ExtractionError;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;

/// 基于 scraper 的节点适配
impl<'a> ParsedNode for ElementRef<'a> {
    fn select_all(&self, selector: &str) -> Result<Vec<Self>, ExtractionError> {
        let selector = Selector::parse(selector)
            .map_err(|e| ExtractionError::Parse(format!("invalid selector '{}': {}", selector, e)))?;
        Ok(self.select(&selector).collect())
    }

    fn text_content(&self) -> String {
        self.text().collect::<Vec<_>>().join(" ")
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.value().attr(name).map(str::to_string)
    }
}

// `Html` 不是 Send，这里的函数都在同步上下文中完成解析，避免跨越 await

/// 解析 HTML 并按模式提取记录
pub fn records_from_html(html: &str, schema: &RecordSchema) -> Result<Vec<RawRecord>, ExtractionError> {
    let document = Html::parse_document(html);
    extract_records(&document.root_element(), schema)
}

/// 解析 HTML 并从整个文档提取一组字段
pub fn fields_from_html(
    html: &str,
    fields: &BTreeMap<String, FieldSpec>,
) -> Result<RawRecord, ExtractionError> {
    let document = Html::parse_document(html);
    extract_fields(&document.root_element(), fields)
}
