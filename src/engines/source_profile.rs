// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::entity_type::EntityType;
use crate::domain::models::extraction::RawRecord;
use crate::engines::structured_extractor::{FieldSpec, RecordSchema};
use crate::engines::traits::ExtractionError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use url::Url;

/// 来源实现方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// 浏览器自动化（chromiumoxide）
    Browser,
    /// 静态 HTML（reqwest）
    Http,
}

/// 分页配置
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PaginationSpec {
    /// 浏览器来源：点击“下一页”的选择器
    #[serde(default)]
    pub next_selector: Option<String>,
    /// HTTP 来源：页码查询参数
    #[serde(default)]
    pub page_param: Option<String>,
    /// 最多抓取的页数（含首页）
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
}

/// 详情页配置
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DetailSpec {
    /// 列表记录中保存详情链接的字段
    pub link_field: String,
    #[serde(default)]
    pub ready_selector: Option<String>,
    pub fields: BTreeMap<String, FieldSpec>,
}

/// 单个抓取来源的定义
///
/// 站点相关的选择器只存在于配置中
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SourceDefinition {
    pub name: String,
    pub kind: SourceKind,
    pub entity: EntityType,
    #[serde(default)]
    pub priority: u32,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub url: String,
    /// 页面就绪时必然出现的元素
    #[serde(default)]
    pub ready_selector: Option<String>,
    /// 等待客户端渲染稳定的固定延迟
    #[serde(default)]
    pub settle_ms: u64,
    pub schema: RecordSchema,
    #[serde(default)]
    pub pagination: Option<PaginationSpec>,
    #[serde(default)]
    pub detail: Option<DetailSpec>,
}

fn default_max_pages() -> u32 {
    1
}

fn default_enabled() -> bool {
    true
}

impl SourceDefinition {
    /// 将记录中的相对链接解析为绝对地址
    pub fn resolve_links(&self, records: &mut [RawRecord]) {
        let Ok(base) = Url::parse(&self.url) else {
            return;
        };
        let mut link_fields = vec!["icon_url".to_string()];
        if let Some(detail) = &self.detail {
            link_fields.push(detail.link_field.clone());
        }

        for record in records.iter_mut() {
            for field in &link_fields {
                let Some(href) = record.text(field) else {
                    continue;
                };
                if let Ok(absolute) = base.join(href) {
                    let absolute = absolute.to_string();
                    record.set_text(field.clone(), absolute);
                }
            }
        }
    }

    /// 第 `page` 页（从 1 开始）的 HTTP 地址
    pub fn page_url(&self, page: u32) -> Result<String, ExtractionError> {
        let param = self.pagination.as_ref().and_then(|p| p.page_param.as_deref());
        match param {
            Some(param) if page > 1 => {
                let mut url = Url::parse(&self.url)
                    .map_err(|e| ExtractionError::Config(format!("{}: {}", self.name, e)))?;
                url.query_pairs_mut().append_pair(param, &page.to_string());
                Ok(url.to_string())
            }
            _ => Ok(self.url.clone()),
        }
    }

    pub fn max_pages(&self) -> u32 {
        self.pagination
            .as_ref()
            .map(|p| p.max_pages.max(1))
            .unwrap_or(1)
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    sources: Vec<SourceDefinition>,
}

/// 来源目录，从 YAML 加载
#[derive(Debug, Clone, Default)]
pub struct SourceCatalog {
    sources: Vec<SourceDefinition>,
}

impl SourceCatalog {
    pub fn from_yaml_str(content: &str) -> Result<Self, ExtractionError> {
        let file: CatalogFile = serde_yaml::from_str(content)
            .map_err(|e| ExtractionError::Config(format!("invalid source catalog: {}", e)))?;
        let catalog = Self {
            sources: file.sources,
        };
        catalog.check()?;
        Ok(catalog)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ExtractionError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ExtractionError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&content)
    }

    fn check(&self) -> Result<(), ExtractionError> {
        let mut seen = std::collections::HashSet::new();
        for source in &self.sources {
            if !seen.insert(source.name.as_str()) {
                return Err(ExtractionError::Config(format!(
                    "duplicate source name '{}'",
                    source.name
                )));
            }
            Url::parse(&source.url)
                .map_err(|e| ExtractionError::Config(format!("{}: invalid url: {}", source.name, e)))?;
        }
        Ok(())
    }

    /// 某实体类型的已启用来源，按优先级排序
    pub fn for_entity(&self, entity: EntityType) -> Vec<&SourceDefinition> {
        let mut sources: Vec<&SourceDefinition> = self
            .sources
            .iter()
            .filter(|s| s.enabled && s.entity == entity)
            .collect();
        sources.sort_by_key(|s| s.priority);
        sources
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
