// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use metacrawl::domain::models::record::{CompRecord, ExtractionRecord, ItemRecord, PerformanceStats};
use metacrawl::engines::browser_session::{BrowserSession, SessionFactory};
use metacrawl::engines::traits::ExtractionError;
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use std::sync::Arc;

/// 已完成迁移的内存 SQLite 数据库
pub async fn setup_db() -> Arc<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    Arc::new(db)
}

pub fn item(name: &str, avg_placement: f64) -> ExtractionRecord {
    ExtractionRecord::Item(ItemRecord {
        name: name.to_string(),
        icon_url: Some(format!("https://cdn.example.gg/items/{}.png", name)),
        category: Some("completed".to_string()),
        components: vec!["B.F. Sword".to_string(), "Recurve Bow".to_string()],
        stats: PerformanceStats {
            avg_placement: Some(avg_placement),
            top4_rate: Some(52.5),
            games: Some(1200),
            ..Default::default()
        },
    })
}

pub fn items(count: usize) -> Vec<ExtractionRecord> {
    (0..count)
        .map(|i| item(&format!("Item {}", i), 4.0 + i as f64 / 100.0))
        .collect()
}

pub fn comp(id: &str, detail: Option<serde_json::Value>) -> ExtractionRecord {
    ExtractionRecord::Comp(CompRecord {
        id: id.to_string(),
        name: id.replace('-', " "),
        tier: Some("S".to_string()),
        champions: vec!["Jinx".to_string(), "Vi".to_string()],
        traits: vec!["Enforcer".to_string()],
        stats: PerformanceStats::default(),
        detail,
    })
}

/// 物品统计表页面
pub fn items_table(names: impl IntoIterator<Item = String>) -> String {
    let rows: String = names
        .into_iter()
        .map(|name| {
            format!(
                r#"<tr><td class="name"><img src="/icons/{0}.png">{0}</td><td class="avg">4.{1}</td></tr>"#,
                name,
                name.len()
            )
        })
        .collect();
    format!(
        r#"<html><body><table class="items"><tbody>{}</tbody></table></body></html>"#,
        rows
    )
}

pub fn item_names(range: std::ops::Range<usize>) -> Vec<String> {
    range.map(|i| format!("Item{}", i)).collect()
}

/// 无法启动浏览器的会话工厂
pub struct UnavailableBrowser;

#[async_trait]
impl SessionFactory for UnavailableBrowser {
    async fn open(&self) -> Result<Box<dyn BrowserSession>, ExtractionError> {
        Err(ExtractionError::Session("no browser in test environment".into()))
    }
}
