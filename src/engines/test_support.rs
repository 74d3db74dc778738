// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 单元测试用的内存站点和浏览器会话

use crate::engines::browser_session::{BrowserSession, SessionFactory};
use crate::engines::traits::ExtractionError;
use async_trait::async_trait;
use parking_lot::Mutex;
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
struct SiteState {
    pages: HashMap<String, String>,
    clicks: HashMap<(String, String), String>,
    navigation_failures: HashMap<String, u32>,
    reload_fails: bool,
    open_fails: bool,
    opens: u32,
    closes: u32,
    reloads: u32,
    visits: Vec<String>,
}

/// 内存站点，同时充当会话工厂
#[derive(Clone, Default)]
pub struct FakeSite {
    state: Arc<Mutex<SiteState>>,
}

impl FakeSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(self, url: &str, html: &str) -> Self {
        self.state
            .lock()
            .pages
            .insert(url.to_string(), html.to_string());
        self
    }

    /// 在 `url` 页面点击 `selector` 后跳转到 `target`
    pub fn click_leads_to(self, url: &str, selector: &str, target: &str) -> Self {
        self.state.lock().clicks.insert(
            (url.to_string(), selector.to_string()),
            target.to_string(),
        );
        self
    }

    /// 导航到 `url` 的前 `times` 次失败
    pub fn fail_navigation(&self, url: &str, times: u32) {
        self.state
            .lock()
            .navigation_failures
            .insert(url.to_string(), times);
    }

    pub fn fail_reloads(&self) {
        self.state.lock().reload_fails = true;
    }

    pub fn fail_open(&self) {
        self.state.lock().open_fails = true;
    }

    pub fn session(&self) -> FakeSession {
        FakeSession {
            state: self.state.clone(),
            current: Mutex::new(None),
        }
    }

    pub fn opens(&self) -> u32 {
        self.state.lock().opens
    }

    pub fn closes(&self) -> u32 {
        self.state.lock().closes
    }

    pub fn reloads(&self) -> u32 {
        self.state.lock().reloads
    }

    /// 成功导航过的地址，按顺序
    pub fn visits(&self) -> Vec<String> {
        self.state.lock().visits.clone()
    }
}

#[async_trait]
impl SessionFactory for FakeSite {
    async fn open(&self) -> Result<Box<dyn BrowserSession>, ExtractionError> {
        {
            let mut state = self.state.lock();
            if state.open_fails {
                return Err(ExtractionError::Session("browser unavailable".into()));
            }
            state.opens += 1;
        }
        Ok(Box::new(self.session()))
    }
}

pub struct FakeSession {
    state: Arc<Mutex<SiteState>>,
    current: Mutex<Option<String>>,
}

impl FakeSession {
    fn current_html(&self) -> Result<String, ExtractionError> {
        let current = self
            .current
            .lock()
            .clone()
            .ok_or_else(|| ExtractionError::Session("no page loaded".into()))?;
        self.state
            .lock()
            .pages
            .get(&current)
            .cloned()
            .ok_or_else(|| ExtractionError::Navigation(format!("{}: 404", current)))
    }
}

fn has_selector(html: &str, selector: &str) -> bool {
    let Ok(selector) = Selector::parse(selector) else {
        return false;
    };
    Html::parse_document(html).select(&selector).next().is_some()
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn navigate(&self, url: &str) -> Result<(), ExtractionError> {
        let mut state = self.state.lock();
        if let Some(remaining) = state.navigation_failures.get_mut(url) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(ExtractionError::Navigation(format!("{}: connection reset", url)));
            }
        }
        if !state.pages.contains_key(url) {
            return Err(ExtractionError::Navigation(format!("{}: 404", url)));
        }
        state.visits.push(url.to_string());
        drop(state);
        *self.current.lock() = Some(url.to_string());
        Ok(())
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        _timeout: Duration,
    ) -> Result<(), ExtractionError> {
        let html = self.current_html()?;
        if has_selector(&html, selector) {
            Ok(())
        } else {
            Err(ExtractionError::SelectorNotFound(selector.to_string()))
        }
    }

    async fn click(&self, selector: &str) -> Result<(), ExtractionError> {
        let current = self
            .current
            .lock()
            .clone()
            .ok_or_else(|| ExtractionError::Session("no page loaded".into()))?;
        let target = self
            .state
            .lock()
            .clicks
            .get(&(current, selector.to_string()))
            .cloned()
            .ok_or_else(|| ExtractionError::SelectorNotFound(selector.to_string()))?;
        self.navigate(&target).await
    }

    async fn content(&self) -> Result<String, ExtractionError> {
        self.current_html()
    }

    async fn reload(&self) -> Result<(), ExtractionError> {
        let mut state = self.state.lock();
        if state.reload_fails {
            return Err(ExtractionError::Navigation("reload failed".into()));
        }
        state.reloads += 1;
        Ok(())
    }

    async fn close(&self) -> Result<(), ExtractionError> {
        self.state.lock().closes += 1;
        Ok(())
    }
}
