// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::BrowserSettings;
use crate::engines::traits::ExtractionError;
use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// 浏览器自动化会话
///
/// 一个会话对应一个页面，所有 DOM 交互在其上顺序进行
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// 导航到指定地址并等待加载完成
    async fn navigate(&self, url: &str) -> Result<(), ExtractionError>;

    /// 等待元素出现
    async fn wait_for_selector(&self, selector: &str, timeout: Duration)
        -> Result<(), ExtractionError>;

    /// 点击元素
    async fn click(&self, selector: &str) -> Result<(), ExtractionError>;

    /// 当前页面的 HTML
    async fn content(&self) -> Result<String, ExtractionError>;

    /// 整页重新加载
    async fn reload(&self) -> Result<(), ExtractionError>;

    /// 释放会话资源
    async fn close(&self) -> Result<(), ExtractionError>;
}

/// 会话工厂，每次抓取尝试打开一个新会话
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self) -> Result<Box<dyn BrowserSession>, ExtractionError>;
}

/// 基于 chromiumoxide 的会话工厂
pub struct ChromiumSessionFactory {
    settings: BrowserSettings,
}

impl ChromiumSessionFactory {
    pub fn new(settings: BrowserSettings) -> Self {
        Self { settings }
    }

    async fn connect(&self) -> Result<(Browser, chromiumoxide::Handler), ExtractionError> {
        if let Some(url) = &self.settings.remote_url {
            info!("Connecting to remote Chrome instance at: {}", url);
            return Browser::connect(url.as_str()).await.map_err(|e| {
                ExtractionError::Session(format!("Failed to connect to remote Chrome: {}", e))
            });
        }

        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .request_timeout(Duration::from_secs(self.settings.request_timeout_secs));
        if !self.settings.headless {
            builder = builder.with_head();
        }
        for arg in &self.settings.args {
            builder = builder.arg(arg.as_str());
        }
        let config = builder.build().map_err(ExtractionError::Session)?;

        Browser::launch(config)
            .await
            .map_err(|e| ExtractionError::Session(format!("Failed to launch Chrome: {}", e)))
    }
}

#[async_trait]
impl SessionFactory for ChromiumSessionFactory {
    async fn open(&self) -> Result<Box<dyn BrowserSession>, ExtractionError> {
        let (browser, mut handler) = self.connect().await?;

        // 处理浏览器事件
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler_task.abort();
                return Err(ExtractionError::Session(e.to_string()));
            }
        };
        debug!("Browser session opened");

        Ok(Box::new(ChromiumSession {
            browser: Mutex::new(browser),
            page,
            handler_task,
            owned: self.settings.remote_url.is_none(),
        }))
    }
}

/// chromiumoxide 会话
pub struct ChromiumSession {
    browser: Mutex<Browser>,
    page: Page,
    handler_task: JoinHandle<()>,
    /// 本地启动的浏览器在会话结束时关闭，远程实例只关闭页面
    owned: bool,
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn navigate(&self, url: &str) -> Result<(), ExtractionError> {
        self.page
            .goto(url)
            .await
            .map_err(|e| ExtractionError::Navigation(format!("{}: {}", url, e)))?;
        Ok(())
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), ExtractionError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.page.find_element(selector).await.is_ok() {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(ExtractionError::SelectorNotFound(format!(
                    "'{}' after {:?}",
                    selector, timeout
                )));
            }
            tokio::time::sleep(SELECTOR_POLL_INTERVAL).await;
        }
    }

    async fn click(&self, selector: &str) -> Result<(), ExtractionError> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|e| ExtractionError::SelectorNotFound(format!("'{}': {}", selector, e)))?;
        element
            .click()
            .await
            .map_err(|e| ExtractionError::Session(format!("Click failed: {}", e)))?;
        Ok(())
    }

    async fn content(&self) -> Result<String, ExtractionError> {
        self.page
            .content()
            .await
            .map_err(|e| ExtractionError::Session(e.to_string()))
    }

    async fn reload(&self) -> Result<(), ExtractionError> {
        self.page
            .reload()
            .await
            .map_err(|e| ExtractionError::Navigation(format!("Reload failed: {}", e)))?;
        Ok(())
    }

    async fn close(&self) -> Result<(), ExtractionError> {
        if let Err(e) = self.page.clone().close().await {
            warn!("Failed to close page: {}", e);
        }

        let mut result = Ok(());
        if self.owned {
            let mut browser = self.browser.lock().await;
            result = browser
                .close()
                .await
                .map(|_| ())
                .map_err(|e| ExtractionError::Session(e.to_string()));
            if result.is_ok() {
                let _ = browser.wait().await;
            }
        }
        self.handler_task.abort();
        debug!("Browser session closed");
        result
    }
}
