//! Page rendering seam between the frontier and the browser
//!
//! The frontier only needs "navigate to a URL, give me the document and the
//! resources it loaded". `PageRenderer` is that contract; a pooled
//! `BrowserSession` fulfils it with its single Chromium tab.

use anyhow::{Context, Result};
use std::future::Future;

use super::page_timeout::with_page_timeout;
use super::resource_collector::ResourceCollector;
use crate::browser_pool::BrowserSession;
use crate::config::MirrorConfig;
use crate::manifest::ResourceRecord;

/// A rendered document and the resources observed while it loaded
#[derive(Debug, Clone, Default)]
pub struct RenderedPage {
    pub html: String,
    pub resources: Vec<ResourceRecord>,
}

/// Navigates to a URL and reports what was loaded
pub trait PageRenderer: Send + Sync {
    fn render(&self, url: &str) -> impl Future<Output = Result<RenderedPage>> + Send;
}

/// Timeouts and channel bound for browser-backed rendering
#[derive(Debug, Clone, Copy)]
pub struct RenderSettings {
    pub navigation_timeout_secs: u64,
    pub load_timeout_secs: u64,
    pub collector_capacity: usize,
}

impl RenderSettings {
    #[must_use]
    pub fn from_config(config: &MirrorConfig) -> Self {
        Self {
            navigation_timeout_secs: config.navigation_timeout_secs(),
            load_timeout_secs: config.load_timeout_secs(),
            collector_capacity: config.collector_capacity(),
        }
    }
}

impl PageRenderer for BrowserSession {
    async fn render(&self, url: &str) -> Result<RenderedPage> {
        let page = self.page();
        let settings = self.render_settings();

        let collector = ResourceCollector::attach(page, settings.collector_capacity)
            .await
            .with_context(|| format!("Failed to attach resource collector for {url}"))?;

        with_page_timeout(
            async {
                page.goto(url)
                    .await
                    .map(|_| ())
                    .with_context(|| format!("Navigation to {url} failed"))
            },
            settings.navigation_timeout_secs,
            "Navigation",
        )
        .await?;

        let resources = collector.finish(settings.load_timeout_secs).await?;

        let html = page
            .content()
            .await
            .with_context(|| format!("Failed to read document of {url}"))?;

        Ok(RenderedPage { html, resources })
    }
}
