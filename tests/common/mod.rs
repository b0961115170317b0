//! Test utilities and helper functions for the sitemirror test suite

use anyhow::{Result, anyhow};
use kodegen_tools_sitemirror::config::{DownloadOptions, Fingerprint, MirrorConfig};
use kodegen_tools_sitemirror::crawl_engine::{PageRenderer, RenderedPage};
use kodegen_tools_sitemirror::{ManagedSession, ResourceKind, ResourceRecord, SessionFactory};
use mockito::{Mock, Server};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// Route library logs to the test harness; `RUST_LOG` selects the level
#[allow(dead_code)]
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Creates a temporary directory for test output
#[allow(dead_code)]
pub fn create_test_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates an HTML document with the given anchors and extra body markup
#[allow(dead_code)]
pub fn page_html(links: &[&str], body: &str) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<a href="{href}">{href}</a>"#))
        .collect();
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="UTF-8"><title>Test</title></head>
<body>
{anchors}
{body}
</body>
</html>"#
    )
}

/// Mirror config rooted at `root` with fast retries
#[allow(dead_code)]
pub fn test_config(root: &Path) -> MirrorConfig {
    test_config_with(root, DownloadOptions::default())
}

#[allow(dead_code)]
pub fn test_config_with(root: &Path, options: DownloadOptions) -> MirrorConfig {
    MirrorConfig::builder()
        .mirror_root(root.join("mirror"))
        .profile_root(root.join("profiles"))
        .max_retries(3)
        .retry_backoff_unit(Duration::from_millis(10))
        .request_timeout_secs(5)
        .download_concurrency(2)
        .download_options(options)
        .build()
        .expect("Failed to create test config")
}

/// Creates a mock endpoint that returns a body with the given content type
#[allow(dead_code)]
pub async fn create_body_mock(
    server: &mut Server,
    path: &str,
    content_type: &str,
    body: &str,
) -> Mock {
    server
        .mock("GET", path)
        .with_status(200)
        .with_header("content-type", content_type)
        .with_body(body)
        .create_async()
        .await
}

/// Helper to create test URLs
#[allow(dead_code)]
pub fn test_url(server: &Server, path: &str) -> String {
    format!("{}{}", server.url(), path)
}

// =============================================================================
// In-memory site standing in for a browser
// =============================================================================

#[allow(dead_code)]
#[derive(Debug, Clone)]
pub enum FakePage {
    Ok {
        html: String,
        resources: Vec<ResourceRecord>,
    },
    Fail(String),
}

/// Link graph rendered without a browser; counts navigations
#[derive(Debug, Default)]
#[allow(dead_code)]
pub struct FakeSite {
    pages: HashMap<String, FakePage>,
    delay: Option<Duration>,
    navigations: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    log: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl FakeSite {
    pub fn new() -> Self {
        Self::default()
    }

    /// Page at `url` linking to `links` and loading `resources`
    pub fn page(mut self, url: &str, links: &[&str], resources: &[(ResourceKind, &str)]) -> Self {
        let resources = resources
            .iter()
            .map(|(kind, url)| ResourceRecord::new(*kind, *url))
            .collect();
        self.pages.insert(
            url.to_string(),
            FakePage::Ok {
                html: page_html(links, ""),
                resources,
            },
        );
        self
    }

    pub fn failing_page(mut self, url: &str, error: &str) -> Self {
        self.pages
            .insert(url.to_string(), FakePage::Fail(error.to_string()));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn navigations(&self) -> usize {
        self.navigations.load(Ordering::SeqCst)
    }

    /// Highest number of renders that were running at the same time
    pub fn max_concurrent_renders(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn navigation_log(&self) -> Vec<String> {
        self.log.lock().map(|log| log.clone()).unwrap_or_default()
    }
}

impl PageRenderer for FakeSite {
    async fn render(&self, url: &str) -> Result<RenderedPage> {
        self.navigations.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut log) = self.log.lock() {
            log.push(url.to_string());
        }
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        match self.pages.get(url) {
            Some(FakePage::Ok { html, resources }) => Ok(RenderedPage {
                html: html.clone(),
                resources: resources.clone(),
            }),
            Some(FakePage::Fail(error)) => Err(anyhow!("{error}")),
            None => Err(anyhow!("404 for {url}")),
        }
    }
}

// =============================================================================
// Session factory double
// =============================================================================

/// Session handed out by `FakeSessionFactory`
#[allow(dead_code)]
pub struct FakeSession {
    pub id: String,
    site: Arc<FakeSite>,
    closed: Arc<AtomicUsize>,
    is_closed: AtomicBool,
    renders_after_close: Arc<AtomicUsize>,
}

impl ManagedSession for FakeSession {
    async fn close(&self) -> Result<()> {
        self.is_closed.store(true, Ordering::SeqCst);
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl PageRenderer for FakeSession {
    async fn render(&self, url: &str) -> Result<RenderedPage> {
        if self.is_closed.load(Ordering::SeqCst) {
            self.renders_after_close.fetch_add(1, Ordering::SeqCst);
            return Err(anyhow!("session {} is closed", self.id));
        }
        self.site.render(url).await
    }
}

/// Counts session launches and closes
#[derive(Clone, Default)]
#[allow(dead_code)]
pub struct FakeSessionFactory {
    site: Arc<FakeSite>,
    launch_delay: Duration,
    fail: bool,
    pub created: Arc<AtomicUsize>,
    pub closed: Arc<AtomicUsize>,
    pub renders_after_close: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl FakeSessionFactory {
    pub fn new(site: FakeSite) -> Self {
        Self {
            site: Arc::new(site),
            ..Self::default()
        }
    }

    pub fn with_launch_delay(mut self, delay: Duration) -> Self {
        self.launch_delay = delay;
        self
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn site(&self) -> &FakeSite {
        &self.site
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn renders_after_close(&self) -> usize {
        self.renders_after_close.load(Ordering::SeqCst)
    }
}

impl SessionFactory for FakeSessionFactory {
    type Session = FakeSession;

    async fn create(&self, id: &str, _fingerprint: &Fingerprint) -> Result<FakeSession> {
        if !self.launch_delay.is_zero() {
            tokio::time::sleep(self.launch_delay).await;
        }
        if self.fail {
            return Err(anyhow!("browser executable not found"));
        }
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(FakeSession {
            id: id.to_string(),
            site: Arc::clone(&self.site),
            closed: Arc::clone(&self.closed),
            is_closed: AtomicBool::new(false),
            renders_after_close: Arc::clone(&self.renders_after_close),
        })
    }
}
