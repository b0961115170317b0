//! Browser session pool keyed by site identifier
//!
//! One session (browser process + tab) per identifier, created on first use
//! and reused until released. Creation happens under the registry's write
//! lock with a second lookup, so racing callers for the same identifier get
//! the same session and only one browser is launched.

use anyhow::{Context, Result};
use chromiumoxide::Page;
use chromiumoxide::browser::Browser;
use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::browser_profile::persistent_profile_dir;
use crate::browser_setup::{LaunchOptions, install_stealth_script, launch_browser};
use crate::config::{Fingerprint, MirrorConfig};
use crate::crawl_engine::RenderSettings;

// =============================================================================
// Session seams
// =============================================================================

/// A pooled session that can be shut down
pub trait ManagedSession: Send + Sync + 'static {
    fn close(&self) -> impl Future<Output = Result<()>> + Send;
}

/// Creates sessions for the pool
pub trait SessionFactory: Send + Sync {
    type Session: ManagedSession;

    fn create(
        &self,
        id: &str,
        fingerprint: &Fingerprint,
    ) -> impl Future<Output = Result<Self::Session>> + Send;
}

// =============================================================================
// Pool
// =============================================================================

pub struct SessionPool<F: SessionFactory> {
    factory: F,
    sessions: RwLock<HashMap<String, Arc<F::Session>>>,
}

impl<F: SessionFactory> SessionPool<F> {
    #[must_use]
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Existing session for `id`, or a newly created one
    ///
    /// A failed creation is returned to the caller and nothing is registered.
    pub async fn acquire(&self, id: &str, fingerprint: &Fingerprint) -> Result<Arc<F::Session>> {
        if let Some(session) = self.sessions.read().await.get(id) {
            debug!("Reusing browser session for {id}");
            return Ok(Arc::clone(session));
        }

        let mut sessions = self.sessions.write().await;
        if let Some(session) = sessions.get(id) {
            debug!("Browser session for {id} created by a concurrent caller");
            return Ok(Arc::clone(session));
        }

        info!("Creating browser session for {id}");
        let session = Arc::new(
            self.factory
                .create(id, fingerprint)
                .await
                .with_context(|| format!("Failed to create browser session for {id}"))?,
        );
        sessions.insert(id.to_string(), Arc::clone(&session));
        Ok(session)
    }

    /// Close and deregister the session for `id`; `false` if there was none
    pub async fn release(&self, id: &str) -> Result<bool> {
        let removed = self.sessions.write().await.remove(id);
        let Some(session) = removed else {
            return Ok(false);
        };
        info!("Releasing browser session for {id}");
        session
            .close()
            .await
            .with_context(|| format!("Failed to close browser session for {id}"))?;
        Ok(true)
    }

    /// Close and deregister every session; returns how many were released
    ///
    /// A session that fails to close is logged and still deregistered.
    pub async fn release_all(&self) -> usize {
        let drained: Vec<_> = self.sessions.write().await.drain().collect();
        let count = drained.len();
        for (id, session) in drained {
            if let Err(e) = session.close().await {
                warn!("Failed to close browser session for {id}: {e:#}");
            }
        }
        if count > 0 {
            info!("Released {count} browser sessions");
        }
        count
    }

    pub async fn session_ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.sessions.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.sessions.read().await.contains_key(id)
    }
}

// =============================================================================
// Chromium sessions
// =============================================================================

/// One Chromium process with a single tab
#[derive(Debug)]
pub struct BrowserSession {
    id: String,
    browser: Mutex<Browser>,
    page: Page,
    handler: JoinHandle<()>,
    profile_dir: PathBuf,
    settings: RenderSettings,
}

impl BrowserSession {
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn page(&self) -> &Page {
        &self.page
    }

    #[must_use]
    pub fn profile_dir(&self) -> &Path {
        &self.profile_dir
    }

    #[must_use]
    pub fn render_settings(&self) -> RenderSettings {
        self.settings
    }
}

impl ManagedSession for BrowserSession {
    async fn close(&self) -> Result<()> {
        let mut browser = self.browser.lock().await;
        if let Err(e) = browser.close().await {
            warn!("Browser close for {} failed: {e}", self.id);
        }
        if let Err(e) = browser.wait().await {
            warn!("Waiting for browser {} to exit failed: {e}", self.id);
        }
        self.handler.abort();
        info!("Browser session {} closed", self.id);
        Ok(())
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

/// Launches Chromium sessions with persistent per-identifier profiles
#[derive(Debug, Clone)]
pub struct ChromeSessionFactory {
    profile_root: PathBuf,
    headless: bool,
    request_timeout: Duration,
    settings: RenderSettings,
}

impl ChromeSessionFactory {
    #[must_use]
    pub fn from_config(config: &MirrorConfig) -> Self {
        Self {
            profile_root: config.profile_root().clone(),
            headless: config.headless(),
            request_timeout: Duration::from_secs(config.navigation_timeout_secs()),
            settings: RenderSettings::from_config(config),
        }
    }
}

impl SessionFactory for ChromeSessionFactory {
    type Session = BrowserSession;

    async fn create(&self, id: &str, fingerprint: &Fingerprint) -> Result<BrowserSession> {
        let profile_dir = persistent_profile_dir(&self.profile_root, id)?;

        let (mut browser, handler) = launch_browser(LaunchOptions {
            headless: self.headless,
            profile_dir: &profile_dir,
            fingerprint,
            request_timeout: self.request_timeout,
        })
        .await?;

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                let _ = browser.close().await;
                handler.abort();
                return Err(e).context("Failed to open browser tab");
            }
        };

        if let Err(e) = install_stealth_script(&page, fingerprint).await {
            warn!("Continuing without stealth script for {id}: {e:#}");
        }

        Ok(BrowserSession {
            id: id.to_string(),
            browser: Mutex::new(browser),
            page,
            handler,
            profile_dir,
            settings: self.settings,
        })
    }
}
