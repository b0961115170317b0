//! Site mirroring facade
//!
//! `SiteMirror` ties the session pool, the crawl frontier and the download
//! executor together behind the two external operations: collect a site's
//! resource manifest, and download a manifest into the mirror tree.

use dashmap::DashMap;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::browser_pool::{ChromeSessionFactory, SessionFactory, SessionPool};
use crate::config::MirrorConfig;
use crate::crawl_engine::{
    CrawlReport, MirrorError, MirrorResult, PageRenderer, crawl_origin, crawl_site,
};
use crate::downloader::{DownloadExecutor, DownloadReport};
use crate::manifest::ResourceManifest;
use crate::mirror_events::MirrorEventBus;
use crate::utils::host_with_port;

/// Result of a full crawl-then-download run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorSummary {
    pub crawl: CrawlReport,
    pub manifest: ResourceManifest,
    pub download: DownloadReport,
}

/// Site identifier used for the session pool and profile directory
pub fn site_id(raw_url: &str) -> MirrorResult<String> {
    let origin = crawl_origin(raw_url)?;
    host_with_port(&origin).ok_or_else(|| MirrorError::InvalidUrl(format!("{raw_url}: no host")))
}

pub struct SiteMirror<F: SessionFactory = ChromeSessionFactory> {
    config: MirrorConfig,
    pool: SessionPool<F>,
    executor: DownloadExecutor,
    event_bus: Option<Arc<MirrorEventBus>>,
    /// One crawl per site at a time; the run owns the site's session
    site_runs: DashMap<String, Arc<Mutex<()>>>,
}

impl SiteMirror<ChromeSessionFactory> {
    /// Mirror backed by locally launched Chromium sessions
    pub fn new(config: MirrorConfig) -> MirrorResult<Self> {
        let factory = ChromeSessionFactory::from_config(&config);
        Self::with_factory(config, factory)
    }
}

impl<F: SessionFactory> SiteMirror<F> {
    pub fn with_factory(config: MirrorConfig, factory: F) -> MirrorResult<Self> {
        let executor =
            DownloadExecutor::new(&config).map_err(|e| MirrorError::Config(format!("{e:#}")))?;
        Ok(Self {
            config,
            pool: SessionPool::new(factory),
            executor,
            event_bus: None,
            site_runs: DashMap::new(),
        })
    }

    /// Publish crawl and download progress to `bus`
    #[must_use]
    pub fn with_event_bus(mut self, bus: Arc<MirrorEventBus>) -> Self {
        self.event_bus = Some(bus);
        self
    }

    #[must_use]
    pub fn config(&self) -> &MirrorConfig {
        &self.config
    }

    #[must_use]
    pub fn pool(&self) -> &SessionPool<F> {
        &self.pool
    }

    #[must_use]
    pub fn executor(&self) -> &DownloadExecutor {
        &self.executor
    }

    #[must_use]
    pub fn event_bus(&self) -> Option<&Arc<MirrorEventBus>> {
        self.event_bus.as_ref()
    }

    /// Download a manifest; the report's `success()` is the run's boolean result
    pub async fn download_site(
        &self,
        origin_url: &str,
        manifest: &ResourceManifest,
        cancel: &CancellationToken,
    ) -> MirrorResult<DownloadReport> {
        Ok(self
            .executor
            .download_site(origin_url, manifest, cancel, self.event_bus.as_ref())
            .await?)
    }

    /// `download_site` reduced to its boolean contract
    pub async fn download_site_ok(
        &self,
        origin_url: &str,
        manifest: &ResourceManifest,
        cancel: &CancellationToken,
    ) -> bool {
        match self.download_site(origin_url, manifest, cancel).await {
            Ok(report) => report.success(),
            Err(e) => {
                warn!("Download of {origin_url} not started: {e}");
                false
            }
        }
    }

    /// Close every pooled browser session
    pub async fn shutdown(&self) -> usize {
        self.pool.release_all().await
    }
}

impl<F> SiteMirror<F>
where
    F: SessionFactory,
    F::Session: PageRenderer,
{
    /// Crawl the site of `raw_url` and return its deduplicated manifest
    pub async fn get_resources(
        &self,
        raw_url: &str,
        cancel: &CancellationToken,
    ) -> MirrorResult<ResourceManifest> {
        let report = self.get_resources_with_report(raw_url, cancel).await?;
        if report.cancelled {
            return Err(MirrorError::Cancelled);
        }
        Ok(report.manifest())
    }

    /// Crawl the site of `raw_url`, keeping per-page faults
    ///
    /// Runs for the same site are serialized: a run holds the site's session
    /// exclusively and releases it when the crawl ends, whether it drained,
    /// was cancelled or failed. A waiting run then starts on a fresh session.
    pub async fn get_resources_with_report(
        &self,
        raw_url: &str,
        cancel: &CancellationToken,
    ) -> MirrorResult<CrawlReport> {
        let id = site_id(raw_url)?;

        let run_lock = self.run_lock(&id);
        let result = {
            let guard = tokio::select! {
                () = cancel.cancelled() => None,
                guard = run_lock.lock() => Some(guard),
            };
            if guard.is_some() {
                self.crawl_exclusive(&id, raw_url, cancel).await
            } else {
                Err(MirrorError::Cancelled)
            }
        };
        drop(run_lock);
        self.site_runs
            .remove_if(&id, |_, lock| Arc::strong_count(lock) == 1);

        result
    }

    fn run_lock(&self, id: &str) -> Arc<Mutex<()>> {
        let lock = self.site_runs.entry(id.to_string()).or_default().value().clone();
        if lock.try_lock().is_err() {
            debug!("Waiting for the running crawl of {id} to finish");
        }
        lock
    }

    /// Crawl with the site's session; the caller holds the site's run lock
    async fn crawl_exclusive(
        &self,
        id: &str,
        raw_url: &str,
        cancel: &CancellationToken,
    ) -> MirrorResult<CrawlReport> {
        let session = tokio::select! {
            () = cancel.cancelled() => return Err(MirrorError::Cancelled),
            session = self.pool.acquire(id, self.config.fingerprint()) => {
                session.map_err(|e| MirrorError::Browser(format!("{e:#}")))?
            }
        };

        let result = crawl_site(
            session.as_ref(),
            raw_url,
            self.config.max_pages(),
            cancel,
            self.event_bus.as_ref(),
        )
        .await;

        drop(session);
        if let Err(e) = self.pool.release(id).await {
            warn!("Failed to release session {id}: {e:#}");
        }

        result
    }

    /// Crawl, then download everything the crawl found
    pub async fn mirror_site(
        &self,
        raw_url: &str,
        cancel: &CancellationToken,
    ) -> MirrorResult<MirrorSummary> {
        let crawl = self.get_resources_with_report(raw_url, cancel).await?;
        if crawl.cancelled {
            return Err(MirrorError::Cancelled);
        }

        let manifest = crawl.manifest();
        info!(
            "Manifest for {}: {} css, {} script, {} image, {} video, {} pages",
            crawl.origin,
            manifest.css.len(),
            manifest.script.len(),
            manifest.image.len(),
            manifest.video.len(),
            manifest.dom.len()
        );

        let download = self.download_site(&crawl.origin, &manifest, cancel).await?;
        Ok(MirrorSummary {
            crawl,
            manifest,
            download,
        })
    }
}
