//! Builder methods available for all states
//!
//! This module contains methods that can be called on the builder
//! regardless of its current type state.

use std::path::PathBuf;
use std::time::Duration;

use super::builder::MirrorConfigBuilder;
use super::download_options::DownloadOptions;
use super::types::Fingerprint;

impl<State> MirrorConfigBuilder<State> {
    /// Directory that holds one persistent browser profile per site identifier
    #[must_use]
    pub fn profile_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.profile_root = Some(dir.into());
        self
    }

    /// Set browser headless mode (visible vs invisible browser window)
    ///
    /// Headed mode is useful for debugging sites that behave differently
    /// when they detect a headless browser.
    #[must_use]
    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    #[must_use]
    pub fn fingerprint(mut self, fingerprint: Fingerprint) -> Self {
        self.fingerprint = fingerprint;
        self
    }

    #[must_use]
    pub fn navigation_timeout_secs(mut self, secs: u64) -> Self {
        self.navigation_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn load_timeout_secs(mut self, secs: u64) -> Self {
        self.load_timeout_secs = secs;
        self
    }

    /// Per-attempt HTTP timeout for resource downloads
    #[must_use]
    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    /// Maximum number of attempts per resource (must be at least 1)
    #[must_use]
    pub fn max_retries(mut self, attempts: u32) -> Self {
        self.max_retries = attempts;
        self
    }

    /// Length of one linear backoff unit
    ///
    /// Attempt `n` (0-based) is preceded by a wait of `n` units. Tests use a
    /// few milliseconds here to keep retry scenarios fast.
    #[must_use]
    pub fn retry_backoff_unit(mut self, unit: Duration) -> Self {
        self.retry_backoff_unit = unit;
        self
    }

    /// Number of downloads in flight per category
    #[must_use]
    pub fn download_concurrency(mut self, workers: usize) -> Self {
        self.download_concurrency = workers;
        self
    }

    #[must_use]
    pub fn collector_capacity(mut self, capacity: usize) -> Self {
        self.collector_capacity = capacity;
        self
    }

    /// Cap on the number of page navigations per crawl
    #[must_use]
    pub fn max_pages(mut self, limit: Option<usize>) -> Self {
        self.max_pages = limit;
        self
    }

    #[must_use]
    pub fn download_options(mut self, options: DownloadOptions) -> Self {
        self.download_options = options;
        self
    }
}
