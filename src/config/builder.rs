//! Type-safe builder for `MirrorConfig` using the typestate pattern
//!
//! This module provides a fluent builder interface with compile-time validation
//! ensuring that the mirror root is set before building a `MirrorConfig`.

use anyhow::{Context, Result, anyhow};
use std::marker::PhantomData;
use std::path::PathBuf;
use std::time::Duration;

use super::download_options::DownloadOptions;
use super::types::{Fingerprint, MirrorConfig};
use crate::utils::{
    DEFAULT_COLLECTOR_CAPACITY, DEFAULT_DOWNLOAD_CONCURRENCY, DEFAULT_LOAD_TIMEOUT_SECS,
    DEFAULT_MAX_RETRIES, DEFAULT_NAVIGATION_TIMEOUT_SECS, DEFAULT_REQUEST_TIMEOUT_SECS,
    DEFAULT_RETRY_BACKOFF_UNIT_MS,
};

// Type states for the builder
pub struct WithMirrorRoot;

pub struct MirrorConfigBuilder<State = ()> {
    pub(crate) mirror_root: Option<PathBuf>,
    pub(crate) profile_root: Option<PathBuf>,
    pub(crate) headless: bool,
    pub(crate) fingerprint: Fingerprint,
    pub(crate) navigation_timeout_secs: u64,
    pub(crate) load_timeout_secs: u64,
    pub(crate) request_timeout_secs: u64,
    pub(crate) max_retries: u32,
    pub(crate) retry_backoff_unit: Duration,
    pub(crate) download_concurrency: usize,
    pub(crate) collector_capacity: usize,
    pub(crate) max_pages: Option<usize>,
    pub(crate) download_options: DownloadOptions,
    pub(crate) _phantom: PhantomData<State>,
}

impl Default for MirrorConfigBuilder<()> {
    fn default() -> Self {
        Self {
            mirror_root: None,
            profile_root: None,
            headless: true,
            fingerprint: Fingerprint::default(),
            navigation_timeout_secs: DEFAULT_NAVIGATION_TIMEOUT_SECS,
            load_timeout_secs: DEFAULT_LOAD_TIMEOUT_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff_unit: Duration::from_millis(DEFAULT_RETRY_BACKOFF_UNIT_MS),
            download_concurrency: DEFAULT_DOWNLOAD_CONCURRENCY,
            collector_capacity: DEFAULT_COLLECTOR_CAPACITY,
            max_pages: None,
            download_options: DownloadOptions::default(),
            _phantom: PhantomData,
        }
    }
}

impl MirrorConfig {
    /// Create a builder for configuring a `MirrorConfig` with a fluent interface
    #[must_use]
    pub fn builder() -> MirrorConfigBuilder<()> {
        MirrorConfigBuilder::default()
    }
}

impl MirrorConfigBuilder<()> {
    pub fn mirror_root(self, dir: impl Into<PathBuf>) -> MirrorConfigBuilder<WithMirrorRoot> {
        MirrorConfigBuilder {
            mirror_root: Some(dir.into()),
            profile_root: self.profile_root,
            headless: self.headless,
            fingerprint: self.fingerprint,
            navigation_timeout_secs: self.navigation_timeout_secs,
            load_timeout_secs: self.load_timeout_secs,
            request_timeout_secs: self.request_timeout_secs,
            max_retries: self.max_retries,
            retry_backoff_unit: self.retry_backoff_unit,
            download_concurrency: self.download_concurrency,
            collector_capacity: self.collector_capacity,
            max_pages: self.max_pages,
            download_options: self.download_options,
            _phantom: PhantomData,
        }
    }
}

impl MirrorConfigBuilder<WithMirrorRoot> {
    pub fn build(self) -> Result<MirrorConfig> {
        let mirror_root = self
            .mirror_root
            .ok_or_else(|| anyhow!("mirror_root is required"))?;
        let mirror_root = if mirror_root.is_absolute() {
            mirror_root
        } else {
            std::env::current_dir()
                .context("Failed to resolve current directory for mirror_root")?
                .join(mirror_root)
        };

        if self.max_retries == 0 {
            return Err(anyhow!("max_retries must be at least 1"));
        }
        if self.download_concurrency == 0 {
            return Err(anyhow!("download_concurrency must be at least 1"));
        }
        if self.collector_capacity == 0 {
            return Err(anyhow!("collector_capacity must be at least 1"));
        }

        let profile_root = self.profile_root.unwrap_or_else(default_profile_root);

        Ok(MirrorConfig {
            mirror_root,
            profile_root,
            headless: self.headless,
            fingerprint: self.fingerprint,
            navigation_timeout_secs: self.navigation_timeout_secs,
            load_timeout_secs: self.load_timeout_secs,
            request_timeout_secs: self.request_timeout_secs,
            max_retries: self.max_retries,
            retry_backoff_unit: self.retry_backoff_unit,
            download_concurrency: self.download_concurrency,
            collector_capacity: self.collector_capacity,
            max_pages: self.max_pages,
            download_options: self.download_options,
        })
    }
}

/// Persistent per-user location for session profiles
fn default_profile_root() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("kodegen_sitemirror")
        .join("profiles")
}
