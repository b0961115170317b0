//! Getter methods for `MirrorConfig`
//!
//! This module provides all the accessor methods for retrieving configuration
//! values from a `MirrorConfig` instance.

use std::path::PathBuf;
use std::time::Duration;

use super::download_options::DownloadOptions;
use super::types::{Fingerprint, MirrorConfig};

impl MirrorConfig {
    #[must_use]
    pub fn mirror_root(&self) -> &PathBuf {
        &self.mirror_root
    }

    #[must_use]
    pub fn profile_root(&self) -> &PathBuf {
        &self.profile_root
    }

    #[must_use]
    pub fn headless(&self) -> bool {
        self.headless
    }

    #[must_use]
    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    #[must_use]
    pub fn navigation_timeout_secs(&self) -> u64 {
        self.navigation_timeout_secs
    }

    #[must_use]
    pub fn load_timeout_secs(&self) -> u64 {
        self.load_timeout_secs
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    #[must_use]
    pub fn retry_backoff_unit(&self) -> Duration {
        self.retry_backoff_unit
    }

    #[must_use]
    pub fn download_concurrency(&self) -> usize {
        self.download_concurrency
    }

    #[must_use]
    pub fn collector_capacity(&self) -> usize {
        self.collector_capacity
    }

    #[must_use]
    pub fn max_pages(&self) -> Option<usize> {
        self.max_pages
    }

    #[must_use]
    pub fn download_options(&self) -> &DownloadOptions {
        &self.download_options
    }
}
