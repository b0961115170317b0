//! Core types for crawl operations.
//!
//! This module contains the error type surfaced by the public mirroring API
//! and the per-run crawl report with its per-page fault list.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::manifest::{ResourceManifest, ResourceRecord};

/// Error type for mirroring operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum MirrorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Mirror operation was cancelled")]
    Cancelled,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Mirror error: {0}")]
    Other(String),
}

impl From<anyhow::Error> for MirrorError {
    fn from(err: anyhow::Error) -> Self {
        // {:#} keeps the whole context chain
        Self::Other(format!("{err:#}"))
    }
}

impl From<crate::downloader::DownloadError> for MirrorError {
    fn from(err: crate::downloader::DownloadError) -> Self {
        match err {
            crate::downloader::DownloadError::InvalidUrl { url, reason } => {
                Self::InvalidUrl(format!("{url}: {reason}"))
            }
            crate::downloader::DownloadError::Cancelled => Self::Cancelled,
            other => Self::Network(other.to_string()),
        }
    }
}

/// Convenience alias for Result with `MirrorError`
pub type MirrorResult<T> = Result<T, MirrorError>;

/// A page whose navigation or extraction failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageFault {
    pub url: String,
    pub error: String,
}

/// Output of one crawl run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrawlReport {
    /// Scheme + host[:port] the crawl was seeded with
    pub origin: String,
    /// Every navigated URL in visit order, failed pages included
    pub visited: Vec<String>,
    /// Resource records from every navigation, in discovery order
    pub records: Vec<ResourceRecord>,
    pub faults: Vec<PageFault>,
    /// True when the run stopped on the cancellation token
    pub cancelled: bool,
    /// True when `max_pages` cut the frontier short
    pub truncated: bool,
    pub duration: Duration,
}

impl CrawlReport {
    /// Deduplicated, categorized manifest of this crawl
    #[must_use]
    pub fn manifest(&self) -> ResourceManifest {
        ResourceManifest::from_crawl(self.visited.clone(), &self.records)
    }

    /// True when every visited page rendered without a fault
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.faults.is_empty() && !self.cancelled
    }
}
