//! Event type definitions for the mirror event system
//!
//! Download progress events map one-to-one onto the external progress
//! channels (`download:css`, `download:script`, ...) with the per-category
//! sequence index as payload.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::downloader::DownloadOutcome;
use crate::manifest::ResourceCategory;

/// Event types emitted while crawling and downloading a site
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MirrorEvent {
    /// Emitted when a crawl starts from `origin`
    CrawlStarted {
        start_url: String,
        origin: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
    /// Emitted after a page rendered and its resources were collected
    PageVisited {
        url: String,
        resources: usize,
        links_discovered: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
    /// Emitted when navigating or reading a page failed; the crawl continues
    PageFailed {
        url: String,
        error: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
    /// Emitted when the frontier drained or the crawl was cancelled
    CrawlCompleted {
        pages_visited: usize,
        page_faults: usize,
        resources: usize,
        cancelled: bool,
        duration: Duration,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
    /// One per manifest entry per category, whatever the outcome
    DownloadProgress {
        category: ResourceCategory,
        index: usize,
        url: String,
        outcome: DownloadOutcome,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
    /// Emitted when every category has been processed
    DownloadCompleted {
        fetched: usize,
        skipped: usize,
        failed: usize,
        cancelled: bool,
        duration: Duration,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

/// Helper functions for creating common events
impl MirrorEvent {
    #[must_use]
    pub fn crawl_started(start_url: String, origin: String) -> Self {
        Self::CrawlStarted {
            start_url,
            origin,
            timestamp: chrono::Utc::now(),
        }
    }

    #[must_use]
    pub fn page_visited(url: String, resources: usize, links_discovered: usize) -> Self {
        Self::PageVisited {
            url,
            resources,
            links_discovered,
            timestamp: chrono::Utc::now(),
        }
    }

    #[must_use]
    pub fn page_failed(url: String, error: String) -> Self {
        Self::PageFailed {
            url,
            error,
            timestamp: chrono::Utc::now(),
        }
    }

    #[must_use]
    pub fn crawl_completed(
        pages_visited: usize,
        page_faults: usize,
        resources: usize,
        cancelled: bool,
        duration: Duration,
    ) -> Self {
        Self::CrawlCompleted {
            pages_visited,
            page_faults,
            resources,
            cancelled,
            duration,
            timestamp: chrono::Utc::now(),
        }
    }

    #[must_use]
    pub fn download_progress(
        category: ResourceCategory,
        index: usize,
        url: String,
        outcome: DownloadOutcome,
    ) -> Self {
        Self::DownloadProgress {
            category,
            index,
            url,
            outcome,
            timestamp: chrono::Utc::now(),
        }
    }

    #[must_use]
    pub fn download_completed(
        fetched: usize,
        skipped: usize,
        failed: usize,
        cancelled: bool,
        duration: Duration,
    ) -> Self {
        Self::DownloadCompleted {
            fetched,
            skipped,
            failed,
            cancelled,
            duration,
            timestamp: chrono::Utc::now(),
        }
    }

    /// External channel name this event is delivered on
    #[must_use]
    pub fn channel(&self) -> &'static str {
        match self {
            Self::CrawlStarted { .. } => "crawl:started",
            Self::PageVisited { .. } => "crawl:page",
            Self::PageFailed { .. } => "crawl:page-failed",
            Self::CrawlCompleted { .. } => "crawl:completed",
            Self::DownloadProgress { category, .. } => category.event_channel(),
            Self::DownloadCompleted { .. } => "download:completed",
        }
    }
}
