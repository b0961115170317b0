//! Download executor types

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::manifest::ResourceCategory;

/// Failure of a single resource fetch
#[derive(Debug, Clone, thiserror::Error)]
pub enum DownloadError {
    #[error("Invalid resource URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("HTTP status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Transport error for {url}: {message}")]
    Transport { url: String, message: String },

    #[error("Request for {url} timed out")]
    Timeout { url: String },

    #[error("{url} is {size} bytes, over the {limit} byte limit")]
    TooLarge { url: String, size: u64, limit: u64 },

    #[error("I/O error writing {path}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("Download cancelled")]
    Cancelled,

    #[error("Gave up after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: String },
}

impl DownloadError {
    /// Transport failures, timeouts, non-2xx statuses and write errors are retried
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Status { .. } | Self::Transport { .. } | Self::Timeout { .. } | Self::Io { .. }
        )
    }

    pub(crate) fn from_reqwest(url: &str, err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else {
            Self::Transport {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }
}

/// How a fetched body is written to disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    /// Streamed byte-for-byte
    Binary,
    /// Read fully, rewritten, then written; directory-like paths get `index.html`
    Html,
    /// Read fully, `url(...)` references rewritten, then written
    Stylesheet,
}

impl FetchKind {
    #[must_use]
    pub fn for_category(category: ResourceCategory) -> Self {
        match category {
            ResourceCategory::Dom => Self::Html,
            ResourceCategory::Css => Self::Stylesheet,
            ResourceCategory::Script | ResourceCategory::Image | ResourceCategory::Video => {
                Self::Binary
            }
        }
    }

    #[must_use]
    pub fn is_html(self) -> bool {
        self == Self::Html
    }
}

/// Successful fetch of one resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchReport {
    pub path: PathBuf,
    /// Network attempts made; zero when the file already existed
    pub attempts: u32,
    /// Backoff waited before each retry, in order
    pub retry_delays: Vec<Duration>,
    pub skipped_existing: bool,
}

/// Per-entry result published with every progress event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DownloadOutcome {
    Fetched { path: PathBuf },
    AlreadyPresent { path: PathBuf },
    /// Cross-host entry the policy does not fetch
    PolicyDenied,
    TooLarge,
    Failed { error: String },
    Cancelled,
}

impl DownloadOutcome {
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Summary of a `download_site` run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DownloadReport {
    pub fetched: usize,
    /// Entries skipped: already present, denied by policy, or over the size limit
    pub skipped: usize,
    /// `(url, error)` for every entry that failed
    pub failed: Vec<(String, String)>,
    pub cancelled: bool,
    pub duration: Duration,
}

impl DownloadReport {
    /// Boolean result of the run; per-resource failures do not flip it
    #[must_use]
    pub fn success(&self) -> bool {
        !self.cancelled
    }

    pub(crate) fn record(&mut self, url: &str, outcome: &DownloadOutcome) {
        match outcome {
            DownloadOutcome::Fetched { .. } => self.fetched += 1,
            DownloadOutcome::AlreadyPresent { .. }
            | DownloadOutcome::PolicyDenied
            | DownloadOutcome::TooLarge => self.skipped += 1,
            DownloadOutcome::Failed { error } => {
                self.failed.push((url.to_string(), error.clone()));
            }
            DownloadOutcome::Cancelled => self.cancelled = true,
        }
    }
}
