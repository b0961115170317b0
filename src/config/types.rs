//! Core configuration types for site mirroring
//!
//! This module contains the main `MirrorConfig` struct and the browser
//! fingerprint types that parameterize every launched session.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::download_options::DownloadOptions;
use crate::utils::constants::{DEFAULT_LANG, DEFAULT_WINDOW_HEIGHT, DEFAULT_WINDOW_WIDTH};

/// Main configuration struct for mirroring runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorConfig {
    /// Root directory that every mirrored host lives under.
    ///
    /// **INVARIANT:** Always an absolute path (normalized in builder).
    pub(crate) mirror_root: PathBuf,
    /// Directory holding one persistent browser profile per site identifier.
    pub(crate) profile_root: PathBuf,
    pub(crate) headless: bool,
    pub(crate) fingerprint: Fingerprint,
    pub(crate) navigation_timeout_secs: u64,
    pub(crate) load_timeout_secs: u64,
    pub(crate) request_timeout_secs: u64,
    pub(crate) max_retries: u32,
    /// One unit of linear backoff; attempt `n` waits `n` units.
    pub(crate) retry_backoff_unit: Duration,
    pub(crate) download_concurrency: usize,
    pub(crate) collector_capacity: usize,
    pub(crate) max_pages: Option<usize>,
    pub(crate) download_options: DownloadOptions,
}

/// Browser window dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: DEFAULT_WINDOW_WIDTH,
            height: DEFAULT_WINDOW_HEIGHT,
        }
    }
}

/// Identity a browser session presents to the sites it visits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Fingerprint {
    /// Candidate window sizes; the first one is used for launch.
    pub viewports: Vec<Viewport>,
    /// Proxy server passed to `--proxy-server`.
    pub proxy: Option<String>,
    /// Browser UI and `Accept-Language` locale.
    pub lang: String,
}

impl Default for Fingerprint {
    fn default() -> Self {
        Self {
            viewports: vec![Viewport::default()],
            proxy: None,
            lang: DEFAULT_LANG.to_string(),
        }
    }
}

impl Fingerprint {
    /// Window size used when launching the browser
    #[must_use]
    pub fn primary_viewport(&self) -> Viewport {
        self.viewports.first().copied().unwrap_or_default()
    }

    /// `navigator.languages` value derived from `lang`, e.g. `["en-US", "en"]`
    #[must_use]
    pub fn languages(&self) -> Vec<String> {
        let mut langs = vec![self.lang.clone()];
        if let Some((base, _)) = self.lang.split_once('-')
            && !base.is_empty()
        {
            langs.push(base.to_string());
        }
        langs
    }
}
