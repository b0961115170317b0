//! Download policy for cross-domain resources
//!
//! `DownloadOptions` is supplied by the caller and stays immutable for the
//! duration of a run. It decides whether a resource hosted on a different
//! host than the page referencing it is fetched (and its reference rewritten)
//! or left as an absolute URL. Same-host resources are always fetched.
//!
//! The JSON shape matches the policy object exchanged with the desktop shell:
//!
//! ```json
//! {
//!   "mode": "custom",
//!   "customDomains": ["cdn.example.com"],
//!   "skipLargeFiles": true,
//!   "maxFileSize": 10,
//!   "downloadExternalCSS": true,
//!   "downloadExternalJS": false,
//!   "downloadExternalImages": true,
//!   "downloadExternalVideos": false
//! }
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

use crate::manifest::ResourceCategory;
use crate::utils::constants::DEFAULT_MAX_FILE_SIZE_MB;

/// Which cross-domain resources a run may fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum DownloadMode {
    /// Only resources on the page's own host
    #[default]
    #[serde(rename = "same-domain")]
    SameDomain,
    /// Any host, filtered by the per-type external flags
    #[serde(rename = "all-resources")]
    AllResources,
    /// Hosts in `custom_domains`, filtered by the per-type external flags
    #[serde(rename = "custom")]
    Custom,
}

impl DownloadMode {
    /// Parse a mode string; unknown values fall back to `SameDomain`
    #[must_use]
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim() {
            "all-resources" => Self::AllResources,
            "custom" => Self::Custom,
            "same-domain" => Self::SameDomain,
            other => {
                log::warn!("Unknown download mode {other:?}, using same-domain");
                Self::SameDomain
            }
        }
    }
}

impl<'de> Deserialize<'de> for DownloadMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse_lenient(&raw))
    }
}

/// Download policy object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DownloadOptions {
    pub mode: DownloadMode,
    /// External hosts allowed in `Custom` mode
    pub custom_domains: Vec<String>,
    pub skip_large_files: bool,
    /// Size-skip threshold in megabytes
    pub max_file_size: u64,
    #[serde(rename = "downloadExternalCSS")]
    pub download_external_css: bool,
    #[serde(rename = "downloadExternalJS")]
    pub download_external_js: bool,
    pub download_external_images: bool,
    pub download_external_videos: bool,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            mode: DownloadMode::SameDomain,
            custom_domains: Vec::new(),
            skip_large_files: true,
            max_file_size: DEFAULT_MAX_FILE_SIZE_MB,
            download_external_css: false,
            download_external_js: false,
            download_external_images: false,
            download_external_videos: false,
        }
    }
}

impl DownloadOptions {
    /// Parse a policy from JSON, falling back to defaults on any error
    #[must_use]
    pub fn from_json_lenient(text: &str) -> Self {
        if text.trim().is_empty() {
            return Self::default();
        }
        match serde_json::from_str(text) {
            Ok(options) => options,
            Err(e) => {
                log::warn!("Unparseable download options, using defaults: {e}");
                Self::default()
            }
        }
    }

    /// Load a policy file, falling back to defaults if it is missing or invalid
    #[must_use]
    pub fn load_or_default(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_json_lenient(&text),
            Err(e) => {
                log::warn!(
                    "Could not read download options from {}, using defaults: {e}",
                    path.display()
                );
                Self::default()
            }
        }
    }

    /// Whether a resource on `resource_host` referenced from `base_host` is fetched
    ///
    /// Hosts are compared including their port.
    #[must_use]
    pub fn should_fetch(
        &self,
        resource_host: &str,
        base_host: &str,
        category: ResourceCategory,
    ) -> bool {
        if resource_host.eq_ignore_ascii_case(base_host) {
            return true;
        }

        match self.mode {
            DownloadMode::SameDomain => false,
            DownloadMode::AllResources => self.is_category_enabled(category),
            DownloadMode::Custom => {
                self.is_custom_domain(resource_host) && self.is_category_enabled(category)
            }
        }
    }

    /// Per-type external fetch flag; categories without a flag are always enabled
    #[must_use]
    pub fn is_category_enabled(&self, category: ResourceCategory) -> bool {
        match category {
            ResourceCategory::Css => self.download_external_css,
            ResourceCategory::Script => self.download_external_js,
            ResourceCategory::Image => self.download_external_images,
            ResourceCategory::Video => self.download_external_videos,
            ResourceCategory::Dom => true,
        }
    }

    fn is_custom_domain(&self, resource_host: &str) -> bool {
        let bare_host = resource_host
            .rsplit_once(':')
            .filter(|(_, port)| port.chars().all(|c| c.is_ascii_digit()))
            .map_or(resource_host, |(host, _)| host);

        self.custom_domains.iter().map(|d| d.trim()).any(|domain| {
            domain.eq_ignore_ascii_case(resource_host) || domain.eq_ignore_ascii_case(bare_host)
        })
    }

    /// Size-skip threshold in bytes, `None` when large files are allowed
    #[must_use]
    pub fn max_file_size_bytes(&self) -> Option<u64> {
        (self.skip_large_files && self.max_file_size > 0)
            .then(|| self.max_file_size.saturating_mul(1024 * 1024))
    }
}
