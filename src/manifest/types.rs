//! Resource records and the categorized manifest

use serde::{Deserialize, Serialize};
use std::fmt;

use super::dedup::deduplicate;

/// Network resource type captured during a page load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Script,
    Stylesheet,
    Image,
    Media,
}

impl ResourceKind {
    /// Manifest category this kind is filed under
    #[must_use]
    pub fn category(self) -> ResourceCategory {
        match self {
            Self::Script => ResourceCategory::Script,
            Self::Stylesheet => ResourceCategory::Css,
            Self::Image => ResourceCategory::Image,
            Self::Media => ResourceCategory::Video,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Script => write!(f, "script"),
            Self::Stylesheet => write!(f, "stylesheet"),
            Self::Image => write!(f, "image"),
            Self::Media => write!(f, "media"),
        }
    }
}

/// One resource response observed while a page loaded
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceRecord {
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    pub url: String,
}

impl ResourceRecord {
    pub fn new(kind: ResourceKind, url: impl Into<String>) -> Self {
        Self {
            kind,
            url: url.into(),
        }
    }
}

/// Manifest partition; also the download progress channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceCategory {
    Css,
    Script,
    Image,
    Video,
    Dom,
}

impl ResourceCategory {
    /// Download order: assets first, pages last
    pub const ALL: [Self; 5] = [Self::Css, Self::Script, Self::Image, Self::Video, Self::Dom];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Css => "css",
            Self::Script => "script",
            Self::Image => "image",
            Self::Video => "video",
            Self::Dom => "dom",
        }
    }

    /// Name of the progress channel, e.g. `download:css`
    #[must_use]
    pub fn event_channel(self) -> &'static str {
        match self {
            Self::Css => "download:css",
            Self::Script => "download:script",
            Self::Image => "download:image",
            Self::Video => "download:video",
            Self::Dom => "download:dom",
        }
    }
}

impl fmt::Display for ResourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deduplicated crawl output, partitioned by category
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceManifest {
    pub script: Vec<String>,
    pub css: Vec<String>,
    pub image: Vec<String>,
    pub video: Vec<String>,
    /// Visited pages
    pub dom: Vec<String>,
}

impl ResourceManifest {
    /// Build a manifest from a crawl: both dedup passes, then categorization
    ///
    /// First-seen order is kept within every category.
    #[must_use]
    pub fn from_crawl(visited: Vec<String>, records: &[ResourceRecord]) -> Self {
        let mut manifest = Self {
            dom: visited,
            ..Self::default()
        };

        for record in deduplicate(records) {
            let bucket = match record.kind.category() {
                ResourceCategory::Css => &mut manifest.css,
                ResourceCategory::Script => &mut manifest.script,
                ResourceCategory::Image => &mut manifest.image,
                ResourceCategory::Video => &mut manifest.video,
                ResourceCategory::Dom => &mut manifest.dom,
            };
            bucket.push(record.url);
        }

        manifest
    }

    #[must_use]
    pub fn entries(&self, category: ResourceCategory) -> &[String] {
        match category {
            ResourceCategory::Css => &self.css,
            ResourceCategory::Script => &self.script,
            ResourceCategory::Image => &self.image,
            ResourceCategory::Video => &self.video,
            ResourceCategory::Dom => &self.dom,
        }
    }

    /// Total number of entries across all categories
    #[must_use]
    pub fn len(&self) -> usize {
        ResourceCategory::ALL
            .iter()
            .map(|c| self.entries(*c).len())
            .sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
