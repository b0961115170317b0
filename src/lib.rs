pub mod browser_pool;
pub mod browser_profile;
pub mod browser_setup;
pub mod config;
pub mod crawl_engine;
pub mod downloader;
pub mod link_rewriter;
pub mod manifest;
pub mod mirror;
pub mod mirror_events;
pub mod site_store;
pub mod utils;

pub use browser_pool::{
    BrowserSession, ChromeSessionFactory, ManagedSession, SessionFactory, SessionPool,
};
pub use browser_setup::{find_browser_executable, launch_browser};
pub use config::{DownloadMode, DownloadOptions, Fingerprint, MirrorConfig, Viewport};
pub use crawl_engine::{
    CrawlReport, MirrorError, MirrorResult, PageFault, PageRenderer, RenderedPage, crawl_site,
};
pub use downloader::{DownloadError, DownloadExecutor, DownloadOutcome, DownloadReport};
pub use link_rewriter::{rewrite_css, rewrite_html};
pub use manifest::{ResourceCategory, ResourceKind, ResourceManifest, ResourceRecord};
pub use mirror::{MirrorSummary, SiteMirror, site_id};
pub use mirror_events::{MirrorEvent, MirrorEventBus};
pub use site_store::{MirroredSite, list_mirrored_sites, remove_mirrored_site};
pub use utils::get_mirror_path;

// Re-exported so callers can create and trip run tokens
pub use tokio_util::sync::CancellationToken;
