//! Crawl Engine Module
//!
//! This module drives a single-site crawl: the frontier loop, the
//! per-navigation resource collector, same-site link extraction and the
//! rendering seam to the browser.

// Sub-modules
pub mod crawl_types;
pub mod frontier;
pub mod link_processor;
pub mod orchestrator;
pub mod page_timeout;
pub mod renderer;
pub mod resource_collector;

// Re-exports for public API
pub use crawl_types::{CrawlReport, MirrorError, MirrorResult, PageFault};
pub use frontier::CrawlFrontier;
pub use link_processor::extract_same_site_links;
pub use orchestrator::{crawl_origin, crawl_site};
pub use page_timeout::with_page_timeout;
pub use renderer::{PageRenderer, RenderSettings, RenderedPage};
pub use resource_collector::{NetworkSignal, ResourceBuffer, ResourceCollector};
