//! Download executor: fetches manifest entries into the mirror tree
//!
//! Binary resources are streamed to disk; HTML documents and stylesheets are
//! read fully and passed through the link rewriter before being written.

pub mod executor;
pub mod site;
pub mod types;

pub use executor::DownloadExecutor;
pub use types::{DownloadError, DownloadOutcome, DownloadReport, FetchKind, FetchReport};
