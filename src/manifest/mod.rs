//! Resource manifest: records, categories and deduplication

pub mod dedup;
pub mod types;

pub use dedup::{dedup_exact, dedup_ignoring_query, deduplicate};
pub use types::{ResourceCategory, ResourceKind, ResourceManifest, ResourceRecord};
