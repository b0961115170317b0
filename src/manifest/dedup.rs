//! Two-pass resource deduplication
//!
//! Both passes are pure: the input slice is never modified and the output
//! keeps the first occurrence of every key in discovery order.

use std::collections::HashSet;

use super::types::{ResourceKind, ResourceRecord};
use crate::utils::strip_query;

/// Keep the first occurrence of each exact `(type, url)` pair
#[must_use]
pub fn dedup_exact(records: &[ResourceRecord]) -> Vec<ResourceRecord> {
    let mut seen: HashSet<(ResourceKind, &str)> = HashSet::with_capacity(records.len());
    records
        .iter()
        .filter(|r| seen.insert((r.kind, r.url.as_str())))
        .cloned()
        .collect()
}

/// Keep the first occurrence of each `(type, url-without-query)` pair
///
/// The retained record keeps its original URL, query included.
#[must_use]
pub fn dedup_ignoring_query(records: &[ResourceRecord]) -> Vec<ResourceRecord> {
    let mut seen: HashSet<(ResourceKind, String)> = HashSet::with_capacity(records.len());
    records
        .iter()
        .filter(|r| seen.insert((r.kind, strip_query(&r.url))))
        .cloned()
        .collect()
}

/// Exact pass followed by the query-insensitive pass
#[must_use]
pub fn deduplicate(records: &[ResourceRecord]) -> Vec<ResourceRecord> {
    dedup_ignoring_query(&dedup_exact(records))
}
