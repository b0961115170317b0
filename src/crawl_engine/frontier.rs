//! Crawl frontier: pending worklist plus visited set
//!
//! A URL is in at most one of `pending` and `visited`. `next` moves a URL
//! from one to the other in a single step, and `offer` refuses anything
//! already known, so the frontier shrinks monotonically once the link graph
//! is exhausted.

use std::collections::{HashSet, VecDeque};

#[derive(Debug, Default)]
pub struct CrawlFrontier {
    pending: VecDeque<String>,
    pending_index: HashSet<String>,
    visited: Vec<String>,
    visited_index: HashSet<String>,
}

impl CrawlFrontier {
    #[must_use]
    pub fn seeded(origin: impl Into<String>) -> Self {
        let mut frontier = Self::default();
        frontier.offer(origin);
        frontier
    }

    /// Add a URL unless it is already pending or visited
    pub fn offer(&mut self, url: impl Into<String>) -> bool {
        let url = url.into();
        if self.visited_index.contains(&url) || self.pending_index.contains(&url) {
            return false;
        }
        self.pending_index.insert(url.clone());
        self.pending.push_back(url);
        true
    }

    /// Take the next pending URL and mark it visited
    pub fn next(&mut self) -> Option<String> {
        let url = self.pending.pop_front()?;
        self.pending_index.remove(&url);
        self.visited_index.insert(url.clone());
        self.visited.push(url.clone());
        Some(url)
    }

    #[must_use]
    pub fn is_drained(&self) -> bool {
        self.pending.is_empty()
    }

    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_visited(&self, url: &str) -> bool {
        self.visited_index.contains(url)
    }

    #[must_use]
    pub fn visited(&self) -> &[String] {
        &self.visited
    }

    /// Drop everything still pending; returns how many URLs were discarded
    pub fn discard_pending(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        self.pending_index.clear();
        dropped
    }

    #[must_use]
    pub fn into_visited(self) -> Vec<String> {
        self.visited
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_and_visited_stay_disjoint() {
        let mut frontier = CrawlFrontier::seeded("https://a.com");
        assert!(!frontier.offer("https://a.com"), "duplicate pending accepted");

        let first = frontier.next().unwrap();
        assert!(frontier.is_visited(&first));
        assert!(!frontier.offer(first.clone()), "visited URL re-queued");
        assert!(frontier.offer("https://a.com/about"));
        assert_eq!(frontier.pending_len(), 1);

        frontier.next();
        assert!(frontier.is_drained());
        assert_eq!(frontier.visited(), ["https://a.com", "https://a.com/about"]);
    }

    #[test]
    fn discard_pending_empties_worklist() {
        let mut frontier = CrawlFrontier::seeded("https://a.com");
        frontier.offer("https://a.com/x");
        assert_eq!(frontier.discard_pending(), 2);
        assert!(frontier.is_drained());
        assert!(frontier.offer("https://a.com/x"));
    }
}
