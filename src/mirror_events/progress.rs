//! Log-based progress display for a bus subscriber

use log::{info, warn};
use tokio::sync::broadcast::{self, error::RecvError};

use super::types::MirrorEvent;
use crate::downloader::DownloadOutcome;

/// What a progress subscriber saw before the bus closed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressTally {
    pub received: usize,
    /// Events overwritten before they could be read
    pub skipped: u64,
}

/// Log every event from `events` until the bus is dropped
///
/// Falling behind the bus skips the overwritten events and keeps going.
pub async fn log_progress(mut events: broadcast::Receiver<MirrorEvent>) -> ProgressTally {
    let mut tally = ProgressTally::default();
    loop {
        match events.recv().await {
            Ok(event) => {
                tally.received += 1;
                log_event(&event);
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!("Progress display fell behind, {skipped} events skipped");
                tally.skipped += skipped;
            }
            Err(RecvError::Closed) => break,
        }
    }
    tally
}

fn log_event(event: &MirrorEvent) {
    match event {
        MirrorEvent::CrawlStarted { origin, .. } => info!("crawling {origin}"),
        MirrorEvent::PageVisited { url, resources, .. } => {
            info!("page {url} ({resources} resources)");
        }
        MirrorEvent::PageFailed { url, error, .. } => warn!("page {url} failed: {error}"),
        MirrorEvent::CrawlCompleted {
            pages_visited,
            page_faults,
            ..
        } => info!("crawl finished: {pages_visited} pages, {page_faults} faults"),
        MirrorEvent::DownloadProgress {
            index, url, outcome, ..
        } => {
            let status = match outcome {
                DownloadOutcome::Fetched { .. } => "fetched",
                DownloadOutcome::AlreadyPresent { .. } => "present",
                DownloadOutcome::PolicyDenied => "not fetched (policy)",
                DownloadOutcome::TooLarge => "too large",
                DownloadOutcome::Failed { .. } => "failed",
                DownloadOutcome::Cancelled => "cancelled",
            };
            if outcome.is_failure() {
                warn!("{} #{index} {url}: {status}", event.channel());
            } else {
                info!("{} #{index} {url}: {status}", event.channel());
            }
        }
        MirrorEvent::DownloadCompleted {
            fetched,
            skipped,
            failed,
            ..
        } => info!("downloads finished: {fetched} fetched, {skipped} skipped, {failed} failed"),
    }
}
