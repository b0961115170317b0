//! Crawl frontier loop
//!
//! Drains the frontier one page at a time: pop a URL (marking it visited),
//! render it, keep its resource records, offer its same-site links. A failed
//! page is recorded as a fault and the loop carries on. Cancellation is
//! checked between pages and raced against every render.

use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use url::Url;

use super::crawl_types::{CrawlReport, MirrorError, MirrorResult, PageFault};
use super::frontier::CrawlFrontier;
use super::link_processor::extract_same_site_links;
use super::renderer::PageRenderer;
use crate::mirror_events::bus::emit;
use crate::mirror_events::{MirrorEvent, MirrorEventBus};
use crate::utils::{normalize_start_url, origin_of};

/// Seed URL of a crawl: scheme + host[:port] of the input, with a root path
pub fn crawl_origin(raw_url: &str) -> MirrorResult<Url> {
    let normalized = normalize_start_url(raw_url);
    let parsed = Url::parse(&normalized)
        .map_err(|e| MirrorError::InvalidUrl(format!("{raw_url}: {e}")))?;
    let origin = origin_of(&parsed)
        .ok_or_else(|| MirrorError::InvalidUrl(format!("{raw_url}: no host")))?;
    Url::parse(&origin).map_err(|e| MirrorError::InvalidUrl(format!("{origin}: {e}")))
}

/// Crawl every same-site page reachable from the origin of `start_url`
pub async fn crawl_site<R: PageRenderer>(
    renderer: &R,
    start_url: &str,
    max_pages: Option<usize>,
    cancel: &CancellationToken,
    bus: Option<&Arc<MirrorEventBus>>,
) -> MirrorResult<CrawlReport> {
    let origin = crawl_origin(start_url)?;
    let started = Instant::now();
    let mut frontier = CrawlFrontier::seeded(origin.as_str());
    let mut report = CrawlReport {
        origin: origin.as_str().trim_end_matches('/').to_string(),
        ..CrawlReport::default()
    };

    info!("Starting crawl of {} from {start_url}", report.origin);
    emit(
        bus,
        MirrorEvent::crawl_started(start_url.to_string(), report.origin.clone()),
    )
    .await;

    while !frontier.is_drained() {
        if cancel.is_cancelled() {
            report.cancelled = true;
            break;
        }
        if let Some(limit) = max_pages
            && frontier.visited().len() >= limit
        {
            let dropped = frontier.discard_pending();
            info!("Page limit {limit} reached, {dropped} pending URLs dropped");
            report.truncated = true;
            break;
        }
        let Some(url) = frontier.next() else {
            break;
        };
        debug!(target: "sitemirror::frontier", "Visiting {url}");

        let rendered = tokio::select! {
            () = cancel.cancelled() => {
                report.cancelled = true;
                break;
            }
            rendered = renderer.render(&url) => rendered,
        };

        match rendered {
            Ok(page) => {
                let resources = page.resources.len();
                report.records.extend(page.resources);

                let links = extract_same_site_links(&page.html, &origin);
                let discovered = links.len();
                let mut queued = 0;
                for link in links {
                    if frontier.offer(link) {
                        queued += 1;
                    }
                }
                debug!(
                    target: "sitemirror::frontier",
                    "{url}: {resources} resources, {discovered} links, {queued} new"
                );
                emit(bus, MirrorEvent::page_visited(url, resources, discovered)).await;
            }
            Err(e) => {
                let error = format!("{e:#}");
                warn!(target: "sitemirror::frontier", "Page {url} failed: {error}");
                report.faults.push(PageFault {
                    url: url.clone(),
                    error: error.clone(),
                });
                emit(bus, MirrorEvent::page_failed(url, error)).await;
            }
        }
    }

    report.visited = frontier.into_visited();
    report.duration = started.elapsed();

    info!(
        "Crawl of {} finished: {} pages, {} faults, {} resource records{}",
        report.origin,
        report.visited.len(),
        report.faults.len(),
        report.records.len(),
        if report.cancelled { " (cancelled)" } else { "" }
    );
    emit(
        bus,
        MirrorEvent::crawl_completed(
            report.visited.len(),
            report.faults.len(),
            report.records.len(),
            report.cancelled,
            report.duration,
        ),
    )
    .await;

    Ok(report)
}
