//! Whole-manifest download
//!
//! Categories are processed in `ResourceCategory::ALL` order. Within a
//! category up to `concurrency` fetches run at once, but results are consumed
//! in manifest order so progress indices on each channel are strictly
//! increasing. One progress event is published per entry whatever its
//! outcome.

use futures::StreamExt;
use futures::stream;
use log::{info, warn};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use url::Url;

use super::executor::DownloadExecutor;
use super::types::{DownloadError, DownloadOutcome, DownloadReport, FetchKind};
use crate::manifest::{ResourceCategory, ResourceManifest};
use crate::mirror_events::MirrorEvent;
use crate::mirror_events::MirrorEventBus;
use crate::mirror_events::bus::emit;
use crate::utils::host_with_port;

impl DownloadExecutor {
    /// Download every manifest entry the origin and policy allow
    ///
    /// Fails only when `origin_url` has no usable host; per-resource failures
    /// are collected in the report.
    pub async fn download_site(
        &self,
        origin_url: &str,
        manifest: &ResourceManifest,
        cancel: &CancellationToken,
        bus: Option<&Arc<MirrorEventBus>>,
    ) -> Result<DownloadReport, DownloadError> {
        let origin = Url::parse(origin_url).map_err(|e| DownloadError::InvalidUrl {
            url: origin_url.to_string(),
            reason: e.to_string(),
        })?;
        let origin_host = host_with_port(&origin).ok_or_else(|| DownloadError::InvalidUrl {
            url: origin_url.to_string(),
            reason: "origin has no host".to_string(),
        })?;

        let started = Instant::now();
        let mut report = DownloadReport::default();
        info!(
            "Downloading {} manifest entries for {origin_host}",
            manifest.len()
        );

        for category in ResourceCategory::ALL {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            let entries = manifest.entries(category);
            let origin_host = origin_host.as_str();
            let mut results = stream::iter(entries.iter().enumerate())
                .map(|(index, url)| async move {
                    let outcome = self
                        .download_entry(url, category, origin_host, cancel)
                        .await;
                    (index, url, outcome)
                })
                .buffered(self.concurrency());

            // In-flight fetches observe the token themselves and clean up their
            // partial files, so the stream is always drained rather than dropped.
            while let Some((index, url, outcome)) = results.next().await {
                report.record(url, &outcome);
                emit(
                    bus,
                    MirrorEvent::download_progress(category, index, url.clone(), outcome),
                )
                .await;
            }
        }

        report.cancelled |= cancel.is_cancelled();
        report.duration = started.elapsed();
        info!(
            "Download finished for {origin_host}: {} fetched, {} skipped, {} failed{}",
            report.fetched,
            report.skipped,
            report.failed.len(),
            if report.cancelled { " (cancelled)" } else { "" }
        );
        emit(
            bus,
            MirrorEvent::download_completed(
                report.fetched,
                report.skipped,
                report.failed.len(),
                report.cancelled,
                report.duration,
            ),
        )
        .await;

        Ok(report)
    }

    async fn download_entry(
        &self,
        url: &str,
        category: ResourceCategory,
        origin_host: &str,
        cancel: &CancellationToken,
    ) -> DownloadOutcome {
        let host = match Url::parse(url) {
            Ok(parsed) => host_with_port(&parsed),
            Err(e) => {
                warn!("Skipping malformed {category} entry {url}: {e}");
                return DownloadOutcome::Failed {
                    error: format!("Invalid URL: {e}"),
                };
            }
        };
        let Some(host) = host else {
            return DownloadOutcome::Failed {
                error: "URL has no host".to_string(),
            };
        };

        let allowed = match category {
            ResourceCategory::Dom => host.eq_ignore_ascii_case(origin_host),
            _ => self.options().should_fetch(&host, origin_host, category),
        };
        if !allowed {
            return DownloadOutcome::PolicyDenied;
        }

        match self
            .fetch(url, FetchKind::for_category(category), cancel)
            .await
        {
            Ok(report) if report.skipped_existing => DownloadOutcome::AlreadyPresent {
                path: report.path,
            },
            Ok(report) => DownloadOutcome::Fetched { path: report.path },
            Err(DownloadError::TooLarge { size, limit, .. }) => {
                info!("Skipping {url}: {size} bytes exceeds {limit}");
                DownloadOutcome::TooLarge
            }
            Err(DownloadError::Cancelled) => DownloadOutcome::Cancelled,
            Err(e) => {
                warn!("Failed to download {url}: {e}");
                DownloadOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }
}
