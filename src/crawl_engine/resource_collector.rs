//! Per-navigation resource capture over a bounded channel
//!
//! A forwarding task turns the page's CDP events into `NetworkSignal`s and
//! sends them into an `mpsc` channel. The caller drains the channel after
//! issuing the navigation and stops at `LoadComplete`, so records are read
//! only once the page's load event has fired.
//!
//! The buffer is cleared exactly once per navigation, on the first
//! main-frame `LoadStarted` signal. Responses that race ahead of that
//! signal belong to the previous document and are discarded with it.

use anyhow::{Context, Result, anyhow};
use chromiumoxide::Page;
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventResponseReceived, ResourceType,
};
use chromiumoxide::cdp::browser_protocol::page::{EventFrameStartedLoading, EventLoadEventFired};
use futures::StreamExt;
use log::{debug, trace};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::page_timeout::with_page_timeout;
use crate::manifest::{ResourceKind, ResourceRecord};

/// Network activity observed for one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkSignal {
    /// The main frame started loading a new document
    LoadStarted,
    /// A resource response arrived
    Response(ResourceRecord),
    /// The page's load event fired
    LoadComplete,
}

/// Accumulates records for a single navigation
#[derive(Debug, Default)]
pub struct ResourceBuffer {
    records: Vec<ResourceRecord>,
    started: bool,
    complete: bool,
}

impl ResourceBuffer {
    /// Apply one signal; returns `true` once the load has completed
    pub fn apply(&mut self, signal: NetworkSignal) -> bool {
        if self.complete {
            return true;
        }
        match signal {
            NetworkSignal::LoadStarted => {
                if !self.started {
                    self.started = true;
                    self.records.clear();
                }
            }
            NetworkSignal::Response(record) => self.records.push(record),
            NetworkSignal::LoadComplete => self.complete = true,
        }
        self.complete
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    #[must_use]
    pub fn into_records(self) -> Vec<ResourceRecord> {
        self.records
    }
}

/// Map a CDP resource type onto a manifest kind; other types are not mirrored
#[must_use]
pub fn resource_kind(resource_type: &ResourceType) -> Option<ResourceKind> {
    match resource_type {
        ResourceType::Script => Some(ResourceKind::Script),
        ResourceType::Stylesheet => Some(ResourceKind::Stylesheet),
        ResourceType::Image => Some(ResourceKind::Image),
        ResourceType::Media => Some(ResourceKind::Media),
        _ => None,
    }
}

/// Live collector attached to a page for one navigation
pub struct ResourceCollector {
    receiver: mpsc::Receiver<NetworkSignal>,
    forwarder: JoinHandle<()>,
}

impl ResourceCollector {
    /// Subscribe to the page's network and lifecycle events
    ///
    /// Must be called before the navigation is issued.
    pub async fn attach(page: &Page, capacity: usize) -> Result<Self> {
        page.execute(EnableParams::default())
            .await
            .context("Failed to enable network events")?;

        let main_frame = page
            .mainframe()
            .await
            .context("Failed to resolve main frame")?;
        let mut frame_started = page
            .event_listener::<EventFrameStartedLoading>()
            .await
            .context("Failed to subscribe to frame loading events")?;
        let mut responses = page
            .event_listener::<EventResponseReceived>()
            .await
            .context("Failed to subscribe to response events")?;
        let mut load_fired = page
            .event_listener::<EventLoadEventFired>()
            .await
            .context("Failed to subscribe to load events")?;

        let (sender, receiver) = mpsc::channel(capacity.max(1));

        let forwarder = tokio::spawn(async move {
            loop {
                let signal = tokio::select! {
                    biased;
                    Some(event) = frame_started.next() => {
                        let is_main = main_frame
                            .as_ref()
                            .is_none_or(|frame| *frame == event.frame_id);
                        if !is_main {
                            continue;
                        }
                        NetworkSignal::LoadStarted
                    }
                    Some(event) = responses.next() => {
                        let Some(kind) = resource_kind(&event.r#type) else {
                            trace!("Ignoring {:?} response {}", event.r#type, event.response.url);
                            continue;
                        };
                        NetworkSignal::Response(ResourceRecord::new(kind, event.response.url.clone()))
                    }
                    Some(_) = load_fired.next() => NetworkSignal::LoadComplete,
                    else => break,
                };
                if sender.send(signal).await.is_err() {
                    break;
                }
            }
        });

        Ok(Self {
            receiver,
            forwarder,
        })
    }

    /// Wait for the load-complete signal and return this navigation's records
    pub async fn finish(mut self, timeout_secs: u64) -> Result<Vec<ResourceRecord>> {
        let mut buffer = ResourceBuffer::default();
        let receiver = &mut self.receiver;

        let drained = with_page_timeout(
            async {
                while let Some(signal) = receiver.recv().await {
                    if buffer.apply(signal) {
                        return Ok(());
                    }
                }
                Err(anyhow!("Page event stream closed before load completed"))
            },
            timeout_secs,
            "Page load",
        )
        .await;

        self.forwarder.abort();
        drained?;

        let records = buffer.into_records();
        debug!("Collected {} resource records", records.len());
        Ok(records)
    }
}

impl Drop for ResourceCollector {
    fn drop(&mut self) {
        self.forwarder.abort();
    }
}
