//! Broadcast event bus

use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast;

use super::errors::EventBusError;
use super::metrics::EventBusMetrics;
use super::types::MirrorEvent;

/// Event bus for publishing and subscribing to mirror events
#[derive(Debug)]
pub struct MirrorEventBus {
    sender: broadcast::Sender<MirrorEvent>,
    capacity: usize,
    metrics: EventBusMetrics,
    shutdown: AtomicBool,
}

impl MirrorEventBus {
    /// Create a new event bus with the specified capacity
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of events that can be buffered
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            capacity: capacity.max(1),
            metrics: EventBusMetrics::new(),
            shutdown: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn metrics(&self) -> &EventBusMetrics {
        &self.metrics
    }

    /// Publish an event to all subscribers
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of active subscribers that received the event
    /// * `Err(EventBusError::NoSubscribers)` - Nobody is listening
    /// * `Err(EventBusError::Shutdown)` - The bus was shut down
    pub async fn publish(&self, event: MirrorEvent) -> Result<usize, EventBusError> {
        if self.shutdown.load(Ordering::Acquire) {
            return Err(EventBusError::Shutdown);
        }

        match self.sender.send(event) {
            Ok(subscriber_count) => {
                self.metrics.increment_published();
                self.metrics.update_subscriber_count(subscriber_count);
                Ok(subscriber_count)
            }
            Err(_) => {
                self.metrics.increment_dropped();
                Err(EventBusError::NoSubscribers)
            }
        }
    }

    /// Subscribe to events
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<MirrorEvent> {
        self.sender.subscribe()
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    #[must_use]
    pub fn has_subscribers(&self) -> bool {
        self.subscriber_count() > 0
    }

    /// Stop accepting events; subsequent `publish` calls fail with `Shutdown`
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }
}

/// Publish to an optional bus, treating a missing audience as non-fatal
pub(crate) async fn emit(bus: Option<&std::sync::Arc<MirrorEventBus>>, event: MirrorEvent) {
    let Some(bus) = bus else {
        return;
    };
    if let Err(e) = bus.publish(event).await {
        log::debug!("Mirror event not delivered: {e}");
    }
}
