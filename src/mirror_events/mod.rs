//! Event system for reporting crawl and download progress
//!
//! `MirrorEventBus` is the events sink handed to the engine by its host
//! application. Download progress is published once per manifest entry per
//! category with a monotonically increasing index.

pub mod bus;
pub mod errors;
pub mod metrics;
pub mod progress;
pub mod types;

pub use bus::MirrorEventBus;
pub use errors::EventBusError;
pub use metrics::EventBusMetrics;
pub use progress::{ProgressTally, log_progress};
pub use types::MirrorEvent;
