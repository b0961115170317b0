//! Shared configuration constants for sitemirror
//!
//! This module contains default values and configuration constants used
//! throughout the codebase to ensure consistency and avoid magic numbers.

/// Default number of attempts per resource fetch
///
/// Each failed attempt `n` (0-based) waits `n` backoff units before the next
/// one, so three attempts cost at most 0 + 1 + 2 units of waiting.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Per-attempt HTTP request timeout: 30 seconds
///
/// A timeout counts as a retryable failure.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Length of one linear backoff unit in milliseconds
pub const DEFAULT_RETRY_BACKOFF_UNIT_MS: u64 = 1_000;

/// Timeout for a single page navigation
pub const DEFAULT_NAVIGATION_TIMEOUT_SECS: u64 = 30;

/// Timeout for the load-complete signal after navigation
pub const DEFAULT_LOAD_TIMEOUT_SECS: u64 = 30;

/// Number of resource downloads allowed in flight per category
pub const DEFAULT_DOWNLOAD_CONCURRENCY: usize = 4;

/// Bound of the per-navigation network signal channel
///
/// The forwarding task applies backpressure once this many signals are
/// queued and not yet drained by the collector.
pub const DEFAULT_COLLECTOR_CAPACITY: usize = 1_024;

/// Default size-skip threshold in megabytes
pub const DEFAULT_MAX_FILE_SIZE_MB: u64 = 10;

/// Default browser window width
pub const DEFAULT_WINDOW_WIDTH: u32 = 1920;

/// Default browser window height
pub const DEFAULT_WINDOW_HEIGHT: u32 = 1480;

/// Default `Accept-Language` / `navigator.language`
pub const DEFAULT_LANG: &str = "en-US";

/// Leaf file name used for directory-like HTML targets
pub const INDEX_FILE_NAME: &str = "index.html";

/// Capacity of the mirror event bus
pub const DEFAULT_EVENT_BUS_CAPACITY: usize = 1_000;

/// Chrome user agent string for stealth mode
///
/// Updated: 2025-01-29 to Chrome 132 (current stable)
/// Next update: 2025-04-29 (quarterly schedule)
///
/// Chrome releases new stable versions ~every 4 weeks.
/// Update quarterly to stay within reasonable version window.
///
/// Reference: https://chromiumdash.appspot.com/schedule
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36";
