//! Configuration module for site mirroring
//!
//! This module provides the `MirrorConfig` struct and its type-safe builder,
//! the browser `Fingerprint`, and the `DownloadOptions` policy that governs
//! cross-domain fetching.

// Sub-modules
pub mod builder;
pub mod download_options;
pub mod getters;
pub mod methods;
pub mod types;

// Re-exports for public API
pub use builder::{MirrorConfigBuilder, WithMirrorRoot};
pub use download_options::{DownloadMode, DownloadOptions};
pub use types::{Fingerprint, MirrorConfig, Viewport};
