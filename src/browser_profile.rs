//! Persistent Chrome profile directories, one per site identifier
//!
//! Mirroring the same site again reuses its profile, so cookies and other
//! browser state survive between runs. A profile left locked by a crashed
//! browser is unlocked before reuse.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Directory name used for an identifier that sanitizes to nothing
const FALLBACK_PROFILE_NAME: &str = "default";

/// Filesystem-safe directory name for a site identifier
///
/// `example.com:8080` becomes `example.com_8080`.
#[must_use]
pub fn profile_dir_name(id: &str) -> String {
    let sanitized = sanitize_filename::sanitize_with_options(
        id.trim(),
        sanitize_filename::Options {
            replacement: "_",
            ..sanitize_filename::Options::default()
        },
    );
    if sanitized.is_empty() || sanitized.chars().all(|c| c == '.') {
        FALLBACK_PROFILE_NAME.to_string()
    } else {
        sanitized
    }
}

/// Resolve (and create) the persistent profile directory for `id`
pub fn persistent_profile_dir(profile_root: &Path, id: &str) -> Result<PathBuf> {
    let path = profile_root.join(profile_dir_name(id));

    std::fs::create_dir_all(&path)
        .with_context(|| format!("Failed to create profile directory: {}", path.display()))?;

    if is_singleton_lock_stale(&path) {
        cleanup_stale_lock(&path)?;
    } else {
        warn!(
            "Profile {} is locked by a running browser; launch may fail",
            path.display()
        );
    }

    debug!("Using Chrome profile directory: {}", path.display());
    Ok(path)
}

/// Check if a SingletonLock file is stale (Chrome process no longer running)
///
/// SingletonLock is a symlink with target `{hostname}-{PID}`.
/// Returns `true` when there is no lock or its process is gone.
#[cfg(unix)]
pub fn is_singleton_lock_stale(profile_dir: &Path) -> bool {
    let lock_path = profile_dir.join("SingletonLock");

    if !lock_path.exists() && !lock_path.is_symlink() {
        return true;
    }

    match std::fs::read_link(&lock_path) {
        Ok(target) => {
            let target_str = target.to_string_lossy();
            if let Some(pid_str) = target_str.rsplit('-').next()
                && let Ok(pid) = pid_str.parse::<i32>()
            {
                // kill(pid, 0) probes for existence without signalling
                let exists = unsafe { libc::kill(pid, 0) == 0 };
                if !exists {
                    info!("SingletonLock is stale: PID {} no longer exists", pid);
                }
                return !exists;
            }
            warn!("Could not parse PID from SingletonLock target: {}", target_str);
            false
        }
        Err(e) => {
            debug!("Could not read SingletonLock as symlink: {}", e);
            lock_path.is_file()
        }
    }
}

/// Non-Unix fallback: locks are never considered held
#[cfg(not(unix))]
pub fn is_singleton_lock_stale(_profile_dir: &Path) -> bool {
    true
}

/// Remove a stale SingletonLock from a profile directory
pub fn cleanup_stale_lock(profile_dir: &Path) -> Result<()> {
    let lock_path = profile_dir.join("SingletonLock");

    // broken symlinks report exists() == false
    if lock_path.exists() || lock_path.is_symlink() {
        info!("Removing stale SingletonLock: {}", lock_path.display());
        std::fs::remove_file(&lock_path)
            .with_context(|| format!("Failed to remove SingletonLock: {}", lock_path.display()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_become_safe_directory_names() {
        assert_eq!(profile_dir_name("example.com"), "example.com");
        assert_eq!(profile_dir_name("localhost:8080"), "localhost_8080");
        let escaped = profile_dir_name("../../etc");
        assert!(!escaped.contains('/'), "{escaped}");
        assert_ne!(escaped, "..");
        assert_eq!(profile_dir_name(""), "default");
    }

    #[test]
    fn profile_dir_is_reused() {
        let root = tempfile::tempdir().unwrap();
        let first = persistent_profile_dir(root.path(), "example.com").unwrap();
        std::fs::write(first.join("Cookies"), b"state").unwrap();

        let second = persistent_profile_dir(root.path(), "example.com").unwrap();
        assert_eq!(first, second);
        assert!(second.join("Cookies").exists(), "profile state was not kept");
    }

    #[cfg(unix)]
    #[test]
    fn stale_lock_is_removed() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("example.com");
        std::fs::create_dir_all(&dir).unwrap();
        // PID far above any pid_max
        std::os::unix::fs::symlink("host-2147483646", dir.join("SingletonLock")).unwrap();

        persistent_profile_dir(root.path(), "example.com").unwrap();
        assert!(!dir.join("SingletonLock").is_symlink());
    }
}
