//! Inventory of mirrored sites under the mirror root
//!
//! Each site lives in one host[:port] directory directly below the root.

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One mirrored host directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirroredSite {
    pub name: String,
    pub path: PathBuf,
    /// Total bytes of all files below the directory
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

/// List every host directory under `mirror_root`, sorted by name
///
/// A missing root is an empty inventory.
pub async fn list_mirrored_sites(mirror_root: &Path) -> Result<Vec<MirroredSite>> {
    let root = mirror_root.to_path_buf();
    tokio::task::spawn_blocking(move || list_blocking(&root))
        .await
        .context("Site listing task panicked")?
}

fn list_blocking(root: &Path) -> Result<Vec<MirroredSite>> {
    let entries = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(e)
                .with_context(|| format!("Failed to read mirror root: {}", root.display()));
        }
    };

    let mut sites = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(metadata) = entry.metadata() else {
            warn!("Cannot read attributes of {}", path.display());
            continue;
        };
        if !metadata.is_dir() {
            continue;
        }
        sites.push(MirroredSite {
            name: entry.file_name().to_string_lossy().into_owned(),
            size: dir_size(&path),
            modified: metadata.modified().ok().map(DateTime::<Utc>::from),
            path,
        });
    }

    sites.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(sites)
}

fn dir_size(dir: &Path) -> u64 {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return 0;
    };
    entries
        .flatten()
        .map(|entry| match entry.file_type() {
            Ok(ft) if ft.is_dir() => dir_size(&entry.path()),
            Ok(ft) if ft.is_file() => entry.metadata().map_or(0, |m| m.len()),
            _ => 0,
        })
        .sum()
}

/// Reject names that are not a single directory component
fn validate_site_name(name: &str) -> Result<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed == "." || trimmed == ".." {
        bail!("Invalid site name: {name:?}");
    }
    if trimmed.contains(['/', '\\']) || trimmed.contains("..") {
        bail!("Site name must be a single directory name: {name:?}");
    }
    Ok(())
}

/// Delete one mirrored site directory; `false` when it does not exist
pub async fn remove_mirrored_site(mirror_root: &Path, name: &str) -> Result<bool> {
    validate_site_name(name)?;
    let path = mirror_root.join(name.trim());

    match tokio::fs::remove_dir_all(&path).await {
        Ok(()) => {
            info!("Removed mirrored site {}", path.display());
            Ok(true)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
    }
}
