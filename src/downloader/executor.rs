//! Single-resource fetch with skip-if-exists, linear backoff and atomic writes
//!
//! Every fetch holds a per-target-path lock from the existence check until
//! the file is renamed into place, so two workers can never race to create
//! the same file. Bodies are written to a hidden sibling `.part` file first;
//! a failed or cancelled attempt removes it, so a partial artifact can never
//! satisfy a later existence check.

use anyhow::{Context, Result};
use dashmap::DashMap;
use futures::StreamExt;
use log::{debug, info, warn};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use url::Url;

use super::types::{DownloadError, FetchKind, FetchReport};
use crate::config::{DownloadOptions, MirrorConfig};
use crate::link_rewriter::charset::ascii_compatible;
use crate::link_rewriter::{ResourceRewriter, detect_encoding};
use crate::utils::constants::CHROME_USER_AGENT;
use crate::utils::get_mirror_path;

/// Fetches resources into the mirror tree
#[derive(Debug)]
pub struct DownloadExecutor {
    client: Client,
    mirror_root: PathBuf,
    options: DownloadOptions,
    max_retries: u32,
    request_timeout: Duration,
    backoff_unit: Duration,
    concurrency: usize,
    path_locks: DashMap<PathBuf, Arc<Mutex<()>>>,
}

impl DownloadExecutor {
    pub fn new(config: &MirrorConfig) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self::with_client(client, config))
    }

    #[must_use]
    pub fn with_client(client: Client, config: &MirrorConfig) -> Self {
        Self {
            client,
            mirror_root: config.mirror_root().to_path_buf(),
            options: config.download_options().clone(),
            max_retries: config.max_retries(),
            request_timeout: config.request_timeout(),
            backoff_unit: config.retry_backoff_unit(),
            concurrency: config.download_concurrency(),
            path_locks: DashMap::new(),
        }
    }

    #[must_use]
    pub fn mirror_root(&self) -> &Path {
        &self.mirror_root
    }

    #[must_use]
    pub fn options(&self) -> &DownloadOptions {
        &self.options
    }

    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Fetch `url` into its mirror path
    ///
    /// Returns immediately without a network call if the target exists.
    /// Attempt `n` (0-based) is preceded by a wait of `n` backoff units.
    /// `TooLarge`, `InvalidUrl` and `Cancelled` are not retried.
    pub async fn fetch(
        &self,
        url: &str,
        kind: FetchKind,
        cancel: &CancellationToken,
    ) -> Result<FetchReport, DownloadError> {
        let parsed = Url::parse(url).map_err(|e| DownloadError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(DownloadError::InvalidUrl {
                url: url.to_string(),
                reason: format!("unsupported scheme {}", parsed.scheme()),
            });
        }
        let path = get_mirror_path(url, &self.mirror_root, kind.is_html()).map_err(|e| {
            DownloadError::InvalidUrl {
                url: url.to_string(),
                reason: format!("{e:#}"),
            }
        })?;

        let lock = self.path_lock(&path);
        let result = {
            let _guard = lock.lock().await;
            self.fetch_locked(url, &path, kind, cancel).await
        };
        drop(lock);
        self.path_locks
            .remove_if(&path, |_, lock| Arc::strong_count(lock) == 1);

        result
    }

    fn path_lock(&self, path: &Path) -> Arc<Mutex<()>> {
        self.path_locks
            .entry(path.to_path_buf())
            .or_default()
            .value()
            .clone()
    }

    async fn fetch_locked(
        &self,
        url: &str,
        path: &Path,
        kind: FetchKind,
        cancel: &CancellationToken,
    ) -> Result<FetchReport, DownloadError> {
        match tokio::fs::metadata(path).await {
            Ok(meta) if meta.is_file() => {
                debug!("Already mirrored, skipping: {}", path.display());
                return Ok(FetchReport {
                    path: path.to_path_buf(),
                    attempts: 0,
                    retry_delays: Vec::new(),
                    skipped_existing: true,
                });
            }
            Ok(_) => {
                return Err(DownloadError::Io {
                    path: path.to_path_buf(),
                    message: "target path is occupied by a directory".to_string(),
                });
            }
            Err(_) => {}
        }

        let mut retry_delays = Vec::new();
        let mut last_error = None;

        for attempt in 0..self.max_retries {
            if cancel.is_cancelled() {
                return Err(DownloadError::Cancelled);
            }
            if attempt > 0 {
                let delay = self.backoff_unit * attempt;
                info!(
                    "Retrying download ({}/{}) after {delay:?}: {url}",
                    attempt + 1,
                    self.max_retries
                );
                tokio::select! {
                    () = cancel.cancelled() => return Err(DownloadError::Cancelled),
                    () = tokio::time::sleep(delay) => {}
                }
                retry_delays.push(delay);
            }

            let temp = temp_path_for(path);
            let outcome = tokio::select! {
                () = cancel.cancelled() => Err(DownloadError::Cancelled),
                res = self.attempt(url, path, &temp, kind) => res,
            };

            match outcome {
                Ok(()) => {
                    info!("Downloaded {url} -> {}", path.display());
                    return Ok(FetchReport {
                        path: path.to_path_buf(),
                        attempts: attempt + 1,
                        retry_delays,
                        skipped_existing: false,
                    });
                }
                Err(e) => {
                    remove_partial(&temp).await;
                    if !e.is_retryable() {
                        return Err(e);
                    }
                    warn!("Download attempt {} failed for {url}: {e}", attempt + 1);
                    last_error = Some(e);
                }
            }
        }

        Err(DownloadError::RetriesExhausted {
            attempts: self.max_retries,
            last: last_error.map_or_else(|| "no attempt made".to_string(), |e| e.to_string()),
        })
    }

    async fn attempt(
        &self,
        url: &str,
        path: &Path,
        temp: &Path,
        kind: FetchKind,
    ) -> Result<(), DownloadError> {
        let response = self
            .client
            .get(url)
            .timeout(self.request_timeout)
            .header("User-Agent", CHROME_USER_AGENT)
            .send()
            .await
            .map_err(|e| DownloadError::from_reqwest(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let limit = self.options.max_file_size_bytes();
        if let (Some(limit), Some(size)) = (limit, response.content_length())
            && size > limit
        {
            return Err(DownloadError::TooLarge {
                url: url.to_string(),
                size,
                limit,
            });
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(parent, &e))?;
        }

        match kind {
            FetchKind::Binary => stream_to_file(response, url, temp, limit).await?,
            FetchKind::Html | FetchKind::Stylesheet => {
                let content_type = response
                    .headers()
                    .get(CONTENT_TYPE)
                    .and_then(|value| value.to_str().ok())
                    .map(str::to_string);
                let body = read_body(response, url, limit).await?;
                let rewritten = self.rewrite(body, content_type.as_deref(), url, kind);
                tokio::fs::write(temp, &rewritten)
                    .await
                    .map_err(|e| io_error(temp, &e))?;
            }
        }

        tokio::fs::rename(temp, path)
            .await
            .map_err(|e| io_error(path, &e))
    }

    /// Rewrite a document body in its own encoding; on failure the
    /// body is kept exactly as fetched
    fn rewrite(
        &self,
        body: Vec<u8>,
        content_type: Option<&str>,
        url: &str,
        kind: FetchKind,
    ) -> Vec<u8> {
        let rewriter = match ResourceRewriter::new(url, &self.options) {
            Ok(rewriter) => rewriter,
            Err(e) => {
                warn!("Not rewriting {url}: {e:#}");
                return body;
            }
        };
        let encoding = detect_encoding(&body, content_type, kind.is_html());

        if kind.is_html() {
            match rewriter.rewrite_html_bytes(&body, encoding) {
                Ok(output) => {
                    debug!("Rewrote {} references in {url}", output.rewritten);
                    output.content
                }
                Err(e) => {
                    warn!("HTML rewrite failed for {url}, saving as fetched: {e:#}");
                    body
                }
            }
        } else if ascii_compatible(encoding).is_some() {
            rewriter.rewrite_css_bytes(&body, encoding).content
        } else {
            warn!("Stylesheet {url} is {}, saving as fetched", encoding.name());
            body
        }
    }
}

/// Hidden sibling of `path` the body is written to before the rename
fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map_or_else(|| "download".into(), |n| n.to_string_lossy().into_owned());
    path.with_file_name(format!(".{name}.{}.part", uuid::Uuid::new_v4().simple()))
}

async fn remove_partial(temp: &Path) {
    match tokio::fs::remove_file(temp).await {
        Ok(()) => debug!("Removed partial file {}", temp.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove partial file {}: {e}", temp.display()),
    }
}

fn io_error(path: &Path, err: &std::io::Error) -> DownloadError {
    DownloadError::Io {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

fn too_large(url: &str, size: u64, limit: u64) -> DownloadError {
    DownloadError::TooLarge {
        url: url.to_string(),
        size,
        limit,
    }
}

async fn stream_to_file(
    response: Response,
    url: &str,
    temp: &Path,
    limit: Option<u64>,
) -> Result<(), DownloadError> {
    let mut file = tokio::fs::File::create(temp)
        .await
        .map_err(|e| io_error(temp, &e))?;
    let mut stream = response.bytes_stream();
    let mut total: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| DownloadError::from_reqwest(url, &e))?;
        total += chunk.len() as u64;
        if let Some(limit) = limit
            && total > limit
        {
            return Err(too_large(url, total, limit));
        }
        file.write_all(&chunk)
            .await
            .map_err(|e| io_error(temp, &e))?;
    }

    file.flush().await.map_err(|e| io_error(temp, &e))?;
    Ok(())
}

async fn read_body(response: Response, url: &str, limit: Option<u64>) -> Result<Vec<u8>, DownloadError> {
    let mut buffer = Vec::with_capacity(response.content_length().unwrap_or(0).min(1 << 20) as usize);
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| DownloadError::from_reqwest(url, &e))?;
        let total = (buffer.len() + chunk.len()) as u64;
        if let Some(limit) = limit
            && total > limit
        {
            return Err(too_large(url, total, limit));
        }
        buffer.extend_from_slice(&chunk);
    }

    Ok(buffer)
}
