//! Resource reference rewriting for mirrored HTML and CSS.
//!
//! Absolute resource URLs in a saved document are replaced with references
//! relative to the document's own location in the mirror, so the local copy
//! resolves everything from disk. Cross-host references are only rewritten
//! when the `DownloadOptions` policy says the resource is fetched; otherwise
//! they stay absolute.
//!
//! Two passes run over an HTML document:
//! 1. A structural pass (lol_html) over `link[href]`, `script[src]`,
//!    `img[src]`, `video[src]`, `source[src]` and `audio[src]`.
//! 2. A regex pass over every CSS `url(...)` occurrence in the text.
//!
//! Stylesheets only get the second pass. Both passes work on the raw bytes
//! in the document's own encoding, so everything outside a replaced
//! reference is saved exactly as fetched.

pub mod charset;
pub mod css;
pub mod html;
pub mod relative_path;

use anyhow::{Context, Result};
use url::Url;

use crate::config::DownloadOptions;
use crate::manifest::ResourceCategory;
use crate::utils::host_with_port;

pub use charset::detect_encoding;
pub use relative_path::{
    calculate_relative_path, document_dir_segments, mirror_relative_path, path_segments,
};

/// Result of rewriting one document
#[derive(Debug, Clone, Default)]
pub struct RewriteOutput {
    pub content: String,
    /// Number of references replaced with relative paths
    pub rewritten: usize,
}

/// Result of rewriting one document in its original encoding
#[derive(Debug, Clone, Default)]
pub struct RewrittenBytes {
    pub content: Vec<u8>,
    pub rewritten: usize,
}

impl RewrittenBytes {
    fn into_text(self) -> RewriteOutput {
        let content = String::from_utf8(self.content)
            .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned());
        RewriteOutput {
            content,
            rewritten: self.rewritten,
        }
    }
}

/// Rewrites references inside one source document
#[derive(Debug, Clone)]
pub struct ResourceRewriter<'a> {
    source: Url,
    base_host: String,
    options: &'a DownloadOptions,
}

impl<'a> ResourceRewriter<'a> {
    pub fn new(source_url: &str, options: &'a DownloadOptions) -> Result<Self> {
        let source = Url::parse(source_url)
            .with_context(|| format!("Invalid source document URL: {source_url}"))?;
        let base_host = host_with_port(&source)
            .ok_or_else(|| anyhow::anyhow!("Source document URL has no host: {source_url}"))?;
        Ok(Self {
            source,
            base_host,
            options,
        })
    }

    /// Local relative reference for `value`, or `None` to leave it untouched
    ///
    /// Skipped: empty values, `data:`, `javascript:`, `mailto:`, fragments,
    /// already-relative references, unparseable URLs and anything the policy
    /// does not fetch.
    #[must_use]
    pub fn convert(&self, value: &str, category: ResourceCategory) -> Option<String> {
        let value = value.trim();
        if value.is_empty() || value.starts_with('#') {
            return None;
        }

        let lowered = value.to_ascii_lowercase();
        if ["data:", "javascript:", "mailto:"]
            .iter()
            .any(|scheme| lowered.starts_with(scheme))
        {
            return None;
        }

        let absolute = if value.starts_with("//") {
            format!("{}:{value}", self.source.scheme())
        } else if lowered.starts_with("http://") || lowered.starts_with("https://") {
            value.to_string()
        } else {
            return None;
        };

        let resource = Url::parse(&absolute).ok()?;
        let resource_host = host_with_port(&resource)?;
        if !self
            .options
            .should_fetch(&resource_host, &self.base_host, category)
        {
            return None;
        }

        Some(mirror_relative_path(
            &self.base_host,
            self.source.path(),
            &resource_host,
            resource.path(),
        ))
    }
}

/// Rewrite an HTML document saved from `source_url`
pub fn rewrite_html(html: &str, source_url: &str, options: &DownloadOptions) -> Result<String> {
    Ok(ResourceRewriter::new(source_url, options)?
        .rewrite_html(html)?
        .content)
}

/// Rewrite a stylesheet saved from `source_url`
pub fn rewrite_css(css: &str, source_url: &str, options: &DownloadOptions) -> Result<String> {
    Ok(ResourceRewriter::new(source_url, options)?.rewrite_css(css).content)
}
