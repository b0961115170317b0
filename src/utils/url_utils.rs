//! URL and path manipulation utilities.
//!
//! This module provides functions for working with URLs and file paths
//! in the context of site mirroring.

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use url::Url;

use super::constants::INDEX_FILE_NAME;

/// Normalize a user supplied start URL: add `https://` if no scheme is present
#[must_use]
pub fn normalize_start_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}

/// Host of a URL including an explicit port, e.g. `example.com:8080`
///
/// This is the directory name a site is mirrored under and the identity used
/// for same-host comparisons in the rewriter and the download policy.
#[must_use]
pub fn host_with_port(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

/// Scheme + host[:port] of a URL, without a trailing slash
#[must_use]
pub fn origin_of(url: &Url) -> Option<String> {
    host_with_port(url).map(|host| format!("{}://{}", url.scheme(), host))
}

/// Remove the query component of a URL, keeping everything else
///
/// Unparseable input is handled textually so that dedup keys stay stable
/// for malformed URLs.
#[must_use]
pub fn strip_query(url: &str) -> String {
    if let Ok(mut parsed) = Url::parse(url) {
        parsed.set_query(None);
        return parsed.to_string();
    }

    match url.split_once('?') {
        Some((head, tail)) => match tail.find('#') {
            Some(idx) => format!("{head}{}", &tail[idx..]),
            None => head.to_string(),
        },
        None => url.to_string(),
    }
}

/// Whether an HTML target path should resolve to an `index.html` leaf
#[must_use]
pub fn is_directory_like(path: &str) -> bool {
    path.is_empty() || path == "/" || path.ends_with('/')
}

/// Get the mirror path for a URL, preserving the host and path structure
///
/// Layout is `mirror_root/host[:port]/url-path`. For HTML documents,
/// directory-like paths resolve to `.../index.html`. Path segments are
/// percent-decoded; segments that would escape the host directory are
/// rejected.
pub fn get_mirror_path(url: &str, mirror_root: &Path, as_html: bool) -> Result<PathBuf> {
    let parsed = Url::parse(url).with_context(|| format!("Failed to parse URL: {url}"))?;
    let host =
        host_with_port(&parsed).ok_or_else(|| anyhow::anyhow!("Invalid URL: no host in {url}"))?;

    let mut target = mirror_root.join(host);
    let path = parsed.path();

    for segment in path.split('/').filter(|s| !s.is_empty()) {
        let decoded = urlencoding::decode(segment)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| segment.to_string());

        if decoded == "." {
            continue;
        }
        if decoded == ".." || decoded.contains(['/', '\\']) {
            bail!("Refusing unsafe path segment {decoded:?} in {url}");
        }
        target.push(decoded);
    }

    if as_html && is_directory_like(path) {
        target.push(INDEX_FILE_NAME);
    }

    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirror_path_keeps_port_in_host_dir() {
        let root = Path::new("/m");
        let path = get_mirror_path("http://localhost:8080/css/a.css", root, false).unwrap();
        assert_eq!(path, Path::new("/m/localhost:8080/css/a.css"));
    }

    #[test]
    fn html_directory_paths_get_index() {
        let root = Path::new("/m");
        for url in ["https://example.com", "https://example.com/", "https://example.com/docs/"] {
            let path = get_mirror_path(url, root, true).unwrap();
            assert!(path.ends_with(INDEX_FILE_NAME), "{url} -> {}", path.display());
        }
        let about = get_mirror_path("https://example.com/about", root, true).unwrap();
        assert_eq!(about, Path::new("/m/example.com/about"));
    }

    #[test]
    fn encoded_traversal_is_rejected() {
        let root = Path::new("/m");
        assert!(get_mirror_path("https://example.com/a/..%2F..%2Fetc", root, false).is_err());
    }

    #[test]
    fn strip_query_keeps_fragment() {
        assert_eq!(strip_query("https://a.com/x.css?v=1"), "https://a.com/x.css");
        assert_eq!(strip_query("not a url?x=1#frag"), "not a url#frag");
    }

    #[test]
    fn start_url_gets_scheme() {
        assert_eq!(normalize_start_url("example.com"), "https://example.com");
        assert_eq!(normalize_start_url("http://example.com"), "http://example.com");
    }
}
