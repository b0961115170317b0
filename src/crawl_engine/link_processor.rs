//! Same-site anchor extraction
//!
//! Links are read from the rendered document's `a[href]` elements and
//! resolved against the crawl origin:
//! - `#...`, `javascript:...` and a bare `/` are ignored
//! - `/path` and `./path` resolve under the origin
//! - a bare `path` resolves as `/path` under the origin
//! - absolute links are kept only when their host contains the origin host
//!
//! Results are normalized without fragment and deduplicated per page, in
//! document order.

use log::{debug, trace};
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

use crate::utils::origin_of;

static ANCHOR_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("a[href]").expect("BUG: hardcoded CSS selector 'a[href]' is invalid")
});

/// Normalize a URL string by stripping the fragment.
fn normalize_url(url: &str) -> Option<String> {
    let mut parsed = Url::parse(url).ok()?;
    parsed.set_fragment(None);
    Some(parsed.to_string())
}

/// Extract same-site links from an HTML document
#[must_use]
pub fn extract_same_site_links(html: &str, origin: &Url) -> Vec<String> {
    let Some(origin_base) = origin_of(origin) else {
        return Vec::new();
    };
    let origin_host = origin.host_str().unwrap_or_default().to_ascii_lowercase();

    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&ANCHOR_SELECTOR) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Some(candidate) = resolve_href(href.trim(), &origin_base, &origin_host) else {
            continue;
        };
        let Some(normalized) = normalize_url(&candidate) else {
            trace!(target: "sitemirror::links", "Unparseable link skipped: {candidate}");
            continue;
        };
        if seen.insert(normalized.clone()) {
            links.push(normalized);
        }
    }

    debug!(
        target: "sitemirror::links",
        "Extracted {} same-site links for {origin_base}",
        links.len()
    );
    links
}

fn resolve_href(href: &str, origin_base: &str, origin_host: &str) -> Option<String> {
    if href.is_empty() || href == "/" || href.starts_with('#') {
        return None;
    }
    let lowered = href.to_ascii_lowercase();
    if lowered.starts_with("javascript:") {
        return None;
    }

    if lowered.starts_with("http://") || lowered.starts_with("https://") {
        let parsed = Url::parse(href).ok()?;
        let host = parsed.host_str()?.to_ascii_lowercase();
        return host.contains(origin_host).then(|| href.to_string());
    }
    if href.starts_with("//") {
        return scheme_relative(href, origin_base, origin_host);
    }
    if has_scheme(href) {
        return None;
    }

    // Only the path of a relative link is kept; query and fragment are dropped.
    let path = if href.starts_with('/') {
        path_only(href).to_string()
    } else if let Some(rest) = href.strip_prefix("./") {
        format!("/{}", path_only(rest))
    } else if href.starts_with("..") {
        let base = Url::parse(&format!("{origin_base}/")).ok()?;
        base.join(href).ok()?.path().to_string()
    } else {
        format!("/{}", path_only(href))
    };
    Some(format!("{origin_base}{path}"))
}

/// `mailto:`, `tel:` and other non-http schemes
fn has_scheme(href: &str) -> bool {
    match href.find(':') {
        Some(idx) => !href[..idx].contains(['/', '?', '#']),
        None => false,
    }
}

fn scheme_relative(href: &str, origin_base: &str, origin_host: &str) -> Option<String> {
    let rest = href.strip_prefix("//")?;
    let scheme = origin_base.split_once("://")?.0;
    let parsed = Url::parse(&format!("{scheme}://{rest}")).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    host.contains(origin_host).then(|| parsed.to_string())
}

fn path_only(href: &str) -> &str {
    let end = href.find(['?', '#']).unwrap_or(href.len());
    &href[..end]
}
