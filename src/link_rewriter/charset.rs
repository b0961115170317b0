//! Document encoding detection for byte-level rewriting
//!
//! A `Content-Type` charset wins, then an in-document declaration
//! (`<meta charset>` / `http-equiv` for HTML, `@charset` for CSS), then
//! UTF-8. Only ASCII-compatible encodings can be rewritten in place.

use encoding_rs::{Encoding, UTF_8};
use lol_html::AsciiCompatibleEncoding;

/// How far into a document declarations are looked for
const SNIFF_LIMIT: usize = 8192;

/// Encoding of a fetched HTML document or stylesheet
#[must_use]
pub fn detect_encoding(
    body: &[u8],
    content_type: Option<&str>,
    is_html: bool,
) -> &'static Encoding {
    content_type
        .and_then(charset_from_content_type)
        .or_else(|| {
            if is_html {
                charset_from_html_prefix(body)
            } else {
                charset_from_css_prefix(body)
            }
        })
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .unwrap_or(UTF_8)
}

/// `encoding` as lol_html accepts it, `None` for UTF-16 and other
/// encodings that cannot be rewritten without transcoding
#[must_use]
pub fn ascii_compatible(encoding: &'static Encoding) -> Option<AsciiCompatibleEncoding> {
    AsciiCompatibleEncoding::new(encoding)
}

fn charset_from_content_type(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|part| {
        let (name, value) = part.split_once('=')?;
        if !name.trim().eq_ignore_ascii_case("charset") {
            return None;
        }
        let label = value.trim().trim_matches('"').trim_matches('\'');
        (!label.is_empty()).then(|| label.to_string())
    })
}

fn charset_from_html_prefix(body: &[u8]) -> Option<String> {
    let prefix = &body[..body.len().min(SNIFF_LIMIT)];
    let lower = prefix.to_ascii_lowercase();
    let needle = b"charset=";

    let mut start = 0;
    while let Some(offset) = find(&lower[start..], needle) {
        let value_start = start + offset + needle.len();
        if let Some(label) = parse_charset_label(&prefix[value_start..]) {
            return Some(label);
        }
        start = value_start;
    }
    None
}

fn charset_from_css_prefix(body: &[u8]) -> Option<String> {
    // Only valid as the very first bytes of the stylesheet
    let rest = body.strip_prefix(b"@charset \"")?;
    let end = rest.iter().take(64).position(|&b| b == b'"')?;
    let label = std::str::from_utf8(&rest[..end]).ok()?.trim();
    (!label.is_empty()).then(|| label.to_string())
}

fn parse_charset_label(input: &[u8]) -> Option<String> {
    let start = input.iter().position(|b| !b.is_ascii_whitespace())?;
    let input = &input[start..];

    let raw = match input.first()? {
        quote @ (b'"' | b'\'') => {
            let rest = &input[1..];
            &rest[..rest.iter().position(|b| b == quote)?]
        }
        _ => {
            let end = input
                .iter()
                .position(|b| b.is_ascii_whitespace() || b"\"';>/".contains(b))
                .unwrap_or(input.len());
            &input[..end]
        }
    };

    let label = std::str::from_utf8(raw).ok()?.trim();
    (!label.is_empty()).then(|| label.to_string())
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
