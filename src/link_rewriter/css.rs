//! CSS `url(...)` reference pass

use encoding_rs::{Encoding, UTF_8};
use once_cell::sync::Lazy;
use regex::bytes::{Captures, Regex};

use super::{ResourceRewriter, RewriteOutput, RewrittenBytes};
use crate::manifest::ResourceCategory;

// Byte-oriented so multi-byte text in legacy encodings passes through untouched
static CSS_URL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?-u)(url\(["']?)([^"')]+)(["']?\))"#).expect("Invalid CSS url() regex")
});

impl ResourceRewriter<'_> {
    /// Rewrite every `url(...)` in `text`; references are classified as images
    #[must_use]
    pub fn rewrite_css(&self, text: &str) -> RewriteOutput {
        self.rewrite_css_bytes(text.as_bytes(), UTF_8).into_text()
    }

    /// Byte-level variant of [`rewrite_css`](Self::rewrite_css)
    ///
    /// A reference that does not decode in `encoding` is left alone.
    #[must_use]
    pub fn rewrite_css_bytes(&self, text: &[u8], encoding: &'static Encoding) -> RewrittenBytes {
        let mut rewritten = 0;
        let content = CSS_URL_REGEX
            .replace_all(text, |caps: &Captures<'_>| {
                let local = encoding
                    .decode_without_bom_handling_and_without_replacement(&caps[2])
                    .and_then(|value| self.convert(&value, ResourceCategory::Image));
                match local {
                    Some(local) => {
                        rewritten += 1;
                        [&caps[1], local.as_bytes(), &caps[3]].concat()
                    }
                    None => caps[0].to_vec(),
                }
            })
            .into_owned();

        RewrittenBytes { content, rewritten }
    }
}
