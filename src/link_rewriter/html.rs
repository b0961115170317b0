//! Structural attribute pass for HTML documents

use anyhow::{Result, anyhow};
use encoding_rs::{Encoding, UTF_8};
use lol_html::html_content::Element;
use lol_html::{HandlerResult, HandlerTypes, HtmlRewriter, Settings, element};
use std::cell::Cell;

use super::charset::ascii_compatible;
use super::{ResourceRewriter, RewriteOutput, RewrittenBytes};
use crate::manifest::ResourceCategory;

impl ResourceRewriter<'_> {
    /// Rewrite resource attributes, then every `url(...)` in the document
    pub fn rewrite_html(&self, html: &str) -> Result<RewriteOutput> {
        Ok(self.rewrite_html_bytes(html.as_bytes(), UTF_8)?.into_text())
    }

    /// Byte-level variant of [`rewrite_html`](Self::rewrite_html)
    ///
    /// Fails for encodings that are not ASCII-compatible; callers keep the
    /// document as fetched in that case.
    pub fn rewrite_html_bytes(
        &self,
        html: &[u8],
        encoding: &'static Encoding,
    ) -> Result<RewrittenBytes> {
        let compatible = ascii_compatible(encoding)
            .ok_or_else(|| anyhow!("{} documents cannot be rewritten in place", encoding.name()))?;
        let rewritten = Cell::new(0usize);
        let mut output = Vec::with_capacity(html.len());

        let mut rewriter = HtmlRewriter::new(
            Settings {
                element_content_handlers: vec![
                    element!("link[href]", |el| {
                        self.rewrite_attribute(el, "href", ResourceCategory::Css, &rewritten)
                    }),
                    element!("script[src]", |el| {
                        self.rewrite_attribute(el, "src", ResourceCategory::Script, &rewritten)
                    }),
                    element!("img[src]", |el| {
                        self.rewrite_attribute(el, "src", ResourceCategory::Image, &rewritten)
                    }),
                    element!("video[src]", |el| {
                        self.rewrite_attribute(el, "src", ResourceCategory::Video, &rewritten)
                    }),
                    element!("source[src]", |el| {
                        self.rewrite_attribute(el, "src", ResourceCategory::Video, &rewritten)
                    }),
                    element!("audio[src]", |el| {
                        self.rewrite_attribute(el, "src", ResourceCategory::Video, &rewritten)
                    }),
                ],
                encoding: compatible,
                ..Settings::default()
            },
            |c: &[u8]| output.extend_from_slice(c),
        );

        rewriter
            .write(html)
            .map_err(|e| anyhow!("HtmlRewriter error: {e}"))?;
        rewriter
            .end()
            .map_err(|e| anyhow!("HtmlRewriter end error: {e}"))?;

        let css_pass = self.rewrite_css_bytes(&output, encoding);
        Ok(RewrittenBytes {
            content: css_pass.content,
            rewritten: rewritten.get() + css_pass.rewritten,
        })
    }

    fn rewrite_attribute<H: HandlerTypes>(
        &self,
        el: &mut Element<'_, '_, H>,
        attr: &str,
        category: ResourceCategory,
        rewritten: &Cell<usize>,
    ) -> HandlerResult {
        if let Some(value) = el.get_attribute(attr)
            && let Some(local) = self.convert(&value, category)
        {
            el.set_attribute(attr, &local)?;
            rewritten.set(rewritten.get() + 1);
        }
        Ok(())
    }
}
