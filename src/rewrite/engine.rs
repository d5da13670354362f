//! Streaming markup engine.
//!
//! The proxy only needs two capabilities from an HTML engine: register the
//! rule table against a document and push bytes through it. `MarkupEngine`
//! is that seam; `LolHtmlEngine` is the implementation used in production.

use super::RewriteContext;
use super::rules::{Edit, ElementRule, edits_for};
use crate::config::{ProxyError, Result};
use bytes::Bytes;
use encoding_rs::{Encoding, UTF_8};
use lol_html::html_content::ContentType;
use lol_html::send::{HtmlRewriter, Settings};
use lol_html::{AsciiCompatibleEncoding, OutputSink, element};
use std::sync::{Arc, Mutex, PoisonError};

/// An in-flight document rewrite.
///
/// Output is returned as soon as the engine releases it, so callers can
/// forward each chunk without waiting for the whole document.
pub trait DocumentTransform: Send {
    /// Feeds a chunk of the upstream body and returns the bytes now ready.
    fn write(&mut self, chunk: &[u8]) -> Result<Bytes>;

    /// Flushes whatever the engine still holds.
    fn end(self: Box<Self>) -> Result<Bytes>;
}

/// Factory for per-document transforms.
pub trait MarkupEngine: Send + Sync {
    /// `charset` is the label from the response `Content-Type`, if any.
    fn start(
        &self,
        rules: &'static [ElementRule],
        cx: RewriteContext,
        charset: Option<&str>,
    ) -> Box<dyn DocumentTransform>;
}

/// Engine backed by `lol_html`'s `Send` rewriter.
#[derive(Debug, Default, Clone, Copy)]
pub struct LolHtmlEngine;

#[derive(Clone, Default)]
struct SharedSink(Arc<Mutex<Vec<u8>>>);

impl SharedSink {
    fn take(&self) -> Bytes {
        let mut buf = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        Bytes::from(std::mem::take(&mut *buf))
    }
}

impl OutputSink for SharedSink {
    fn handle_chunk(&mut self, chunk: &[u8]) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(chunk);
    }
}

struct LolHtmlTransform {
    rewriter: HtmlRewriter<'static, SharedSink>,
    output: SharedSink,
}

impl DocumentTransform for LolHtmlTransform {
    fn write(&mut self, chunk: &[u8]) -> Result<Bytes> {
        self.rewriter
            .write(chunk)
            .map_err(|e| ProxyError::Rewrite(e.to_string()))?;
        Ok(self.output.take())
    }

    fn end(self: Box<Self>) -> Result<Bytes> {
        let Self { rewriter, output } = *self;
        rewriter
            .end()
            .map_err(|e| ProxyError::Rewrite(e.to_string()))?;
        Ok(output.take())
    }
}

/// Unknown labels and encodings that are not ASCII-compatible fall back to UTF-8.
fn document_encoding(charset: Option<&str>) -> &'static Encoding {
    charset
        .and_then(|label| Encoding::for_label(label.trim().as_bytes()))
        .filter(|encoding| encoding.is_ascii_compatible())
        .unwrap_or(UTF_8)
}

impl MarkupEngine for LolHtmlEngine {
    fn start(
        &self,
        rules: &'static [ElementRule],
        cx: RewriteContext,
        charset: Option<&str>,
    ) -> Box<dyn DocumentTransform> {
        let cx = Arc::new(cx);
        let handlers = rules
            .iter()
            .map(|rule| {
                let cx = Arc::clone(&cx);
                let action = rule.action;
                element!(rule.selector.as_str(), move |el| {
                    let edits = edits_for(action, |name| el.get_attribute(name), &cx);
                    for edit in edits {
                        match edit {
                            Edit::SetAttribute(name, value) => el.set_attribute(name, &value)?,
                            Edit::RemoveAttribute(name) => el.remove_attribute(name),
                            Edit::RemoveElement => el.remove(),
                            Edit::AppendHtml(html) => el.append(&html, ContentType::Html),
                        }
                    }
                    Ok(())
                })
            })
            .collect();

        let output = SharedSink::default();
        let rewriter = HtmlRewriter::new(
            Settings {
                element_content_handlers: handlers,
                encoding: AsciiCompatibleEncoding::new(document_encoding(charset))
                    .unwrap_or_else(AsciiCompatibleEncoding::utf_8),
                adjust_charset_on_meta_tag: charset.is_none(),
                ..Settings::new_send()
            },
            output.clone(),
        );

        Box::new(LolHtmlTransform { rewriter, output })
    }
}
