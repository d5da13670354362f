//! Content rewriting.
//!
//! URL remapping rules, the element handler table, the injected navigation
//! interceptor and the streaming markup engine that applies them.

mod engine;
mod inject;
mod rules;
mod url;

pub use engine::{DocumentTransform, LolHtmlEngine, MarkupEngine};
pub use inject::{INTERCEPTOR_MARKER, interceptor_script};
pub use rules::{
    Edit, ElementAction, ElementRule, RewriteRule, URL_REWRITE_RULES, edits_for, element_rules,
};
pub use url::{rewrite_meta_refresh, rewrite_url};

/// The two origins every rewrite of one document is relative to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteContext {
    pub proxy_origin: String,
    pub target_origin: String,
}

impl RewriteContext {
    #[must_use]
    pub fn new(proxy_origin: &str, target_origin: &str) -> Self {
        Self {
            proxy_origin: proxy_origin.to_string(),
            target_origin: target_origin.to_string(),
        }
    }
}
