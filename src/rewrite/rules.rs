//! Selector tables and element edits.
//!
//! Rules are static data. Applying one is a pure function of the element's
//! attributes and the per-document `RewriteContext`; the markup engine only
//! has to read attributes and carry out the returned edits.

use super::RewriteContext;
use super::inject::{INTERCEPTOR_MARKER, interceptor_script};
use super::url::{rewrite_meta_refresh, rewrite_url};
use std::sync::OnceLock;

/// A markup selector paired with the attribute carrying a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewriteRule {
    pub selector: &'static str,
    pub attribute: &'static str,
}

const fn url_rule(selector: &'static str, attribute: &'static str) -> RewriteRule {
    RewriteRule {
        selector,
        attribute,
    }
}

/// URL-bearing attributes rewritten through the proxy.
pub const URL_REWRITE_RULES: &[RewriteRule] = &[
    url_rule("a[href]", "href"),
    url_rule("link[href]", "href"),
    url_rule("form[action]", "action"),
    url_rule("img[src]", "src"),
    url_rule("img[srcset]", "srcset"),
    url_rule("script[src]", "src"),
    url_rule("iframe[src]", "src"),
    url_rule("source[src]", "src"),
    url_rule("source[srcset]", "srcset"),
    url_rule("video[src]", "src"),
    url_rule("audio[src]", "src"),
    url_rule("track[src]", "src"),
    url_rule("[data-src]", "data-src"),
    url_rule("[data-href]", "data-href"),
    url_rule("[data-url]", "data-url"),
];

/// Tags whose subresource-integrity constraints are dropped.
const INTEGRITY_TAGS: [&str; 3] = ["script", "link", "img"];

/// What to do with a matched element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementAction {
    /// Append the navigation interceptor to `<head>`.
    InjectInterceptor,
    /// Rewrite the URL part of a meta refresh `content`.
    RewriteMetaRefresh,
    /// Drop `<meta name="referrer">`.
    RemoveReferrerPolicy,
    /// Remove an attribute outright.
    StripAttribute(&'static str),
    /// Rewrite a URL-bearing attribute.
    RewriteUrl(&'static str),
}

/// A selector bound to an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRule {
    pub selector: String,
    pub action: ElementAction,
}

impl From<&RewriteRule> for ElementRule {
    fn from(rule: &RewriteRule) -> Self {
        Self {
            selector: rule.selector.to_string(),
            action: ElementAction::RewriteUrl(rule.attribute),
        }
    }
}

static ELEMENT_RULES: OnceLock<Vec<ElementRule>> = OnceLock::new();

/// The full handler table in registration order.
///
/// The `<head>` interceptor comes first so it is in place before anything
/// else touches the head's children.
pub fn element_rules() -> &'static [ElementRule] {
    ELEMENT_RULES.get_or_init(|| {
        let mut rules = vec![
            ElementRule {
                selector: "head".to_string(),
                action: ElementAction::InjectInterceptor,
            },
            ElementRule {
                selector: "meta[http-equiv]".to_string(),
                action: ElementAction::RewriteMetaRefresh,
            },
            ElementRule {
                selector: "meta[name]".to_string(),
                action: ElementAction::RemoveReferrerPolicy,
            },
        ];
        rules.extend(URL_REWRITE_RULES.iter().map(ElementRule::from));
        for tag in INTEGRITY_TAGS {
            for attribute in ["integrity", "crossorigin"] {
                rules.push(ElementRule {
                    selector: format!("{tag}[{attribute}]"),
                    action: ElementAction::StripAttribute(attribute),
                });
            }
        }
        rules
    })
}

/// A change to apply to the matched element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    SetAttribute(&'static str, String),
    RemoveAttribute(&'static str),
    RemoveElement,
    AppendHtml(String),
}

/// Computes the edits an action implies for one element.
///
/// `attribute` looks up an attribute value on the element being visited.
pub fn edits_for<F>(action: ElementAction, attribute: F, cx: &RewriteContext) -> Vec<Edit>
where
    F: Fn(&str) -> Option<String>,
{
    match action {
        ElementAction::InjectInterceptor => {
            if attribute(INTERCEPTOR_MARKER).is_some() {
                return Vec::new();
            }
            vec![
                Edit::SetAttribute(INTERCEPTOR_MARKER, String::new()),
                Edit::AppendHtml(interceptor_script(cx)),
            ]
        }
        ElementAction::RewriteMetaRefresh => {
            let is_refresh = attribute("http-equiv")
                .is_some_and(|v| v.trim().eq_ignore_ascii_case("refresh"));
            if !is_refresh {
                return Vec::new();
            }
            attribute("content")
                .and_then(|content| {
                    let rewritten =
                        rewrite_meta_refresh(&content, &cx.proxy_origin, &cx.target_origin)?;
                    (rewritten != content).then_some(rewritten)
                })
                .map(|value| vec![Edit::SetAttribute("content", value)])
                .unwrap_or_default()
        }
        ElementAction::RemoveReferrerPolicy => {
            if attribute("name").is_some_and(|v| v.trim().eq_ignore_ascii_case("referrer")) {
                vec![Edit::RemoveElement]
            } else {
                Vec::new()
            }
        }
        ElementAction::StripAttribute(name) => {
            if attribute(name).is_some() {
                vec![Edit::RemoveAttribute(name)]
            } else {
                Vec::new()
            }
        }
        ElementAction::RewriteUrl(name) => attribute(name)
            .and_then(|value| {
                let rewritten = rewrite_url(&value, &cx.proxy_origin, &cx.target_origin);
                (rewritten != value).then(|| rewritten.into_owned())
            })
            .map(|value| vec![Edit::SetAttribute(name, value)])
            .unwrap_or_default(),
    }
}
