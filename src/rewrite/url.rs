//! URL remapping rules.
//!
//! The proxy path is the target URL itself: `proxyOrigin/<absolute URL>`.

use std::borrow::Cow;

/// Maps a URL found in upstream content onto the proxy origin.
///
/// Values already on the proxy origin, relative paths and non-http schemes
/// (`javascript:`, `data:`, `mailto:`) are returned unchanged.
#[must_use]
pub fn rewrite_url<'a>(value: &'a str, proxy_origin: &str, target_origin: &str) -> Cow<'a, str> {
    if value.starts_with(proxy_origin) {
        Cow::Borrowed(value)
    } else if value.starts_with("http") {
        Cow::Owned(format!("{proxy_origin}/{value}"))
    } else if value.starts_with("//") {
        Cow::Owned(format!("{proxy_origin}/https:{value}"))
    } else if value.starts_with('/') {
        Cow::Owned(format!("{proxy_origin}/{target_origin}{value}"))
    } else {
        Cow::Borrowed(value)
    }
}

/// Rewrites the target of a `<meta http-equiv="refresh">` content value.
///
/// Returns `None` when the value does not contain exactly one `url=` marker.
#[must_use]
pub fn rewrite_meta_refresh(content: &str, proxy_origin: &str, target_origin: &str) -> Option<String> {
    let lower = content.to_ascii_lowercase();
    let mut markers = lower.match_indices("url=");
    let (pos, _) = markers.next()?;
    if markers.next().is_some() {
        return None;
    }

    let prefix = &content[..pos];
    let target = content[pos + 4..].trim();
    let rewritten = rewrite_url(target, proxy_origin, target_origin);
    Some(format!("{prefix}url={rewritten}"))
}
