//! Target origin resolution.
//!
//! The request path is the target URL. Origin-relative requests (a page on
//! the target asking for `/style.css`) borrow their origin from the Referer
//! or, failing that, from the `origin-anchor` cookie.

use crate::config::{Config, ProxyError, Result};
use http::HeaderMap;
use http::header::{HOST, REFERER};
use url::Url;

/// Where a request is going, relative to where it arrived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyAddress {
    /// `scheme://host[:port]` the client used to reach the proxy.
    pub proxy_origin: String,
    /// Absolute target URL; `None` for the home page.
    pub target: Option<Url>,
}

impl ProxyAddress {
    #[must_use]
    pub const fn is_home(&self) -> bool {
        self.target.is_none()
    }

    /// `scheme://host[:port]` of the target.
    #[must_use]
    pub fn target_origin(&self) -> Option<String> {
        self.target.as_ref().map(|u| u.origin().ascii_serialization())
    }

    /// Path and query of the target, as sent upstream.
    #[must_use]
    pub fn target_path(&self) -> String {
        self.target.as_ref().map_or_else(
            || "/".to_string(),
            |u| match u.query() {
                Some(q) => format!("{}?{q}", u.path()),
                None => u.path().to_string(),
            },
        )
    }
}

/// Derives the proxy origin from the request's `Host` and forwarding headers.
#[must_use]
pub fn proxy_origin(headers: &HeaderMap, config: &Config) -> String {
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| v.eq_ignore_ascii_case("http") || v.eq_ignore_ascii_case("https"))
        .map_or_else(|| config.public_scheme.clone(), str::to_ascii_lowercase);

    let host = headers
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map_or_else(|| config.listen_addr.to_string(), str::to_string);

    format!("{scheme}://{host}")
}

/// Resolves the target of a request.
///
/// `path_and_query` is the request target as received; `referer` and
/// `anchor_cookie` are the fallbacks for origin-relative paths.
///
/// # Errors
///
/// `UnresolvableTarget` when no origin can be derived, `InvalidTargetUrl`
/// when the assembled target is not an absolute http(s) URL.
pub fn resolve(
    proxy_origin: &str,
    path_and_query: &str,
    referer: Option<&str>,
    anchor_cookie: Option<&str>,
) -> Result<ProxyAddress> {
    let path_and_query = path_and_query
        .strip_prefix(proxy_origin)
        .unwrap_or(path_and_query);
    let candidate = path_and_query.strip_prefix('/').unwrap_or(path_and_query);

    let home = || ProxyAddress {
        proxy_origin: proxy_origin.to_string(),
        target: None,
    };
    if candidate.is_empty() || candidate == "/" {
        return Ok(home());
    }

    let assembled = if candidate.starts_with("http") {
        candidate.to_string()
    } else if let Some(anchor) = referer
        .and_then(|r| origin_from_referer(r, proxy_origin))
        .or_else(|| anchor_cookie.and_then(parse_origin))
    {
        format!("{anchor}/{candidate}")
    } else if candidate.contains('.') {
        format!("https://{candidate}")
    } else {
        return Err(ProxyError::UnresolvableTarget);
    };

    let target = Url::parse(&assembled).map_err(|_| ProxyError::InvalidTargetUrl(assembled.clone()))?;
    if !matches!(target.scheme(), "http" | "https") {
        return Err(ProxyError::InvalidTargetUrl(assembled));
    }

    Ok(ProxyAddress {
        proxy_origin: proxy_origin.to_string(),
        target: Some(target),
    })
}

/// Extracts the target origin encoded in a Referer that points at the proxy.
fn origin_from_referer(referer: &str, proxy_origin: &str) -> Option<String> {
    let embedded = referer.strip_prefix(proxy_origin)?;
    parse_origin(embedded.strip_prefix('/').unwrap_or(embedded))
}

/// Parses an absolute http(s) URL down to its origin.
fn parse_origin(value: &str) -> Option<String> {
    let url = Url::parse(value).ok()?;
    matches!(url.scheme(), "http" | "https").then(|| url.origin().ascii_serialization())
}

/// Reads the request `Referer` as a string.
#[must_use]
pub fn referer(headers: &HeaderMap) -> Option<&str> {
    headers.get(REFERER).and_then(|v| v.to_str().ok())
}
