//! Response header sanitizing.
//!
//! Removes headers that stop a page from working under the proxy origin,
//! points redirects and cookies at the proxy, and decides whether the body
//! goes through the markup rewriter.

use crate::core::middleware::origin_set_cookie;
use crate::rewrite::{RewriteContext, rewrite_url};
use pingora::Result;
use pingora::http::ResponseHeader;

/// Upstream headers that are always removed.
pub const STRIPPED_RESPONSE_HEADERS: [&str; 8] = [
    "Content-Security-Policy",
    "Content-Security-Policy-Report-Only",
    "X-Frame-Options",
    "Referrer-Policy",
    "X-Content-Type-Options",
    "Content-Encoding",
    "Source-Map",
    "X-SourceMap",
];

/// How the response body is forwarded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BodyPlan {
    /// Bytes go to the client unmodified.
    #[default]
    Passthrough,
    /// Bytes go through the streaming markup rewriter.
    RewriteHtml,
}

/// Applies the permissive CORS headers every proxied response carries.
///
/// # Errors
///
/// Returns an error if header insertion fails.
pub fn apply_cors(response: &mut ResponseHeader) -> Result<()> {
    response.insert_header("Access-Control-Allow-Origin", "*")?;
    response.insert_header(
        "Access-Control-Allow-Methods",
        "GET, POST, PUT, DELETE, OPTIONS, PATCH",
    )?;
    response.insert_header("Access-Control-Allow-Headers", "*")?;
    Ok(())
}

/// Removes every `Domain` attribute from a `Set-Cookie` value.
#[must_use]
pub fn strip_cookie_domain(set_cookie: &str) -> String {
    let mut parts = set_cookie.split(';');
    let mut kept: Vec<&str> = parts.next().map(str::trim).into_iter().collect();
    kept.extend(parts.map(str::trim).filter(|attr| {
        let name = attr.split_once('=').map_or(*attr, |(k, _)| k).trim();
        !attr.is_empty() && !name.eq_ignore_ascii_case("domain")
    }));
    kept.join("; ")
}

fn is_html(response: &ResponseHeader) -> bool {
    response
        .headers
        .get("Content-Type")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.to_ascii_lowercase().contains("text/html"))
}

/// The `charset` parameter of the response `Content-Type`, unquoted.
#[must_use]
pub fn content_charset(response: &ResponseHeader) -> Option<String> {
    let content_type = response.headers.get("Content-Type")?.to_str().ok()?;
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"').to_string())
            .filter(|v| !v.is_empty())
    })
}

/// Whether a response with this status can have a body at all.
#[must_use]
pub fn status_has_body(status: u16) -> bool {
    !matches!(status, 100..=199 | 204 | 304)
}

/// Sanitizes an upstream response header in place.
///
/// `expects_body` is false for HEAD requests; such responses are never
/// re-framed.
///
/// # Errors
///
/// Returns an error if a header cannot be written.
pub fn sanitize_response(
    response: &mut ResponseHeader,
    cx: &RewriteContext,
    expects_body: bool,
) -> Result<BodyPlan> {
    apply_cors(response)?;

    for name in STRIPPED_RESPONSE_HEADERS {
        response.remove_header(name);
    }

    let location = response
        .headers
        .get("Location")
        .and_then(|v| v.to_str().ok())
        .map(|v| rewrite_url(v, &cx.proxy_origin, &cx.target_origin).into_owned());
    if let Some(location) = location {
        response.insert_header("Location", location)?;
    }

    let cookies: Vec<String> = response
        .headers
        .get_all("Set-Cookie")
        .iter()
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
        .collect();
    response.remove_header("Set-Cookie");
    for cookie in &cookies {
        response.append_header("Set-Cookie", strip_cookie_domain(cookie))?;
    }

    if !is_html(response) {
        return Ok(BodyPlan::Passthrough);
    }

    response.append_header("Set-Cookie", origin_set_cookie(&cx.target_origin))?;
    response.remove_header("Content-Length");

    if expects_body && status_has_body(response.status.as_u16()) {
        response.insert_header("Transfer-Encoding", "chunked")?;
        Ok(BodyPlan::RewriteHtml)
    } else {
        Ok(BodyPlan::Passthrough)
    }
}
