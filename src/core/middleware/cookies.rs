//! Client-held proxy state.
//!
//! The proxy keeps no server-side sessions. The access password echo and the
//! last resolved target origin live in two cookies on the client.

use http::HeaderMap;
use percent_encoding::percent_decode_str;

/// Echo of the access password, checked by the gate.
pub const SESSION_COOKIE_NAME: &str = "session-auth";
/// Last target origin an HTML page was served for.
pub const ORIGIN_COOKIE_NAME: &str = "origin-anchor";

/// Seven days.
pub const SESSION_COOKIE_MAX_AGE: u64 = 86_400 * 7;
/// Ten days.
pub const ORIGIN_COOKIE_MAX_AGE: u64 = 86_400 * 10;

/// `SameSite` attribute values used by the proxy cookies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Lax,
    None,
}

impl SameSite {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Lax => "Lax",
            Self::None => "None",
        }
    }
}

#[must_use]
pub fn format_set_cookie(name: &str, value: &str, max_age: u64, same_site: SameSite) -> String {
    format!(
        "{name}={value}; Path=/; Secure; HttpOnly; SameSite={}; Max-Age={max_age}",
        same_site.as_str()
    )
}

/// `Set-Cookie` value granting access after a successful login.
#[must_use]
pub fn session_set_cookie(password: &str) -> String {
    format_set_cookie(
        SESSION_COOKIE_NAME,
        password,
        SESSION_COOKIE_MAX_AGE,
        SameSite::Lax,
    )
}

/// `Set-Cookie` value remembering the target origin. `SameSite=None` keeps it
/// attached when another site navigates into the proxy.
#[must_use]
pub fn origin_set_cookie(target_origin: &str) -> String {
    format_set_cookie(
        ORIGIN_COOKIE_NAME,
        target_origin,
        ORIGIN_COOKIE_MAX_AGE,
        SameSite::None,
    )
}

/// Finds a cookie across every `Cookie` header of a request.
#[must_use]
pub fn find_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(http::header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|pair| {
            let (k, v) = pair.trim().split_once('=')?;
            (k == name).then(|| percent_decode_str(v).decode_utf8_lossy().into_owned())
        })
}

/// Removes the proxy's own cookies from a `Cookie` header value.
///
/// Returns `None` when nothing is left to forward.
#[must_use]
pub fn strip_proxy_cookies(cookie_header: &str) -> Option<String> {
    let kept: Vec<&str> = cookie_header
        .split(';')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .filter(|pair| {
            let name = pair.split_once('=').map_or(*pair, |(k, _)| k);
            name != SESSION_COOKIE_NAME && name != ORIGIN_COOKIE_NAME
        })
        .collect();

    if kept.is_empty() {
        None
    } else {
        Some(kept.join("; "))
    }
}
