//! Access gate.
//!
//! A single shared password. Possession is proven by echoing it back in the
//! session cookie; there is no account model.

use super::cookies::{SESSION_COOKIE_NAME, find_cookie};
use http::HeaderMap;
use percent_encoding::percent_decode_str;

/// Outcome of a request that failed the session cookie check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Login form submitted with the right password.
    Grant,
    /// Anything else: show the login page.
    Login,
}

/// Checks the session cookie against the configured password.
#[must_use]
pub fn is_authorized(headers: &HeaderMap, password: Option<&str>) -> bool {
    let Some(password) = password else {
        return true;
    };
    find_cookie(headers, SESSION_COOKIE_NAME).is_some_and(|v| v == password)
}

/// Decides what to do with a request that failed the cookie check.
///
/// `form_body` is the request body when the request is a login submission.
#[must_use]
pub fn check_login(form_body: Option<&[u8]>, password: &str) -> GateDecision {
    match form_body.and_then(parse_password_form) {
        Some(submitted) if submitted == password => GateDecision::Grant,
        _ => GateDecision::Login,
    }
}

/// Extracts the `password` field of a URL-encoded form.
#[must_use]
pub fn parse_password_form(body: &[u8]) -> Option<String> {
    let body_str = String::from_utf8_lossy(body);

    body_str.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        let dk = percent_decode_str(&k.replace('+', " "))
            .decode_utf8_lossy()
            .into_owned();
        (dk == "password").then(|| {
            percent_decode_str(&v.replace('+', " "))
                .decode_utf8_lossy()
                .into_owned()
        })
    })
}
