//! Middleware components.
//!
//! Includes the access gate and the client-held cookie state.

mod auth;
mod cookies;

pub use auth::{GateDecision, check_login, is_authorized, parse_password_form};
pub use cookies::{
    ORIGIN_COOKIE_MAX_AGE, ORIGIN_COOKIE_NAME, SESSION_COOKIE_MAX_AGE, SESSION_COOKIE_NAME,
    SameSite, find_cookie, format_set_cookie, origin_set_cookie, session_set_cookie,
    strip_proxy_cookies,
};
