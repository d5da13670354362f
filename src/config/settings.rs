//! Configuration settings.
//!
//! Defines the main `Config` struct and environment variable loading logic.

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:2568";

/// Sent upstream when the client did not identify itself.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

fn get_env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn get_env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Application configuration loaded from environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the proxy listens on.
    pub listen_addr: SocketAddr,
    /// Access password; the gate is disabled when unset.
    pub access_password: Option<String>,
    /// Scheme of the public proxy origin ("http" or "https").
    pub public_scheme: String,
    /// User-Agent forwarded when the client sent none.
    pub default_user_agent: String,
    /// Application name for page branding.
    pub app_name: String,
    /// Logging format: "json" or "pretty".
    pub log_format: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// # Panics
    ///
    /// Panics if `LISTEN_ADDR` is not a valid socket address or `PORT` is not
    /// a valid port number.
    #[must_use]
    pub fn from_env() -> Arc<Self> {
        let mut listen_addr: SocketAddr = get_env_or("LISTEN_ADDR", DEFAULT_LISTEN_ADDR)
            .parse()
            .expect("LISTEN_ADDR must be a valid socket address");
        if let Some(port) = get_env_opt("PORT") {
            listen_addr.set_port(port.parse().expect("PORT must be a valid port number"));
        }

        let public_scheme = normalize_scheme(&get_env_or("PUBLIC_SCHEME", "http"));

        Arc::new(Self {
            listen_addr,
            access_password: get_env_opt("ACCESS_PASSWORD"),
            public_scheme,
            default_user_agent: get_env_or("DEFAULT_USER_AGENT", DEFAULT_USER_AGENT),
            app_name: get_env_or("APP_NAME", "SiteProxy"),
            log_format: get_env_or("LOG_FORMAT", "json"),
        })
    }

    /// Whether requests must present the access cookie.
    #[must_use]
    pub const fn gate_enabled(&self) -> bool {
        self.access_password.is_some()
    }
}

fn normalize_scheme(raw: &str) -> String {
    if raw.eq_ignore_ascii_case("https") {
        "https".to_string()
    } else {
        "http".to_string()
    }
}
