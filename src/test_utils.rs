//! Test utilities and shared configuration.
//!
//! This module provides common helpers for unit and integration tests,
//! reducing duplication across the codebase.

#[cfg(any(test, feature = "testing"))]
use crate::config::{Config, DEFAULT_USER_AGENT};
#[cfg(any(test, feature = "testing"))]
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
#[cfg(any(test, feature = "testing"))]
use std::sync::Arc;

/// Creates a standard configuration for testing purposes.
///
/// Listens on 127.0.0.1:2568 with the access gate disabled.
#[cfg(any(test, feature = "testing"))]
#[must_use]
pub fn create_test_config() -> Arc<Config> {
    Arc::new(Config {
        listen_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 2568),
        access_password: None,
        public_scheme: "http".to_string(),
        default_user_agent: DEFAULT_USER_AGENT.to_string(),
        app_name: "TestProxy".to_string(),
        log_format: "pretty".to_string(),
    })
}

/// Same as [`create_test_config`] with the access gate enabled.
#[cfg(any(test, feature = "testing"))]
#[must_use]
pub fn create_gated_config(password: &str) -> Arc<Config> {
    let mut config = (*create_test_config()).clone();
    config.access_password = Some(password.to_string());
    Arc::new(config)
}
