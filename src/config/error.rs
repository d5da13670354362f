//! Error types and result aliases.
//!
//! Defines the core `ProxyError` enumeration and common `Result` type.

use thiserror::Error;

/// Proxy-specific errors.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// No origin could be derived for an origin-relative request.
    #[error("unable to resolve target URL")]
    UnresolvableTarget,

    /// The assembled target does not parse as an absolute http(s) URL.
    #[error("invalid target URL: {0}")]
    InvalidTargetUrl(String),

    /// Connect, DNS or TLS failure while talking to the upstream.
    #[error("upstream unreachable: {target}: {reason}")]
    UpstreamUnreachable { target: String, reason: String },

    /// The streaming markup rewriter rejected the document.
    #[error("markup rewrite failed: {0}")]
    Rewrite(String),
}

impl ProxyError {
    /// HTTP status the error is surfaced with.
    #[must_use]
    pub const fn status(&self) -> u16 {
        match self {
            Self::UnresolvableTarget | Self::InvalidTargetUrl(_) => 400,
            Self::UpstreamUnreachable { .. } | Self::Rewrite(_) => 500,
        }
    }
}

/// Result type alias for `ProxyError`.
pub type Result<T> = std::result::Result<T, ProxyError>;
