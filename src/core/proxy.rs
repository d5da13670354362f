//! Proxy service implementation.
//!
//! Resolves the target from the request path, forwards an allow-listed
//! request upstream, sanitizes the response and streams HTML through the
//! rewriter.

pub mod forward;
pub mod headers;
pub mod origin;
pub mod response;
pub mod router;
pub mod service;

pub use origin::{ProxyAddress, resolve};
pub use service::SiteProxy;
