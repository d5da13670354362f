//! Library definitions.
//!
//! Exports core modules, types, and the main proxy service implementation.

pub mod config;
pub mod core;
pub mod rewrite;
pub mod web;

#[cfg(any(test, feature = "testing"))]
pub mod test_utils;
pub use config::{Config, ProxyError, Result};
pub use crate::core::middleware::{ORIGIN_COOKIE_NAME, SESSION_COOKIE_NAME};
pub use crate::core::proxy::{ProxyAddress, SiteProxy, resolve};
pub use rewrite::{LolHtmlEngine, MarkupEngine, RewriteContext, rewrite_url};
pub use web::ui::preload_templates;
