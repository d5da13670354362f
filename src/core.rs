//! Core system components.
//!
//! Contains the proxy service, its request phases and the access middleware.

pub mod middleware;
pub mod proxy;
