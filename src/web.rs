//! Pages served by the proxy itself.

pub mod ui;
