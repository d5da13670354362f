//! UI rendering.
//!
//! Loads HTML templates from the `templates/` directory and injects dynamic content.

mod pages;

pub use pages::{SHORTCUTS, Shortcut, preload_templates, render_home_page, render_login_page};
