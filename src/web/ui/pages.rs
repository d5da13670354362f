//! HTML page rendering.
//!
//! Renders the pages the proxy serves itself using loaded templates.

use std::fs;
use std::path::Path;
use tracing::error;

use crate::config::Config;
use std::collections::HashMap;
use std::fmt::Write;
use std::sync::{Arc, OnceLock};

const TEMPLATE_DIR: &str = "templates";
static TEMPLATES: OnceLock<HashMap<String, Arc<str>>> = OnceLock::new();

/// A shortcut card on the home page.
#[derive(Debug, Clone, Copy)]
pub struct Shortcut {
    pub name: &'static str,
    pub url: &'static str,
}

/// Sites listed on the home page.
pub const SHORTCUTS: &[Shortcut] = &[
    Shortcut {
        name: "Brave Search",
        url: "https://search.brave.com",
    },
    Shortcut {
        name: "Wikipedia",
        url: "https://www.wikipedia.org",
    },
    Shortcut {
        name: "Duck AI",
        url: "https://duckduckgo.com/?ia=chat",
    },
    Shortcut {
        name: "GitHub Trending",
        url: "https://github.com/trending",
    },
    Shortcut {
        name: "Time",
        url: "https://time.com",
    },
    Shortcut {
        name: "Reddit",
        url: "https://www.reddit.com",
    },
];

/// Pre-loads all templates into memory.
pub fn preload_templates() {
    let _ = get_template_map();
}

fn get_template_map() -> &'static HashMap<String, Arc<str>> {
    TEMPLATES.get_or_init(|| {
        let mut m = HashMap::new();
        for name in &["home.html", "login.html"] {
            let path = Path::new(TEMPLATE_DIR).join(name);
            match fs::read_to_string(&path) {
                Ok(content) => {
                    m.insert((*name).to_string(), Arc::from(content));
                }
                Err(e) => {
                    error!(file = name, error = %e, "Failed to load UI template, using inline fallback");
                }
            }
        }
        m
    })
}

fn load_template(filename: &str) -> Option<Arc<str>> {
    get_template_map().get(filename).cloned()
}

fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Renders the navigation page served for the empty target.
#[must_use]
pub fn render_home_page(proxy_origin: &str, config: &Config) -> String {
    let template = load_template("home.html").map_or_else(
        || {
            "<!DOCTYPE html><html><head><title>{{APP_NAME}}</title></head><body>\
             <h1>{{APP_NAME}}</h1>{{SITE_CARDS}}\
             <script>var proxyOrigin = {{PROXY_ORIGIN_JS}};</script></body></html>"
                .to_string()
        },
        |t: Arc<str>| t.to_string(),
    );

    let mut cards = String::new();
    for site in SHORTCUTS {
        let _ = writeln!(
            cards,
            r#"            <a href="{}/{}" class="card"><span class="card-name">{}</span></a>"#,
            escape_html(proxy_origin),
            escape_html(site.url),
            escape_html(site.name),
        );
    }

    let origin_js = serde_json::Value::from(proxy_origin)
        .to_string()
        .replace("</", "<\\/");

    template
        .replace("{{APP_NAME}}", &escape_html(&config.app_name))
        .replace("{{SITE_CARDS}}", &cards)
        .replace("{{PROXY_ORIGIN_JS}}", &origin_js)
}

/// Renders the access password form.
#[must_use]
pub fn render_login_page(config: &Config) -> String {
    let template = load_template("login.html").map_or_else(
        || {
            "<!DOCTYPE html><html><head><title>{{APP_NAME}}</title></head><body>\
             <form method=\"POST\" action=\"/\"><input type=\"password\" name=\"password\" required>\
             <button type=\"submit\">Continue</button></form></body></html>"
                .to_string()
        },
        |t: Arc<str>| t.to_string(),
    );

    template.replace("{{APP_NAME}}", &escape_html(&config.app_name))
}
