//! Request routing.
//!
//! Decides whether a request is answered locally (login, home page, bad
//! target) or resolved to a target and forwarded.

use crate::config::Config;
use crate::core::middleware::{
    GateDecision, ORIGIN_COOKIE_NAME, check_login, find_cookie, is_authorized, session_set_cookie,
};
use crate::core::proxy::origin::{self, ProxyAddress};
use crate::core::proxy::response::{serve_html, serve_redirect, serve_text};
use crate::core::proxy::service::RequestCtx;
use crate::web::ui;
use http::Method;
use pingora::Result;
use pingora::proxy::Session;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Login forms are tiny; anything larger is not a login.
const MAX_LOGIN_BODY: usize = 8 * 1024;

/// Routes requests ahead of the upstream phases.
pub struct Router {
    pub config: Arc<Config>,
}

impl Router {
    /// Creates a new `Router`.
    #[must_use]
    pub const fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    /// Handles an incoming HTTP request.
    ///
    /// Returns `true` when a response was written and the request is done.
    ///
    /// # Errors
    ///
    /// Returns an error if a local response cannot be written.
    pub async fn handle_request(
        &self,
        session: &mut Session,
        ctx: &mut RequestCtx,
    ) -> Result<bool> {
        if let Some(password) = self.config.access_password.as_deref()
            && !is_authorized(&session.req_header().headers, Some(password))
        {
            return self.handle_gate(session, password).await;
        }

        let headers = &session.req_header().headers;
        let proxy_origin = origin::proxy_origin(headers, &self.config);
        let path_and_query = session
            .req_header()
            .uri
            .path_and_query()
            .map_or("/", |pq| pq.as_str());
        let anchor = find_cookie(headers, ORIGIN_COOKIE_NAME);

        let resolved = origin::resolve(
            &proxy_origin,
            path_and_query,
            origin::referer(headers),
            anchor.as_deref(),
        );

        match resolved {
            Ok(address) if address.is_home() => {
                let html = ui::render_home_page(&address.proxy_origin, &self.config);
                serve_html(session, 200, html, None).await
            }
            Ok(address) => {
                Self::record(ctx, address);
                Ok(false)
            }
            Err(e) => {
                debug!(path = %path_and_query, error = %e, "Target resolution failed");
                let text = e.to_string();
                serve_text(session, e.status(), &text).await
            }
        }
    }

    fn record(ctx: &mut RequestCtx, address: ProxyAddress) {
        if let Some(target) = &address.target {
            debug!(target = %target, "Target resolved");
        }
        ctx.address = Some(address);
    }

    async fn handle_gate(&self, session: &mut Session, password: &str) -> Result<bool> {
        let is_login_post = session.req_header().method == Method::POST
            && session.req_header().uri.path() == "/";

        if is_login_post {
            let body = read_body(session).await?;
            if check_login(body.as_deref(), password) == GateDecision::Grant {
                info!(action = "LOGIN", "Access granted");
                let cookie = session_set_cookie(password);
                return serve_redirect(session, "/", Some(&cookie)).await;
            }
            warn!(action = "LOGIN_FAILED", "Rejected access password");
        }

        let html = ui::render_login_page(&self.config);
        serve_html(session, 200, html, None).await
    }
}

async fn read_body(session: &mut Session) -> Result<Option<Vec<u8>>> {
    let mut body = Vec::new();
    while let Some(chunk) = session.read_request_body().await? {
        if body.len() + chunk.len() > MAX_LOGIN_BODY {
            return Ok(None);
        }
        body.extend_from_slice(&chunk);
    }
    Ok(Some(body))
}
