//! Proxy service logic.
//!
//! Wires routing, upstream request construction, response sanitizing and
//! streaming HTML rewriting into pingora's request phases.

use crate::config::{Config, ProxyError};
use crate::core::proxy::forward::{method_allows_body, prepare_upstream_request, upstream_peer_for};
use crate::core::proxy::headers::{BodyPlan, content_charset, sanitize_response};
use crate::core::proxy::origin::ProxyAddress;
use crate::core::proxy::response::serve_text;
use crate::core::proxy::router::Router;
use crate::rewrite::{DocumentTransform, MarkupEngine, RewriteContext, element_rules};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use http::Method;
use pingora::http::{RequestHeader, ResponseHeader};
use pingora::proxy::{FailToProxy, ProxyHttp, Session};
use pingora::upstreams::peer::HttpPeer;
use pingora::{Error, ErrorSource, ErrorType, Result};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, warn};

/// Context for a single request.
#[derive(Default)]
pub struct RequestCtx {
    pub address: Option<ProxyAddress>,
    pub body_plan: BodyPlan,
    pub rewriter: Option<Mutex<Box<dyn DocumentTransform>>>,
}

impl RequestCtx {
    fn target_label(&self) -> String {
        self.address
            .as_ref()
            .and_then(|a| a.target.as_ref())
            .map_or_else(|| "-".to_string(), ToString::to_string)
    }
}

/// Main proxy service implementing `ProxyHttp`.
pub struct SiteProxy {
    config: Arc<Config>,
    router: Router,
    engine: Arc<dyn MarkupEngine>,
}

impl SiteProxy {
    /// Creates a new `SiteProxy` service using `engine` for HTML rewriting.
    pub fn new(config: Arc<Config>, engine: Arc<dyn MarkupEngine>) -> Self {
        let router = Router::new(config.clone());
        Self {
            config,
            router,
            engine,
        }
    }

    fn rewrite_error(e: ProxyError) -> Box<Error> {
        Error::because(ErrorType::InternalError, "html rewrite failed", e)
    }

    fn missing_target() -> Box<Error> {
        Error::explain(ErrorType::InternalError, "request reached upstream phase without a target")
    }
}

#[async_trait]
impl ProxyHttp for SiteProxy {
    type CTX = RequestCtx;

    fn new_ctx(&self) -> Self::CTX {
        RequestCtx::default()
    }

    async fn request_filter(&self, session: &mut Session, ctx: &mut Self::CTX) -> Result<bool> {
        self.router.handle_request(session, ctx).await
    }

    async fn upstream_peer(
        &self,
        _session: &mut Session,
        ctx: &mut Self::CTX,
    ) -> Result<Box<HttpPeer>> {
        let target = ctx
            .address
            .as_ref()
            .and_then(|a| a.target.as_ref())
            .ok_or_else(Self::missing_target)?;

        match upstream_peer_for(target).await {
            Ok(peer) => Ok(Box::new(peer)),
            Err(e) => {
                warn!(target = %target, error = %e, "Upstream resolution failed");
                Err(Error::explain(ErrorType::ConnectError, e.to_string()))
            }
        }
    }

    fn fail_to_connect(
        &self,
        _session: &mut Session,
        peer: &HttpPeer,
        ctx: &mut Self::CTX,
        mut e: Box<Error>,
    ) -> Box<Error> {
        warn!(target = %ctx.target_label(), peer = %peer, error = %e, "Upstream connect failed");
        e.set_retry(false);
        e
    }

    async fn upstream_request_filter(
        &self,
        _session: &mut Session,
        upstream_request: &mut RequestHeader,
        ctx: &mut Self::CTX,
    ) -> Result<()> {
        let address = ctx.address.as_ref().ok_or_else(Self::missing_target)?;
        let target = address.target.as_ref().ok_or_else(Self::missing_target)?;
        let target_origin = target.origin().ascii_serialization();

        prepare_upstream_request(
            upstream_request,
            target,
            &target_origin,
            &self.config.default_user_agent,
        )
    }

    async fn request_body_filter(
        &self,
        session: &mut Session,
        body: &mut Option<Bytes>,
        _end_of_stream: bool,
        _ctx: &mut Self::CTX,
    ) -> Result<()> {
        if !method_allows_body(&session.req_header().method) {
            *body = None;
        }
        Ok(())
    }

    async fn response_filter(
        &self,
        session: &mut Session,
        upstream_response: &mut ResponseHeader,
        ctx: &mut Self::CTX,
    ) -> Result<()> {
        let Some(address) = ctx.address.as_ref() else {
            return Ok(());
        };
        let Some(target_origin) = address.target_origin() else {
            return Ok(());
        };

        let cx = RewriteContext::new(&address.proxy_origin, &target_origin);
        let expects_body = session.req_header().method != Method::HEAD;
        ctx.body_plan = sanitize_response(upstream_response, &cx, expects_body)?;

        if ctx.body_plan == BodyPlan::RewriteHtml {
            debug!(target = %target_origin, status = upstream_response.status.as_u16(), "Rewriting HTML response");
            let charset = content_charset(upstream_response);
            ctx.rewriter = Some(Mutex::new(self.engine.start(
                element_rules(),
                cx,
                charset.as_deref(),
            )));
        }

        Ok(())
    }

    fn response_body_filter(
        &self,
        _session: &mut Session,
        body: &mut Option<Bytes>,
        end_of_stream: bool,
        ctx: &mut Self::CTX,
    ) -> Result<Option<Duration>> {
        let Some(rewriter) = ctx.rewriter.as_mut() else {
            return Ok(None);
        };

        let mut out = BytesMut::new();
        if let Some(chunk) = body.take() {
            let transform = rewriter.get_mut().unwrap_or_else(PoisonError::into_inner);
            out.extend_from_slice(&transform.write(&chunk).map_err(Self::rewrite_error)?);
        }

        if end_of_stream && let Some(rewriter) = ctx.rewriter.take() {
            let transform = rewriter.into_inner().unwrap_or_else(PoisonError::into_inner);
            out.extend_from_slice(&transform.end().map_err(Self::rewrite_error)?);
        }

        if !out.is_empty() {
            *body = Some(out.freeze());
        }
        Ok(None)
    }

    async fn fail_to_proxy(
        &self,
        session: &mut Session,
        e: &Error,
        ctx: &mut Self::CTX,
    ) -> FailToProxy {
        if matches!(e.esource(), ErrorSource::Downstream) {
            debug!(target = %ctx.target_label(), error = %e, "Client went away");
            return FailToProxy {
                error_code: 0,
                can_reuse_downstream: false,
            };
        }

        let target = ctx.target_label();
        warn!(target = %target, error = %e, "Proxying failed");

        let error_code = 500;
        if session.response_written().is_none() {
            let cause = e.root_cause().to_string();
            let text = format!("proxy error: {target}: {cause}");
            if let Err(write_err) = serve_text(session, error_code, &text).await {
                debug!(error = %write_err, "Failed to write error response");
            }
        }

        FailToProxy {
            error_code,
            can_reuse_downstream: false,
        }
    }

    async fn logging(&self, session: &mut Session, e: Option<&Error>, ctx: &mut Self::CTX) {
        let status = session.response_written().map_or(0, |r| r.status.as_u16());
        let method = session.req_header().method.as_str();
        let target = ctx.target_label();
        let rewritten = ctx.body_plan == BodyPlan::RewriteHtml;

        if let Some(e) = e {
            debug!(http_method = %method, target = %target, status, error = %e, "Request failed");
        } else {
            debug!(http_method = %method, target = %target, status, rewritten, "Request completed");
        }
    }
}
