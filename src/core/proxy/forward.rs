//! Upstream request construction.
//!
//! Only an allow-list of client headers reaches the target. Everything that
//! identifies the proxy hop (Host, Referer, Origin) is pointed at the target
//! origin, and compression is disabled so HTML can be rewritten in flight.

use crate::config::{ProxyError, Result};
use crate::core::middleware::strip_proxy_cookies;
use http::Method;
use http::header::{self, HeaderName};
use pingora::http::RequestHeader;
use pingora::upstreams::peer::HttpPeer;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::debug;
use url::{Host, Url};

/// Client headers forwarded upstream.
pub const FORWARDED_HEADERS: [HeaderName; 6] = [
    header::USER_AGENT,
    header::ACCEPT,
    header::ACCEPT_LANGUAGE,
    header::COOKIE,
    header::AUTHORIZATION,
    header::CONTENT_TYPE,
];

/// Framing headers kept when the request carries a body.
const BODY_FRAMING_HEADERS: [HeaderName; 2] = [header::CONTENT_LENGTH, header::TRANSFER_ENCODING];

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Whether a request body is forwarded for `method`.
#[must_use]
pub fn method_allows_body(method: &Method) -> bool {
    !matches!(*method, Method::GET | Method::HEAD)
}

/// `host[:port]` for the upstream `Host` header.
fn host_header(target: &Url) -> String {
    let host = target.host_str().unwrap_or_default();
    match target.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    }
}

/// Rewrites the inbound request header into the upstream request.
///
/// # Errors
///
/// Returns an error if a header value or the target path cannot be encoded.
pub fn prepare_upstream_request(
    req: &mut RequestHeader,
    target: &Url,
    target_origin: &str,
    default_user_agent: &str,
) -> pingora::Result<()> {
    let keep_framing = method_allows_body(&req.method);

    let cookie = req
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect::<Vec<_>>()
        .join("; ");

    let dropped: Vec<HeaderName> = req
        .headers
        .keys()
        .filter(|name| {
            !FORWARDED_HEADERS.contains(*name)
                && !(keep_framing && BODY_FRAMING_HEADERS.contains(*name))
        })
        .cloned()
        .collect();
    for name in &dropped {
        req.remove_header(name);
    }

    req.remove_header(&header::COOKIE);
    if let Some(cookie) = strip_proxy_cookies(&cookie) {
        req.insert_header(header::COOKIE, cookie)?;
    }

    if !req.headers.contains_key(header::USER_AGENT) {
        req.insert_header(header::USER_AGENT, default_user_agent)?;
    }

    req.insert_header(header::HOST, host_header(target))?;
    req.insert_header(header::REFERER, target_origin)?;
    req.insert_header(header::ORIGIN, target_origin)?;
    req.insert_header(header::ACCEPT_ENCODING, "identity")?;

    let mut path = target.path().to_string();
    if let Some(query) = target.query() {
        path.push('?');
        path.push_str(query);
    }
    let uri = path.parse::<http::Uri>().map_err(|e| {
        pingora::Error::because(
            pingora::ErrorType::InvalidHTTPHeader,
            format!("target path {path}"),
            e,
        )
    })?;
    req.set_uri(uri);

    Ok(())
}

/// Builds the upstream peer for a target, resolving its host asynchronously.
///
/// # Errors
///
/// Returns `UpstreamUnreachable` if the host does not resolve.
pub async fn upstream_peer_for(target: &Url) -> Result<HttpPeer> {
    let unreachable = |reason: String| ProxyError::UpstreamUnreachable {
        target: target.origin().ascii_serialization(),
        reason,
    };

    let port = target
        .port_or_known_default()
        .ok_or_else(|| unreachable("no port for scheme".to_string()))?;
    let tls = target.scheme() == "https";

    let (addr, sni) = match target.host() {
        Some(Host::Ipv4(ip)) => (SocketAddr::from((ip, port)), String::new()),
        Some(Host::Ipv6(ip)) => (SocketAddr::from((ip, port)), String::new()),
        Some(Host::Domain(domain)) => {
            let addr = tokio::net::lookup_host((domain, port))
                .await
                .map_err(|e| unreachable(e.to_string()))?
                .next()
                .ok_or_else(|| unreachable(format!("{domain} has no addresses")))?;
            (addr, domain.to_string())
        }
        None => return Err(unreachable("missing host".to_string())),
    };

    debug!(target = %target.origin().ascii_serialization(), peer = %addr, tls, "Upstream peer resolved");

    let mut peer = HttpPeer::new(addr, tls, sni);
    peer.options.connection_timeout = Some(CONNECT_TIMEOUT);
    Ok(peer)
}
