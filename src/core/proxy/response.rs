//! Locally served responses.
//!
//! Pages, redirects and diagnostics the proxy answers itself without
//! contacting a target.

use crate::core::proxy::headers::apply_cors;
use bytes::Bytes;
use pingora::Result;
use pingora::http::ResponseHeader;
use pingora::proxy::Session;

fn no_store(header: &mut ResponseHeader) -> Result<()> {
    header.insert_header(
        "Cache-Control",
        "no-store, no-cache, must-revalidate, max-age=0",
    )?;
    header.insert_header("Pragma", "no-cache")?;
    header.insert_header("Expires", "0")?;
    Ok(())
}

async fn serve_body(
    session: &mut Session,
    status: u16,
    content_type: &str,
    body: Bytes,
    set_cookie: Option<&str>,
) -> Result<bool> {
    let mut header = ResponseHeader::build(status, None)?;
    header.insert_header("Content-Type", content_type)?;
    header.insert_header("Content-Length", body.len().to_string())?;
    no_store(&mut header)?;

    if let Some(cookie) = set_cookie {
        header.insert_header("Set-Cookie", cookie)?;
    }

    apply_cors(&mut header)?;

    session
        .write_response_header(Box::new(header), false)
        .await?;
    session.write_response_body(Some(body), true).await?;
    Ok(true)
}

/// Serves an HTML response with proper headers and optional cookie.
///
/// # Errors
///
/// Returns an error if headers cannot be built or response cannot be written.
pub async fn serve_html(
    session: &mut Session,
    status: u16,
    html: String,
    set_cookie: Option<&str>,
) -> Result<bool> {
    serve_body(
        session,
        status,
        "text/html; charset=utf-8",
        Bytes::from(html),
        set_cookie,
    )
    .await
}

/// Serves a plain-text diagnostic.
///
/// # Errors
///
/// Returns an error if headers cannot be built or response cannot be written.
pub async fn serve_text(session: &mut Session, status: u16, text: &str) -> Result<bool> {
    serve_body(
        session,
        status,
        "text/plain; charset=utf-8",
        Bytes::copy_from_slice(text.as_bytes()),
        None,
    )
    .await
}

/// Serves a `302` redirect with optional cookie.
///
/// # Errors
///
/// Returns an error if headers cannot be built or response cannot be written.
pub async fn serve_redirect(
    session: &mut Session,
    location: &str,
    set_cookie: Option<&str>,
) -> Result<bool> {
    let mut header = ResponseHeader::build(302, None)?;
    header.insert_header("Location", location)?;
    header.insert_header("Content-Length", "0")?;
    no_store(&mut header)?;

    if let Some(cookie) = set_cookie {
        header.insert_header("Set-Cookie", cookie)?;
    }

    apply_cors(&mut header)?;

    session
        .write_response_header(Box::new(header), true)
        .await?;
    Ok(true)
}
