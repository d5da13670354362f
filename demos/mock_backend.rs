//! Small origin for trying the proxy by hand.
//!
//! Run it, start the proxy, then open
//! `http://127.0.0.1:2568/http://127.0.0.1:9000/` in a browser.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use tokio::net::TcpListener;

const INDEX: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>Mock Origin</title>
  <meta name="referrer" content="no-referrer">
  <link rel="stylesheet" href="/style.css" integrity="sha384-demo" crossorigin="anonymous">
</head>
<body>
  <h1>Mock Origin</h1>
  <ul>
    <li><a href="/about">Root-relative link</a></li>
    <li><a href="https://example.com/">Absolute link</a></li>
    <li><a href="//example.org/">Protocol-relative link</a></li>
    <li><a href="/moved">Redirect</a></li>
    <li><a href="relative.html">Relative link (left alone)</a></li>
  </ul>
  <button onclick="fetch('/api/time').then(r => r.json()).then(j => alert(j.now))">fetch</button>
</body>
</html>
"#;

fn respond(status: StatusCode, content_type: &str, body: &'static str) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from_static(body.as_bytes())));
    *response.status_mut() = status;
    if let Ok(value) = content_type.parse() {
        response.headers_mut().insert("Content-Type", value);
    }
    response
}

async fn origin(req: Request<hyper::body::Incoming>) -> Result<Response<Full<Bytes>>, Infallible> {
    let mut response = match req.uri().path() {
        "/" => {
            let mut r = respond(StatusCode::OK, "text/html; charset=utf-8", INDEX);
            if let Ok(cookie) = "visited=1; Domain=127.0.0.1; Path=/".parse() {
                r.headers_mut().insert("Set-Cookie", cookie);
            }
            r
        }
        "/about" => respond(
            StatusCode::OK,
            "text/html",
            "<html><head></head><body><a href=\"/\">back</a></body></html>",
        ),
        "/style.css" => respond(StatusCode::OK, "text/css", "body { font-family: sans-serif; }"),
        "/api/time" => respond(StatusCode::OK, "application/json", r#"{"now":"12:00"}"#),
        "/moved" => {
            let mut r = respond(StatusCode::FOUND, "text/plain", "");
            if let Ok(location) = "/about".parse() {
                r.headers_mut().insert("Location", location);
            }
            r
        }
        _ => respond(StatusCode::NOT_FOUND, "text/plain", "404 Not Found"),
    };
    response
        .headers_mut()
        .insert("X-Frame-Options", hyper::header::HeaderValue::from_static("DENY"));

    Ok(response)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = SocketAddr::from(([127, 0, 0, 1], 9000));

    let listener = TcpListener::bind(addr).await?;
    println!("Mock origin listening on http://{addr}");

    loop {
        let (stream, _) = listener.accept().await?;
        let io = TokioIo::new(stream);

        tokio::task::spawn(async move {
            if let Err(err) = http1::Builder::new()
                .serve_connection(io, service_fn(origin))
                .await
            {
                eprintln!("Error serving connection: {err:?}");
            }
        });
    }
}
