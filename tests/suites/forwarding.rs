use crate::common::{
    client, create_test_config, http_response, proxy_origin, spawn_origin, spawn_proxy,
    spawn_stalling_origin,
};
use std::time::Duration;

#[tokio::test]
async fn test_upstream_request_header_policy() {
    let origin = spawn_origin(|_| http_response("200 OK", &[("Content-Type", "text/plain")], "ok")).await;
    let proxy_port = spawn_proxy(create_test_config()).await;

    let resp = client()
        .get(format!("{}/{}/path?x=1", proxy_origin(proxy_port), origin.origin()))
        .header("Accept-Language", "en-US")
        .header("Accept-Encoding", "gzip, br")
        .header("X-Custom", "secret")
        .header("Cookie", "sid=abc; session-auth=pw")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let seen = origin.last_request();
    assert_eq!(seen.method, "GET");
    assert_eq!(seen.path, "/path?x=1");
    assert_eq!(seen.header("host"), Some(format!("127.0.0.1:{}", origin.port).as_str()));
    assert_eq!(seen.header("referer"), Some(origin.origin().as_str()));
    assert_eq!(seen.header("origin"), Some(origin.origin().as_str()));
    assert_eq!(seen.header("accept-encoding"), Some("identity"));
    assert_eq!(seen.header("accept-language"), Some("en-US"));
    assert_eq!(seen.header("cookie"), Some("sid=abc"));
    assert!(seen.header("x-custom").is_none());
    assert!(seen.header("user-agent").is_some());
}

#[tokio::test]
async fn test_post_body_forwarded() {
    let origin = spawn_origin(|_| http_response("201 Created", &[("Content-Type", "application/json")], "{}")).await;
    let proxy_port = spawn_proxy(create_test_config()).await;

    let resp = client()
        .post(format!("{}/{}/submit", proxy_origin(proxy_port), origin.origin()))
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body("a=1&b=2")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);

    let seen = origin.last_request();
    assert_eq!(seen.method, "POST");
    assert_eq!(seen.body, b"a=1&b=2");
    assert_eq!(
        seen.header("content-type"),
        Some("application/x-www-form-urlencoded")
    );
}

#[tokio::test]
async fn test_json_passthrough_byte_identical() {
    const BODY: &str = r#"{"links":["/a","https://b.example/"],"html":"<a href=\"/x\">"}"#;
    let origin = spawn_origin(|_| {
        http_response(
            "200 OK",
            &[
                ("Content-Type", "application/json"),
                ("X-Frame-Options", "DENY"),
            ],
            BODY,
        )
    })
    .await;
    let proxy_port = spawn_proxy(create_test_config()).await;

    let resp = client()
        .get(format!("{}/{}/data.json", proxy_origin(proxy_port), origin.origin()))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers().get("access-control-allow-origin").unwrap(), "*");
    assert!(resp.headers().get("x-frame-options").is_none());
    assert!(resp.headers().get("set-cookie").is_none());
    assert_eq!(
        resp.headers().get("content-length").unwrap(),
        BODY.len().to_string().as_str()
    );
    assert_eq!(resp.text().await.unwrap(), BODY);
}

#[tokio::test]
async fn test_redirect_location_rewritten() {
    let origin = spawn_origin(|_| http_response("302 Found", &[("Location", "/next?p=2")], "")).await;
    let proxy_port = spawn_proxy(create_test_config()).await;
    let proxy = proxy_origin(proxy_port);

    let resp = client()
        .get(format!("{proxy}/{}/old", origin.origin()))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 302);
    assert_eq!(
        resp.headers().get("location").unwrap().to_str().unwrap(),
        format!("{proxy}/{}/next?p=2", origin.origin())
    );
}

#[tokio::test]
async fn test_set_cookie_domain_stripped() {
    let origin = spawn_origin(|_| {
        http_response(
            "200 OK",
            &[
                ("Content-Type", "text/plain"),
                ("Set-Cookie", "id=1; Domain=.example.com; Path=/"),
                ("Set-Cookie", "lang=en; Path=/; domain=example.com; HttpOnly"),
            ],
            "ok",
        )
    })
    .await;
    let proxy_port = spawn_proxy(create_test_config()).await;

    let resp = client()
        .get(format!("{}/{}/", proxy_origin(proxy_port), origin.origin()))
        .send()
        .await
        .unwrap();

    let cookies: Vec<&str> = resp
        .headers()
        .get_all("set-cookie")
        .iter()
        .map(|v| v.to_str().unwrap())
        .collect();
    assert_eq!(cookies, vec!["id=1; Path=/", "lang=en; Path=/; HttpOnly"]);
}

#[tokio::test]
async fn test_client_disconnect_aborts_upstream() {
    let head = "HTTP/1.1 200 OK\r\nContent-Type: application/octet-stream\r\nContent-Length: 1048576\r\n\r\npartial".to_string();
    let (origin_port, upstream_closed) = spawn_stalling_origin(head).await;
    let proxy_port = spawn_proxy(create_test_config()).await;

    let resp = client()
        .get(format!(
            "{}/http://127.0.0.1:{origin_port}/stream",
            proxy_origin(proxy_port)
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    drop(resp);

    let closed = tokio::time::timeout(Duration::from_secs(5), upstream_closed).await;
    assert!(
        matches!(closed, Ok(Ok(()))),
        "upstream connection stayed open after the client left"
    );
}
