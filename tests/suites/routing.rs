use crate::common::{
    client, closed_port, create_test_config, http_response, proxy_origin, spawn_origin,
    spawn_proxy,
};

#[tokio::test]
async fn test_home_page() {
    let proxy_port = spawn_proxy(create_test_config()).await;

    let resp = client()
        .get(format!("{}/", proxy_origin(proxy_port)))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );
    let html = resp.text().await.unwrap();
    assert!(html.contains("TestProxy"));
    assert!(html.contains(&format!(
        "href=\"{}/https://www.wikipedia.org\"",
        proxy_origin(proxy_port)
    )));
}

#[tokio::test]
async fn test_unresolvable_target_is_400() {
    let proxy_port = spawn_proxy(create_test_config()).await;

    let resp = client()
        .get(format!("{}/search", proxy_origin(proxy_port)))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    assert!(resp.text().await.unwrap().contains("unable to resolve target"));
}

#[tokio::test]
async fn test_invalid_target_is_400() {
    let proxy_port = spawn_proxy(create_test_config()).await;

    let resp = client()
        .get(format!("{}/httpbin", proxy_origin(proxy_port)))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    assert!(resp.text().await.unwrap().contains("invalid target URL"));
}

#[tokio::test]
async fn test_unreachable_upstream_is_500() {
    let proxy_port = spawn_proxy(create_test_config()).await;
    let dead = closed_port().await;

    let resp = client()
        .get(format!("{}/http://127.0.0.1:{dead}/", proxy_origin(proxy_port)))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 500);
    let text = resp.text().await.unwrap();
    assert!(
        text.starts_with(&format!("proxy error: http://127.0.0.1:{dead}/")),
        "{text}"
    );
}

#[tokio::test]
async fn test_referer_supplies_origin() {
    let origin = spawn_origin(|_| http_response("200 OK", &[("Content-Type", "text/css")], "a{}")).await;
    let proxy_port = spawn_proxy(create_test_config()).await;
    let proxy = proxy_origin(proxy_port);

    let resp = client()
        .get(format!("{proxy}/static/site.css?v=3"))
        .header("Referer", format!("{proxy}/{}/articles/1", origin.origin()))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "a{}");
    assert_eq!(origin.last_request().path, "/static/site.css?v=3");
}

#[tokio::test]
async fn test_origin_cookie_supplies_origin() {
    let origin = spawn_origin(|_| http_response("200 OK", &[("Content-Type", "application/json")], "[]")).await;
    let proxy_port = spawn_proxy(create_test_config()).await;

    let resp = client()
        .get(format!("{}/api/items", proxy_origin(proxy_port)))
        .header("Cookie", format!("origin-anchor={}", origin.origin()))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let seen = origin.last_request();
    assert_eq!(seen.path, "/api/items");
    assert!(seen.header("cookie").is_none());
}
