//! End-to-end tests through a real listener.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{Method, StatusCode};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use kit_router::config::{KitConfig, RouteConfig, RouteKind};
use kit_router::http::HttpServer;
use kit_router::lifecycle::Shutdown;
use kit_router::runtime::{respond, DispatchState, HttpFetch, Initiator, SsrOptions};
use kit_router::site::{manifest_from_config, BasicRenderer};

mod common;

fn route(id: &str, kind: RouteKind, body: Option<&str>) -> RouteConfig {
    RouteConfig {
        id: id.to_string(),
        kind,
        body: body.map(str::to_string),
        content_type: None,
        etag: None,
        cache_control: None,
    }
}

fn config() -> KitConfig {
    let mut config = KitConfig::default();
    config.method_override.allowed = vec!["DELETE".into()];

    let mut health = route("api/health", RouteKind::Endpoint, Some("ok"));
    health.etag = Some("\"health-v1\"".into());
    health.cache_control = Some("max-age=5".into());

    config.routes = vec![
        route("", RouteKind::Page, Some("Home")),
        route("blog/[slug=slug]", RouteKind::Page, None),
        health,
    ];
    config
}

async fn start(config: KitConfig) -> (SocketAddr, Shutdown, JoinHandle<()>) {
    let manifest = manifest_from_config(&config.routes).unwrap();
    let renderer = BasicRenderer::from_config(&config);
    let options = SsrOptions::from_config(&config, Arc::new(manifest), Arc::new(renderer));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::new(&config, options);

    let signal = shutdown.clone();
    let handle = tokio::spawn(async move {
        server.run(listener, signal).await.unwrap();
    });

    (addr, shutdown, handle)
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_pages_endpoints_and_errors_over_http() {
    let (addr, shutdown, handle) = start(config()).await;
    let client = client();
    let base = format!("http://{addr}");

    let res = client.get(format!("{base}/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));
    let body = res.text().await.unwrap();
    assert!(body.contains("<title>Home</title>"));

    let res = client.get(format!("{base}/blog/hello-world")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.text().await.unwrap().contains("<p data-param=\"slug\">hello-world</p>"));

    let res = client.get(format!("{base}/blog/hello-world/__data.json")).send().await.unwrap();
    let data: serde_json::Value = res.json().await.unwrap();
    assert_eq!(data["route"], "blog/[slug=slug]");
    assert_eq!(data["params"]["slug"], "hello-world");

    let res = client.get(format!("{base}/blog/Not_A_Slug")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert!(res.text().await.unwrap().contains("Not found: /blog/Not_A_Slug"));

    let res = client.get(format!("{base}/blog/hello/?ref=feed")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(res.headers()["location"], "/blog/hello?ref=feed");

    shutdown.trigger();
    handle.await.unwrap();
}

#[tokio::test]
async fn test_endpoint_caching_and_method_override() {
    let (addr, shutdown, handle) = start(config()).await;
    let client = client();
    let url = format!("http://{addr}/api/health");

    let res = client.get(&url).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["etag"], "\"health-v1\"");
    assert_eq!(res.text().await.unwrap(), "ok");

    let res = client
        .get(&url)
        .header("if-none-match", "W/\"health-v1\"")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_MODIFIED);
    assert_eq!(res.headers()["cache-control"], "max-age=5");

    // Overridden to DELETE, which the static endpoint refuses
    let res = client.post(format!("{url}?_method=delete")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);

    let res = client.post(format!("{url}?_method=PATCH")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.text().await.unwrap(), "_method=PATCH is not allowed");

    // Override on GET fails before the hook runs
    let res = client.get(format!("{url}?_method=delete")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

    shutdown.trigger();
    handle.await.unwrap();
}

#[tokio::test]
async fn test_body_limit() {
    let mut config = config();
    config.listener.max_body_bytes = 16;
    let (addr, shutdown, handle) = start(config).await;

    let res = client()
        .post(format!("http://{addr}/api/health"))
        .body(vec![b'x'; 1024])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);

    shutdown.trigger();
    handle.await.unwrap();
}

#[tokio::test]
async fn test_unmatched_reentrant_request_is_fetched() {
    let backend = common::start_mock_backend("from backend").await;

    let config = config();
    let manifest = manifest_from_config(&config.routes).unwrap();
    let options = SsrOptions::from_config(
        &config,
        Arc::new(manifest),
        Arc::new(BasicRenderer::from_config(&config)),
    )
    .with_fetch(Arc::new(HttpFetch::new()));

    let request = common::request_with(
        Method::GET,
        &format!("http://{backend}/elsewhere"),
        &[],
    );
    let state = DispatchState::new().with_initiator(Initiator::Route("".into()));

    let response = respond(request, &options, &state).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::body_string(response).await, "from backend");
}
