//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{header, Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use futures_util::future::BoxFuture;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use kit_router::error::{BoxError, KitError, KitResult};
use kit_router::routing::{PageNodes, Route, StaticManifest};
use kit_router::runtime::{
    ErrorPageParams, Fetch, Hooks, RenderParams, Renderer, RequestEvent, Resolve, ResolveOptions,
    ResolveOpts, SsrOptions,
};
use kit_router::runtime::state::DispatchState;
use kit_router::KitRequest;

/// What the test hook does before (or instead of) resolving.
#[derive(Debug, Clone)]
pub enum HookMode {
    Resolve,
    Fail(String),
    SetHeaders(Vec<(String, String)>),
    Transform,
    RemovedSsr,
}

/// Handle hook that records every call and every reported error.
pub struct TestHooks {
    pub mode: HookMode,
    pub calls: AtomicUsize,
    pub errors: Mutex<Vec<String>>,
}

impl TestHooks {
    pub fn new(mode: HookMode) -> Arc<Self> {
        Arc::new(Self {
            mode,
            calls: AtomicUsize::new(0),
            errors: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

impl Hooks for TestHooks {
    fn handle<'a>(
        &'a self,
        event: &'a RequestEvent,
        resolve: Resolve<'a>,
    ) -> BoxFuture<'a, KitResult<Response>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.mode {
                HookMode::Resolve => resolve.call(event, None).await,
                HookMode::Fail(message) => Err(KitError::from(BoxError::from(message.clone()))),
                HookMode::SetHeaders(headers) => {
                    event.set_headers(headers.iter().map(|(k, v)| (k.as_str(), v.as_str())))?;
                    resolve.call(event, None).await
                }
                HookMode::Transform => {
                    let opts = ResolveOpts::transform_page_chunk(|html, _| html.to_uppercase());
                    resolve.call(event, Some(opts)).await
                }
                HookMode::RemovedSsr => {
                    let opts = ResolveOpts {
                        ssr: Some(false),
                        ..ResolveOpts::default()
                    };
                    resolve.call(event, Some(opts)).await
                }
            }
        })
    }

    fn handle_error<'a>(&'a self, error: &'a KitError, _event: &'a RequestEvent) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            self.errors.lock().unwrap().push(error.to_string());
        })
    }
}

/// Renderer producing plain-text bodies that name the branch taken.
#[derive(Default)]
pub struct TestRenderer {
    pub calls: Mutex<Vec<String>>,
    pub fail_error_page: AtomicBool,
}

impl TestRenderer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing_error_page() -> Arc<Self> {
        let renderer = Self::default();
        renderer.fail_error_page.store(true, Ordering::SeqCst);
        Arc::new(renderer)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Renderer for TestRenderer {
    fn render_page<'a>(
        &'a self,
        _event: &'a RequestEvent,
        route: &'a Route,
        _page: &'a PageNodes,
        _options: &'a SsrOptions,
        _state: &'a DispatchState,
        resolve: &'a ResolveOptions,
    ) -> BoxFuture<'a, KitResult<Response>> {
        Box::pin(async move {
            self.record(format!("page:{}", route.id));

            if route.id == "explode" {
                return Err(KitError::from(BoxError::from("page exploded")));
            }

            let body = resolve.transform(&format!("page:{}", route.id), true);
            let mut response = (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/html"), (header::VARY, "accept")],
                body,
            )
                .into_response();

            if route.id == "cached" {
                let headers = response.headers_mut();
                headers.insert(header::ETAG, "\"v1\"".parse().unwrap());
                headers.insert(header::EXPIRES, "Thu, 01 Jan 2099 00:00:00 GMT".parse().unwrap());
            }

            Ok(response)
        })
    }

    fn render_data<'a>(
        &'a self,
        event: &'a RequestEvent,
        route: &'a Route,
        _options: &'a SsrOptions,
        _state: &'a DispatchState,
    ) -> BoxFuture<'a, KitResult<Response>> {
        Box::pin(async move {
            self.record(format!("data:{}", route.id));
            let body = serde_json::json!({ "route": route.id, "params": event.params() });
            Ok((
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/json")],
                body.to_string(),
            )
                .into_response())
        })
    }

    fn render_response<'a>(&'a self, params: RenderParams<'a>) -> BoxFuture<'a, KitResult<Response>> {
        Box::pin(async move {
            self.record(format!(
                "shell:ssr={}:csr={}:error={}",
                params.page_config.ssr,
                params.page_config.csr,
                params.error.is_some()
            ));
            Ok((params.status, "shell").into_response())
        })
    }

    fn render_error_page<'a>(
        &'a self,
        params: ErrorPageParams<'a>,
    ) -> BoxFuture<'a, KitResult<Response>> {
        Box::pin(async move {
            self.record(format!("error:{}", params.status.as_u16()));

            if self.fail_error_page.load(Ordering::SeqCst) {
                return Err(KitError::from(BoxError::from("error page exploded")));
            }

            Ok((
                params.status,
                format!("error:{}:{}", params.status.as_u16(), params.error),
            )
                .into_response())
        })
    }
}

/// Fetch stub recording the forwarded URLs.
#[derive(Default)]
pub struct RecordingFetch {
    pub urls: Mutex<Vec<String>>,
}

impl Fetch for RecordingFetch {
    fn fetch(&self, request: Request<Body>) -> BoxFuture<'_, KitResult<Response>> {
        Box::pin(async move {
            self.urls.lock().unwrap().push(request.uri().to_string());
            Ok((StatusCode::OK, "fetched").into_response())
        })
    }
}

/// Manifest with the `integer` matcher registered.
pub fn manifest(routes: Vec<Route>) -> StaticManifest {
    StaticManifest::new(routes).with_matcher("integer", |v: &str| {
        !v.is_empty() && v.bytes().all(|b| b.is_ascii_digit())
    })
}

pub fn page(id: &str) -> Route {
    Route::page(id, PageNodes::default()).unwrap()
}

/// Options with recording collaborators.
pub fn options(routes: Vec<Route>, hooks: Arc<TestHooks>, renderer: Arc<TestRenderer>) -> SsrOptions {
    SsrOptions::new(Arc::new(manifest(routes)), renderer).with_hooks(hooks)
}

pub fn request(method: Method, uri: &str) -> KitRequest {
    request_with(method, uri, &[])
}

pub fn request_with(method: Method, uri: &str, headers: &[(&str, &str)]) -> KitRequest {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("host", "example.com");
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    KitRequest::new(builder.body(Bytes::new()).unwrap()).unwrap()
}

pub async fn body_string(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Start a mock backend that answers every connection with a fixed 200.
pub async fn start_mock_backend(response: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let response_str = format!(
                    "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    response.len(),
                    response
                );
                let _ = socket.write_all(response_str.as_bytes()).await;
                let _ = socket.shutdown().await;
                tokio::time::sleep(Duration::from_millis(10)).await;
            });
        }
    });

    addr
}
