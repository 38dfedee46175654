//! Config-driven site for the bundled server.
//!
//! # Responsibilities
//! - Build a `StaticManifest` from `[[routes]]` entries
//! - Serve endpoint routes with a fixed body and caching headers
//! - Render pages, data and error documents with `BasicRenderer`
//!
//! # Design Decisions
//! - Built-in matchers: `integer` and `slug`
//! - Pages are minimal HTML documents; a real renderer replaces `BasicRenderer`

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use futures_util::future::BoxFuture;
use serde_json::json;

use crate::config::{KitConfig, RouteConfig, RouteKind};
use crate::error::KitResult;
use crate::http::response::{html, json as json_response};
use crate::routing::{PageNodes, Route, StaticManifest};
use crate::runtime::errors::escape_html;
use crate::runtime::event::RequestEvent;
use crate::runtime::options::SsrOptions;
use crate::runtime::render::{Endpoint, PageConfig, RenderParams, Renderer};
use crate::runtime::resolve::ResolveOptions;
use crate::runtime::state::DispatchState;

/// `[name=integer]`: one or more ASCII digits.
pub fn is_integer(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

/// `[name=slug]`: lowercase letters, digits and inner hyphens.
pub fn is_slug(value: &str) -> bool {
    !value.is_empty()
        && !value.starts_with('-')
        && !value.ends_with('-')
        && value
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

/// Compile the configured routes, in order, with the built-in matchers.
pub fn manifest_from_config(routes: &[RouteConfig]) -> KitResult<StaticManifest> {
    let mut manifest = StaticManifest::default()
        .with_matcher("integer", is_integer)
        .with_matcher("slug", is_slug);

    for (leaf, route) in routes.iter().enumerate() {
        let compiled = match route.kind {
            RouteKind::Page => Route::page(
                route.id.as_str(),
                PageNodes {
                    layouts: vec![Some(0)],
                    errors: vec![Some(1)],
                    leaf,
                },
            )?,
            RouteKind::Endpoint => Route::endpoint(route.id.as_str(), Arc::new(StaticEndpoint::from_config(route)))?,
        };
        manifest.push(compiled);
    }

    Ok(manifest)
}

/// Endpoint answering GET and HEAD with a fixed body.
#[derive(Debug, Clone)]
pub struct StaticEndpoint {
    body: String,
    content_type: String,
    etag: Option<String>,
    cache_control: Option<String>,
}

impl StaticEndpoint {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            content_type: "text/plain; charset=utf-8".to_string(),
            etag: None,
            cache_control: None,
        }
    }

    pub fn from_config(route: &RouteConfig) -> Self {
        let mut endpoint = Self::new(route.body.clone().unwrap_or_default());
        if let Some(content_type) = &route.content_type {
            endpoint.content_type = content_type.clone();
        }
        endpoint.etag = route.etag.clone();
        endpoint.cache_control = route.cache_control.clone();
        endpoint
    }
}

impl Endpoint for StaticEndpoint {
    fn handle<'a>(&'a self, event: &'a RequestEvent) -> BoxFuture<'a, KitResult<Response>> {
        Box::pin(async move {
            let method = event.request().method();
            if method != Method::GET && method != Method::HEAD {
                return Ok((
                    StatusCode::METHOD_NOT_ALLOWED,
                    [(header::ALLOW, "GET, HEAD")],
                    format!("{method} method not allowed"),
                )
                    .into_response());
            }

            let mut builder = Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, &self.content_type);
            if let Some(etag) = &self.etag {
                builder = builder.header(header::ETAG, etag);
            }
            if let Some(cache_control) = &self.cache_control {
                builder = builder.header(header::CACHE_CONTROL, cache_control);
            }

            let body = if method == Method::HEAD {
                String::new()
            } else {
                self.body.clone()
            };
            Ok(builder.body(body.into())?)
        })
    }
}

/// Minimal renderer for the bundled server.
#[derive(Debug, Clone, Default)]
pub struct BasicRenderer {
    titles: HashMap<String, String>,
}

impl BasicRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Page titles taken from the `body` of configured page routes.
    pub fn from_config(config: &KitConfig) -> Self {
        let titles = config
            .routes
            .iter()
            .filter(|r| r.kind == RouteKind::Page)
            .filter_map(|r| Some((r.id.clone(), r.body.clone()?)))
            .collect();
        Self { titles }
    }

    fn title<'a>(&'a self, route: &'a Route) -> &'a str {
        self.titles.get(&route.id).map_or(route.id.as_str(), String::as_str)
    }
}

fn document(title: &str, body: &str, page_config: PageConfig, resolve: &ResolveOptions) -> String {
    let script = if page_config.csr {
        "\n\t\t<script type=\"module\" src=\"/_app/start.js\"></script>"
    } else {
        ""
    };

    let head = format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n\t<head>\n\t\t<meta charset=\"utf-8\" />\n\t\t<title>{}</title>{script}\n\t</head>\n",
        escape_html(title)
    );
    let tail = format!("\t<body>\n{body}\t</body>\n</html>\n");

    let mut out = resolve.transform(&head, false);
    out.push_str(&resolve.transform(&tail, true));
    out
}

impl Renderer for BasicRenderer {
    fn render_page<'a>(
        &'a self,
        event: &'a RequestEvent,
        route: &'a Route,
        _page: &'a PageNodes,
        _options: &'a SsrOptions,
        _state: &'a DispatchState,
        resolve: &'a ResolveOptions,
    ) -> BoxFuture<'a, KitResult<Response>> {
        Box::pin(async move {
            let mut params: Vec<_> = event.params().iter().collect();
            params.sort();

            let mut body = format!("\t\t<h1>{}</h1>\n", escape_html(self.title(route)));
            for (name, value) in params {
                body.push_str(&format!(
                    "\t\t<p data-param=\"{}\">{}</p>\n",
                    escape_html(name),
                    escape_html(value)
                ));
            }

            Ok(html(
                StatusCode::OK,
                document(self.title(route), &body, PageConfig::default(), resolve),
            ))
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
            let body = json!({
                "type": "data",
                "route": route.id,
                "params": event.params(),
            });
            Ok(json_response(StatusCode::OK, body.to_string()))
        })
    }

    fn render_response<'a>(&'a self, params: RenderParams<'a>) -> BoxFuture<'a, KitResult<Response>> {
        Box::pin(async move {
            let (title, body) = match params.error {
                Some(error) => (
                    error.to_string(),
                    format!(
                        "\t\t<h1>{}</h1>\n\t\t<p>{}</p>\n",
                        params.status.as_u16(),
                        escape_html(&error.to_string())
                    ),
                ),
                None => (String::new(), "\t\t<div id=\"app\"></div>\n".to_string()),
            };

            Ok(html(
                params.status,
                document(&title, &body, params.page_config, params.resolve),
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::Manifest;

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

    #[test]
    fn test_builtin_matchers() {
        assert!(is_integer("42"));
        assert!(!is_integer(""));
        assert!(!is_integer("4a"));

        assert!(is_slug("hello-world-2"));
        assert!(!is_slug("-hello"));
        assert!(!is_slug("Hello"));
        assert!(!is_slug("a_b"));
    }

    #[tokio::test]
    async fn test_manifest_from_config_keeps_order() {
        let manifest = manifest_from_config(&[
            route("", RouteKind::Page, Some("Home")),
            route("posts/[id=integer]", RouteKind::Page, None),
            route("api/health", RouteKind::Endpoint, Some("ok")),
        ])
        .unwrap();

        let routes = manifest.routes();
        assert_eq!(routes.len(), 3);
        assert!(routes[0].page.is_some());
        assert_eq!(routes[1].types, vec![Some("integer".to_string())]);
        assert!(routes[2].endpoint.is_some() && routes[2].page.is_none());

        let matchers = manifest.matchers().await.unwrap();
        assert!(matchers.contains_key("integer") && matchers.contains_key("slug"));
    }

    #[test]
    fn test_invalid_route_id_is_rejected() {
        assert!(manifest_from_config(&[route("[a][b]", RouteKind::Page, None)]).is_err());
    }

    #[test]
    fn test_document_applies_transform_per_chunk() {
        let resolve = ResolveOptions {
            transform_page_chunk: Arc::new(|html: &str, done: bool| {
                if done {
                    html.replace("</body>", "<!-- done --></body>")
                } else {
                    html.to_string()
                }
            }),
        };
        let doc = document("T", "", PageConfig { ssr: false, csr: false }, &resolve);
        assert!(doc.contains("<title>T</title>"));
        assert!(doc.contains("<!-- done --></body>"));
        assert!(!doc.contains("start.js"));
    }
}
