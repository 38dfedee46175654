//! Request dispatch pipeline.
//!
//! # Data Flow
//! ```text
//! KitRequest
//!     → method override (POST + allow-list only)
//!     → decode path, strip base path and data suffix
//!     → match route (skipped for the fallback shell)
//!     → trailing slash redirect (page routes)
//!     → RequestEvent
//!     → hooks.handle(event, resolve)
//!     → on failure: handle_error, then JSON or error page (static page as last resort)
//! ```
//!
//! # Design Decisions
//! - Client input errors answer directly without running the hook
//! - Failures before the hook (missing matcher, override on non-POST) are returned as `Err`
//! - Failures inside the hook are reported once and always become a response

use std::time::Instant;

use axum::http::{header, Method, StatusCode};
use axum::response::Response;

use crate::error::{KitError, KitResult};
use crate::http::negotiate::negotiate;
use crate::http::response::{json, normalize_redirect, text};
use crate::http::url::{decode_uri, normalize_path, DATA_SUFFIX};
use crate::http::KitRequest;
use crate::observability::metrics;
use crate::routing::{match_route, Params};
use crate::runtime::errors::{respond_with_error, serialize_error, static_error_page};
use crate::runtime::event::RequestEvent;
use crate::runtime::options::SsrOptions;
use crate::runtime::resolve::{Dispatch, Resolve};
use crate::runtime::state::DispatchState;

/// Response extension naming the route that produced the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedRoute(pub String);

/// Dispatch `request` and produce its response.
pub async fn respond(
    request: KitRequest,
    options: &SsrOptions,
    state: &DispatchState,
) -> KitResult<Response> {
    let start = Instant::now();
    let method = request.original_method().to_string();

    tracing::debug!(method = %method, url = %request.url(), "Dispatching request");

    let result = dispatch(request, options, state).await;

    match &result {
        Ok(response) => {
            let route = response
                .extensions()
                .get::<MatchedRoute>()
                .map_or("none", |r| r.0.as_str());
            metrics::record_request(&method, response.status().as_u16(), route, start);
        }
        Err(e) => {
            tracing::warn!(method = %method, error = %e, "Dispatch failed before the handle hook");
            metrics::record_request(&method, 500, "none", start);
        }
    }

    result
}

async fn dispatch(
    mut request: KitRequest,
    options: &SsrOptions,
    state: &DispatchState,
) -> KitResult<Response> {
    let method_override = &options.method_override;
    let requested = request
        .query_param(&method_override.parameter)
        .map(|m| m.to_ascii_uppercase())
        .filter(|m| !m.is_empty());

    if let Some(requested) = requested {
        if request.original_method() != Method::POST {
            return Err(KitError::MethodOverrideNotPost {
                parameter: method_override.parameter.clone(),
                method: requested,
            });
        }

        match Method::from_bytes(requested.as_bytes()) {
            Ok(method) if method_override.is_allowed(&requested) => {
                request = request.with_method(method);
            }
            _ => {
                let verb = if method_override.allowed.is_empty() {
                    "enabled"
                } else {
                    "allowed"
                };
                return Ok(text(
                    StatusCode::BAD_REQUEST,
                    format!("{}={requested} is not {verb}", method_override.parameter),
                ));
            }
        }
    }

    let Ok(mut decoded) = decode_uri(request.url().path()) else {
        return Ok(text(StatusCode::BAD_REQUEST, "Malformed URI"));
    };

    if !options.base_path.is_empty() && !state.is_fallback() {
        match decoded.strip_prefix(options.base_path.as_str()) {
            Some(rest) => decoded = or_root(rest),
            None => return Ok(text(StatusCode::NOT_FOUND, "Not found")),
        }
    }

    let is_data_request = decoded.ends_with(DATA_SUFFIX);
    if is_data_request {
        decoded = or_root(&decoded[..decoded.len() - DATA_SUFFIX.len()]);
    }

    let mut route = None;
    let mut params = Params::new();

    if !state.is_fallback() {
        let matchers = options.manifest.matchers().await?;
        if let Some((candidate, matched)) = match_route(options.manifest.routes(), &decoded, &matchers)? {
            route = Some(candidate);
            params = matched;
        }
    }

    if let Some(matched) = route {
        if matched.page.is_some() && !is_data_request && !state.is_fallback() {
            let url = request.url();
            let normalized = normalize_path(url.path(), options.trailing_slash);

            if normalized != url.path() {
                let mut location = if normalized.starts_with("//") {
                    format!("{}{normalized}", url.origin().ascii_serialization())
                } else {
                    normalized
                };
                if let Some(query) = url.query().filter(|q| !q.is_empty()) {
                    location.push('?');
                    location.push_str(query);
                }

                tracing::info!(from = %url.path(), to = %location, "Normalizing trailing slash");
                return normalize_redirect(&location);
            }
        }
    }

    let event = RequestEvent::new(
        request,
        route.map(|r| r.id.clone()),
        params,
        state,
        options.adapter_name.clone(),
    );
    let dispatch = Dispatch::new(options, state, &event, route, is_data_request);

    match options.hooks.handle(&event, Resolve::new(&dispatch)).await {
        Ok(mut response) => {
            if let Some(route) = route {
                response.extensions_mut().insert(MatchedRoute(route.id.clone()));
            }
            Ok(response)
        }
        Err(error) => Ok(recover(error, &dispatch).await),
    }
}

/// Turn a failure raised inside the hook into a 500 response.
async fn recover(error: KitError, dispatch: &Dispatch<'_>) -> Response {
    let (options, state, event) = (dispatch.options, dispatch.state, dispatch.event);

    options.hooks.handle_error(&error, event).await;

    let accept = event.request().header(header::ACCEPT).unwrap_or("text/html");
    let kind = negotiate(accept, &["text/html", "application/json"]);

    if dispatch.is_data_request || kind == Some("application/json") {
        return json(
            StatusCode::INTERNAL_SERVER_ERROR,
            serialize_error(&error, options.expose_stack),
        );
    }

    let resolve_opts = dispatch.resolve_opts();
    match respond_with_error(
        event,
        options,
        state,
        StatusCode::INTERNAL_SERVER_ERROR,
        &error,
        &resolve_opts,
    )
    .await
    {
        Ok(response) => response,
        Err(second) => {
            tracing::error!(error = %second.chain(), "Error page failed to render");
            static_error_page(options, StatusCode::INTERNAL_SERVER_ERROR, &second.to_string())
        }
    }
}

fn or_root(path: &str) -> String {
    if path.is_empty() {
        "/".to_string()
    } else {
        path.to_string()
    }
}
