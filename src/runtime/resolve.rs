//! The `resolve` callback handed to the handle hook.
//!
//! # Responsibilities
//! - Validate options passed by the hook
//! - Pick the rendering branch for the request
//! - Apply queued headers, cookies and conditional caching to route responses
//!
//! # Design Decisions
//! - `Resolve` is `Copy`; calling it more than once re-renders with the latest options
//! - Options replaced by the hook are kept for the error page of the same request

use std::fmt;
use std::sync::{Arc, Mutex};

use axum::http::StatusCode;
use axum::response::Response;

use crate::error::{KitError, KitResult};
use crate::http::response::{apply_queued, not_modified, text};
use crate::routing::Route;
use crate::runtime::errors::respond_with_error;
use crate::runtime::event::RequestEvent;
use crate::runtime::options::SsrOptions;
use crate::runtime::render::{PageConfig, RenderParams};
use crate::runtime::state::{DispatchState, Initiator};

/// Transforms each chunk of rendered HTML. The flag is `true` on the last chunk.
pub type ChunkTransform = Arc<dyn Fn(&str, bool) -> String + Send + Sync>;

/// Options the render stage honours.
#[derive(Clone)]
pub struct ResolveOptions {
    pub transform_page_chunk: ChunkTransform,
}

impl ResolveOptions {
    pub fn transform(&self, html: &str, done: bool) -> String {
        (self.transform_page_chunk)(html, done)
    }
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            transform_page_chunk: Arc::new(|html: &str, _done: bool| html.to_string()),
        }
    }
}

impl fmt::Debug for ResolveOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolveOptions").finish_non_exhaustive()
    }
}

/// Options a hook may pass to `resolve`.
///
/// `transform_page` and `ssr` are no longer supported and fail the request.
#[derive(Clone, Default)]
pub struct ResolveOpts {
    pub transform_page_chunk: Option<ChunkTransform>,
    pub transform_page: Option<ChunkTransform>,
    pub ssr: Option<bool>,
}

impl ResolveOpts {
    pub fn transform_page_chunk(f: impl Fn(&str, bool) -> String + Send + Sync + 'static) -> Self {
        Self {
            transform_page_chunk: Some(Arc::new(f)),
            ..Self::default()
        }
    }

    fn validate(self) -> KitResult<ResolveOptions> {
        if self.transform_page.is_some() {
            return Err(KitError::RemovedOption {
                option: "transform_page",
                hint: "it has been replaced by transform_page_chunk",
            });
        }
        if self.ssr.is_some() {
            return Err(KitError::RemovedOption {
                option: "ssr",
                hint: "set it in the appropriate layout instead",
            });
        }

        Ok(self
            .transform_page_chunk
            .map(|transform_page_chunk| ResolveOptions { transform_page_chunk })
            .unwrap_or_default())
    }
}

/// Per-request context shared by the hook's `resolve` and the error path.
pub(crate) struct Dispatch<'a> {
    pub options: &'a SsrOptions,
    pub state: &'a DispatchState,
    /// The event built by the dispatcher; its queued headers are applied.
    pub event: &'a RequestEvent,
    pub route: Option<&'a Route>,
    pub is_data_request: bool,
    resolve_opts: Mutex<ResolveOptions>,
}

impl<'a> Dispatch<'a> {
    pub fn new(
        options: &'a SsrOptions,
        state: &'a DispatchState,
        event: &'a RequestEvent,
        route: Option<&'a Route>,
        is_data_request: bool,
    ) -> Self {
        Self {
            options,
            state,
            event,
            route,
            is_data_request,
            resolve_opts: Mutex::new(ResolveOptions::default()),
        }
    }

    /// Options currently in effect for this request.
    pub fn resolve_opts(&self) -> ResolveOptions {
        self.resolve_opts.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn set_resolve_opts(&self, opts: ResolveOptions) {
        *self.resolve_opts.lock().unwrap_or_else(|e| e.into_inner()) = opts;
    }
}

/// Callback that renders the request. Only obtainable inside the handle hook.
#[derive(Clone, Copy)]
pub struct Resolve<'a> {
    dispatch: &'a Dispatch<'a>,
}

impl<'a> Resolve<'a> {
    pub(crate) fn new(dispatch: &'a Dispatch<'a>) -> Self {
        Self { dispatch }
    }

    /// Render `event`, optionally replacing the resolve options first.
    pub async fn call(self, event: &'a RequestEvent, opts: Option<ResolveOpts>) -> KitResult<Response> {
        let dispatch = self.dispatch;
        if let Some(opts) = opts {
            dispatch.set_resolve_opts(opts.validate()?);
        }
        let resolve_opts = dispatch.resolve_opts();

        let options = dispatch.options;
        let state = dispatch.state;
        let renderer = options.renderer.as_ref();

        if state.is_fallback() {
            return renderer
                .render_response(RenderParams {
                    event,
                    options,
                    state,
                    page_config: PageConfig {
                        ssr: false,
                        csr: true,
                    },
                    status: StatusCode::OK,
                    error: None,
                    resolve: &resolve_opts,
                })
                .await;
        }

        if let Some(route) = dispatch.route {
            let mut response = if dispatch.is_data_request {
                renderer.render_data(event, route, options, state).await?
            } else if let Some(page) = &route.page {
                renderer
                    .render_page(event, route, page, options, state, &resolve_opts)
                    .await?
            } else if let Some(endpoint) = &route.endpoint {
                renderer.render_endpoint(event, endpoint.as_ref(), state).await?
            } else {
                return Err(KitError::http(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Route {} has neither a page nor an endpoint", route.id),
                ));
            };

            let queued = dispatch.event.queued();
            apply_queued(
                &mut response,
                &queued.headers,
                &queued.cookies,
                dispatch.is_data_request,
            );

            if let Some(cached) = not_modified(&response, dispatch.event.request().headers()) {
                tracing::debug!(route_id = %route.id, "ETag matched, responding 304");
                return Ok(cached);
            }

            return Ok(response);
        }

        match &state.initiator {
            Some(Initiator::GenericError) => {
                Ok(text(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error"))
            }
            None => {
                let error = KitError::http(
                    StatusCode::NOT_FOUND,
                    format!("Not found: {}", event.url().path()),
                );
                respond_with_error(event, options, state, StatusCode::NOT_FOUND, &error, &resolve_opts).await
            }
            Some(Initiator::Route(_)) if state.is_prerendering() => {
                Ok(text(StatusCode::NOT_FOUND, "not found"))
            }
            Some(Initiator::Route(from)) => {
                tracing::debug!(initiator = %from, url = %dispatch.event.url(), "No route matched, fetching");
                options.fetch.fetch(dispatch.event.request().to_http()?).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_transform_is_identity() {
        let opts = ResolveOptions::default();
        assert_eq!(opts.transform("<p>hi</p>", true), "<p>hi</p>");
    }

    #[test]
    fn test_chunk_transform_is_used() {
        let opts = ResolveOpts::transform_page_chunk(|html, _| html.replace("%lang%", "en"))
            .validate()
            .unwrap();
        assert_eq!(opts.transform("<html lang=\"%lang%\">", false), "<html lang=\"en\">");

        let opts = ResolveOpts::default().validate().unwrap();
        assert_eq!(opts.transform("x", true), "x");
    }

    #[test]
    fn test_removed_options_are_fatal() {
        let opts = ResolveOpts {
            transform_page: Some(Arc::new(|html: &str, _| html.to_string())),
            ..ResolveOpts::default()
        };
        let err = opts.validate().unwrap_err();
        assert!(matches!(err, KitError::RemovedOption { option: "transform_page", .. }));

        let opts = ResolveOpts {
            ssr: Some(false),
            ..ResolveOpts::default()
        };
        let err = opts.validate().unwrap_err();
        assert!(err.to_string().starts_with("ssr has been removed"));
    }
}
