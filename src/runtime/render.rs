//! Rendering collaborators.
//!
//! The dispatcher decides *what* to render; implementations of these traits
//! decide *how*. Everything here is async and object-safe so a renderer can
//! be shared as `Arc<dyn Renderer>`.

use axum::http::StatusCode;
use axum::response::Response;
use futures_util::future::BoxFuture;

use crate::error::{KitError, KitResult};
use crate::routing::{PageNodes, Route};
use crate::runtime::event::RequestEvent;
use crate::runtime::options::SsrOptions;
use crate::runtime::resolve::ResolveOptions;
use crate::runtime::state::DispatchState;

/// Standalone request handler attached to an endpoint route.
pub trait Endpoint: Send + Sync {
    fn handle<'a>(&'a self, event: &'a RequestEvent) -> BoxFuture<'a, KitResult<Response>>;
}

impl<F> Endpoint for F
where
    F: Fn(&RequestEvent) -> KitResult<Response> + Send + Sync,
{
    fn handle<'a>(&'a self, event: &'a RequestEvent) -> BoxFuture<'a, KitResult<Response>> {
        Box::pin(async move { self(event) })
    }
}

/// Rendering switches for a single page response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageConfig {
    pub ssr: bool,
    pub csr: bool,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self { ssr: true, csr: true }
    }
}

/// Inputs for rendering a full HTML document without running any loads.
pub struct RenderParams<'a> {
    pub event: &'a RequestEvent,
    pub options: &'a SsrOptions,
    pub state: &'a DispatchState,
    pub page_config: PageConfig,
    pub status: StatusCode,
    /// Set when rendering an error page; the branch is always empty then.
    pub error: Option<&'a KitError>,
    pub resolve: &'a ResolveOptions,
}

/// Inputs for rendering an error page.
pub struct ErrorPageParams<'a> {
    pub event: &'a RequestEvent,
    pub options: &'a SsrOptions,
    pub state: &'a DispatchState,
    pub status: StatusCode,
    pub error: &'a KitError,
    pub resolve: &'a ResolveOptions,
}

/// Turns a matched route into a response.
pub trait Renderer: Send + Sync {
    /// Render a page route to HTML.
    fn render_page<'a>(
        &'a self,
        event: &'a RequestEvent,
        route: &'a Route,
        page: &'a PageNodes,
        options: &'a SsrOptions,
        state: &'a DispatchState,
        resolve: &'a ResolveOptions,
    ) -> BoxFuture<'a, KitResult<Response>>;

    /// Render the load data of a page route (`/__data.json` requests).
    fn render_data<'a>(
        &'a self,
        event: &'a RequestEvent,
        route: &'a Route,
        options: &'a SsrOptions,
        state: &'a DispatchState,
    ) -> BoxFuture<'a, KitResult<Response>>;

    /// Run an endpoint handler.
    fn render_endpoint<'a>(
        &'a self,
        event: &'a RequestEvent,
        endpoint: &'a dyn Endpoint,
        _state: &'a DispatchState,
    ) -> BoxFuture<'a, KitResult<Response>> {
        endpoint.handle(event)
    }

    /// Render a document shell (no loads executed).
    fn render_response<'a>(&'a self, params: RenderParams<'a>) -> BoxFuture<'a, KitResult<Response>>;

    /// Render an error page. Defaults to a shell with the error populated.
    fn render_error_page<'a>(
        &'a self,
        params: ErrorPageParams<'a>,
    ) -> BoxFuture<'a, KitResult<Response>> {
        self.render_response(RenderParams {
            event: params.event,
            options: params.options,
            state: params.state,
            page_config: PageConfig::default(),
            status: params.status,
            error: Some(params.error),
            resolve: params.resolve,
        })
    }
}
