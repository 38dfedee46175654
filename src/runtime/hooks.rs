//! User hooks wrapping dispatch.

use axum::response::Response;
use futures_util::future::BoxFuture;

use crate::error::{KitError, KitResult};
use crate::runtime::event::RequestEvent;
use crate::runtime::resolve::Resolve;

/// Middleware around every dispatched request.
pub trait Hooks: Send + Sync {
    /// Produce the response for `event`. Rendering only happens through `resolve`.
    fn handle<'a>(
        &'a self,
        event: &'a RequestEvent,
        resolve: Resolve<'a>,
    ) -> BoxFuture<'a, KitResult<Response>> {
        Box::pin(resolve.call(event, None))
    }

    /// Observe a failure raised while handling `event`. Called once per failure.
    fn handle_error<'a>(&'a self, error: &'a KitError, event: &'a RequestEvent) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            tracing::error!(
                url = %event.url(),
                route_id = ?event.route_id(),
                error = %error.chain(),
                "Request failed"
            );
        })
    }
}

/// Hooks that resolve directly and log failures.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHooks;

impl Hooks for DefaultHooks {}
