//! Ambient network fetch for requests no route can serve.

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use futures_util::future::BoxFuture;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::error::{KitError, KitResult};

/// Performs a real HTTP request on behalf of the dispatcher.
pub trait Fetch: Send + Sync {
    fn fetch(&self, request: Request<Body>) -> BoxFuture<'_, KitResult<Response>>;
}

/// Forwards requests over plain HTTP.
#[derive(Clone)]
pub struct HttpFetch {
    client: Client<HttpConnector, Body>,
}

impl HttpFetch {
    pub fn new() -> Self {
        Self {
            client: Client::builder(TokioExecutor::new()).build(HttpConnector::new()),
        }
    }
}

impl Default for HttpFetch {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetch for HttpFetch {
    fn fetch(&self, request: Request<Body>) -> BoxFuture<'_, KitResult<Response>> {
        Box::pin(async move {
            let uri = request.uri().clone();
            let response = self.client.request(request).await.map_err(|e| {
                tracing::error!(uri = %uri, error = %e, "Fetch failed");
                KitError::Fetch(e.to_string())
            })?;

            let (parts, body) = response.into_parts();
            Ok(Response::from_parts(parts, Body::new(body)))
        })
    }
}
