//! Request wrapper seen by the dispatch pipeline.
//!
//! # Responsibilities
//! - Pair the incoming request with its absolute URL
//! - Expose the effective method (after method override) without mutating the request
//! - Rebuild a plain `Request` for forwarding over the network
//!
//! # Design Decisions
//! - Body is buffered up front so every stage can share the request by reference
//! - The override lives beside the original method; every other field delegates

use axum::body::{Body, Bytes};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, Method, Request, Uri};
use url::Url;

use crate::error::{KitError, KitResult};

/// An incoming request with its absolute URL and effective method.
#[derive(Debug)]
pub struct KitRequest {
    parts: Parts,
    body: Bytes,
    url: Url,
    method_override: Option<Method>,
}

impl KitRequest {
    /// Build from request parts and a buffered body.
    ///
    /// Origin-form URIs (`/path?q`) are resolved against the `Host` header.
    pub fn from_parts(parts: Parts, body: Bytes) -> KitResult<Self> {
        let url = absolute_url(&parts.uri, &parts.headers)?;
        Ok(Self {
            parts,
            body,
            url,
            method_override: None,
        })
    }

    /// Build from a request whose body is already in memory.
    pub fn new(request: Request<Bytes>) -> KitResult<Self> {
        let (parts, body) = request.into_parts();
        Self::from_parts(parts, body)
    }

    /// Wrap this request so that `method()` reports `method`.
    pub fn with_method(mut self, method: Method) -> Self {
        self.method_override = Some(method);
        self
    }

    /// Effective method, after any method override.
    pub fn method(&self) -> &Method {
        self.method_override.as_ref().unwrap_or(&self.parts.method)
    }

    /// Method the client actually sent.
    pub fn original_method(&self) -> &Method {
        &self.parts.method
    }

    pub fn is_overridden(&self) -> bool {
        self.method_override.is_some()
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn uri(&self) -> &Uri {
        &self.parts.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    /// Header value as a string, if present and visible ASCII.
    pub fn header(&self, name: impl header::AsHeaderName) -> Option<&str> {
        self.parts.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// First value of a query parameter.
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    /// Rebuild an outgoing request carrying the effective method.
    pub fn to_http(&self) -> KitResult<Request<Body>> {
        let mut builder = Request::builder()
            .method(self.method().clone())
            .uri(self.url.as_str())
            .version(self.parts.version);

        if let Some(headers) = builder.headers_mut() {
            headers.extend(self.parts.headers.clone());
        }

        Ok(builder.body(Body::from(self.body.clone()))?)
    }
}

fn absolute_url(uri: &Uri, headers: &HeaderMap) -> KitResult<Url> {
    let invalid = |reason: String| KitError::http(axum::http::StatusCode::BAD_REQUEST, reason);

    if uri.scheme().is_some() && uri.authority().is_some() {
        return Url::parse(&uri.to_string()).map_err(|e| invalid(format!("Invalid URL: {e}")));
    }

    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost");
    let path = uri.path_and_query().map(|p| p.as_str()).unwrap_or("/");

    Url::parse(&format!("http://{host}{path}")).map_err(|e| invalid(format!("Invalid URL: {e}")))
}
