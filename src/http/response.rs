//! Response construction and post-processing.
//!
//! # Responsibilities
//! - Build the small fixed responses the pipeline returns directly
//! - Copy queued headers and cookies onto rendered responses
//! - Answer conditional requests with 304 when the ETag matches
//!
//! # Design Decisions
//! - Helpers here are infallible; header values are validated where they are queued
//! - Cookies are appended (several `set-cookie` headers are legal), other headers replace

use axum::body::Body;
use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::error::KitResult;

/// Header attached to trailing-slash redirects.
pub const X_NORMALIZE: HeaderName = HeaderName::from_static("x-sveltekit-normalize");

/// Headers carried over onto a 304 (RFC 7232 section 4.1).
const NOT_MODIFIED_HEADERS: [HeaderName; 5] = [
    header::CACHE_CONTROL,
    header::CONTENT_LOCATION,
    header::DATE,
    header::EXPIRES,
    header::VARY,
];

/// Plain text response.
pub fn text(status: StatusCode, body: impl Into<String>) -> Response {
    (status, body.into()).into_response()
}

/// JSON response with an explicit UTF-8 charset.
pub fn json(status: StatusCode, body: String) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/json; charset=utf-8")],
        body,
    )
        .into_response()
}

/// HTML response.
pub fn html(status: StatusCode, body: String) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        body,
    )
        .into_response()
}

/// 301 to the canonical form of a page path.
pub fn normalize_redirect(location: &str) -> KitResult<Response> {
    Ok(Response::builder()
        .status(StatusCode::MOVED_PERMANENTLY)
        .header(X_NORMALIZE, "1")
        .header(header::LOCATION, location)
        .body(Body::empty())?)
}

/// Copy queued event headers (unless this is a data request) and cookies onto `response`.
pub fn apply_queued(
    response: &mut Response,
    headers: &HeaderMap,
    cookies: &[HeaderValue],
    is_data_request: bool,
) {
    let target = response.headers_mut();

    if !is_data_request {
        for (name, value) in headers {
            target.insert(name.clone(), value.clone());
        }
    }

    for cookie in cookies {
        target.append(header::SET_COOKIE, cookie.clone());
    }
}

/// Build a 304 if `response` is a 200 whose ETag matches `If-None-Match`.
pub fn not_modified(response: &Response, request_headers: &HeaderMap) -> Option<Response> {
    if response.status() != StatusCode::OK {
        return None;
    }

    let etag = response.headers().get(header::ETAG)?;
    let if_none_match = request_headers.get(header::IF_NONE_MATCH)?.as_bytes();

    // Weak validators compare on the opaque tag alone
    let if_none_match = match if_none_match.strip_prefix(b"W/") {
        Some(rest) if rest.starts_with(b"\"") => rest,
        _ => if_none_match,
    };

    if if_none_match != etag.as_bytes() {
        return None;
    }

    let mut headers = HeaderMap::new();
    headers.insert(header::ETAG, etag.clone());
    for name in NOT_MODIFIED_HEADERS {
        if let Some(value) = response.headers().get(&name) {
            headers.insert(name, value.clone());
        }
    }

    Some((StatusCode::NOT_MODIFIED, headers).into_response())
}
