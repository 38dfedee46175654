//! The request event handed to hooks, renderers and endpoints.
//!
//! # Responsibilities
//! - Carry the request, its URL, matched route id and params
//! - Queue response headers and cookies set by user code
//! - Hold locals passed from the handle hook to later stages
//!
//! # Design Decisions
//! - Setting a header twice, or queuing the same cookie twice, is an error
//!   rather than a silent overwrite
//! - Removed fields are accessor methods that always fail through one helper

use std::convert::Infallible;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};
use axum::http::Extensions;
use url::Url;

use crate::error::{KitError, KitResult};
use crate::http::KitRequest;
use crate::routing::Params;
use crate::runtime::state::{ClientAddress, DispatchState, Platform, PrerenderState};

/// One or several values for a header passed to `RequestEvent::set_headers`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderInput {
    One(String),
    Many(Vec<String>),
}

impl From<&str> for HeaderInput {
    fn from(value: &str) -> Self {
        HeaderInput::One(value.to_string())
    }
}

impl From<String> for HeaderInput {
    fn from(value: String) -> Self {
        HeaderInput::One(value)
    }
}

impl From<Vec<String>> for HeaderInput {
    fn from(values: Vec<String>) -> Self {
        HeaderInput::Many(values)
    }
}

impl From<Vec<&str>> for HeaderInput {
    fn from(values: Vec<&str>) -> Self {
        HeaderInput::Many(values.into_iter().map(str::to_string).collect())
    }
}

/// Headers and cookies queued for the final response.
#[derive(Debug, Default, Clone)]
pub struct QueuedResponse {
    pub headers: HeaderMap,
    pub cookies: Vec<HeaderValue>,
}

/// Everything user code can see about the current request.
pub struct RequestEvent {
    request: KitRequest,
    url: Url,
    params: Params,
    route_id: Option<String>,
    locals: Mutex<Extensions>,
    platform: Option<Platform>,
    client_address: Option<ClientAddress>,
    adapter_name: String,
    search_disabled: bool,
    prerendering: Option<Arc<PrerenderState>>,
    queued: Mutex<QueuedResponse>,
}

impl RequestEvent {
    /// Build the event for a matched (or unmatched) request.
    pub fn new(
        request: KitRequest,
        route_id: Option<String>,
        params: Params,
        state: &DispatchState,
        adapter_name: impl Into<String>,
    ) -> Self {
        let search_disabled = state.is_prerendering();
        let mut url = request.url().clone();
        if search_disabled {
            url.set_query(None);
        }

        Self {
            request,
            url,
            params,
            route_id,
            locals: Mutex::new(Extensions::new()),
            platform: state.platform.clone(),
            client_address: state.client_address.clone(),
            adapter_name: adapter_name.into(),
            search_disabled,
            prerendering: state.prerendering.clone(),
            queued: Mutex::new(QueuedResponse::default()),
        }
    }

    pub fn request(&self) -> &KitRequest {
        &self.request
    }

    /// Request URL. The query is stripped while prerendering.
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Id of the matched route, if any.
    pub fn route_id(&self) -> Option<&str> {
        self.route_id.as_deref()
    }

    /// Values shared between the handle hook and later stages.
    pub fn locals(&self) -> MutexGuard<'_, Extensions> {
        self.locals.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn platform(&self) -> Option<&Platform> {
        self.platform.as_ref()
    }

    /// Address of the connecting client, as reported by the adapter.
    pub fn get_client_address(&self) -> KitResult<String> {
        match &self.client_address {
            Some(f) => Ok(f()),
            None => Err(KitError::ClientAddressUnavailable {
                adapter: self.adapter_name.clone(),
            }),
        }
    }

    /// Raw query string. Unavailable while prerendering.
    pub fn search(&self) -> KitResult<&str> {
        if self.search_disabled {
            return Err(KitError::SearchDisabled("search"));
        }
        Ok(self.request.url().query().unwrap_or(""))
    }

    /// Decoded query pairs. Unavailable while prerendering.
    pub fn search_params(&self) -> KitResult<Vec<(String, String)>> {
        if self.search_disabled {
            return Err(KitError::SearchDisabled("searchParams"));
        }
        Ok(self.request.url().query_pairs().into_owned().collect())
    }

    /// Queue response headers.
    ///
    /// `set-cookie` values are appended; any other header may only be set once
    /// per request (names compare case-insensitively).
    pub fn set_headers<I, K, V>(&self, headers: I) -> KitResult<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<HeaderInput>,
    {
        let mut queued = self.queued.lock().unwrap_or_else(|e| e.into_inner());

        for (key, value) in headers {
            let key = key.as_ref();
            let name = HeaderName::from_bytes(key.to_ascii_lowercase().as_bytes()).map_err(|e| {
                KitError::InvalidHeader {
                    name: key.to_string(),
                    reason: e.to_string(),
                }
            })?;

            if name == header::SET_COOKIE {
                let cookies = match value.into() {
                    HeaderInput::One(cookie) => vec![cookie],
                    HeaderInput::Many(cookies) => cookies,
                };

                for cookie in cookies {
                    let cookie = header_value(key, &cookie)?;
                    if queued.cookies.contains(&cookie) {
                        return Err(KitError::DuplicateCookie(key.to_string()));
                    }
                    queued.cookies.push(cookie);
                }
            } else if queued.headers.contains_key(&name) {
                return Err(KitError::HeaderAlreadySet(key.to_string()));
            } else {
                let value = match value.into() {
                    HeaderInput::One(value) => value,
                    HeaderInput::Many(values) => values.join(", "),
                };

                if name == header::CACHE_CONTROL {
                    if let Some(prerendering) = &self.prerendering {
                        prerendering.set_cache(&value);
                    }
                }

                queued.headers.insert(name, header_value(key, &value)?);
            }
        }

        Ok(())
    }

    /// Snapshot of the queued headers and cookies.
    pub fn queued(&self) -> QueuedResponse {
        self.queued.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    #[deprecated(note = "use get_client_address()")]
    pub fn client_address(&self) -> KitResult<Infallible> {
        Err(removed("client_address", "event.get_client_address()"))
    }

    #[deprecated(note = "use request().method()")]
    pub fn method(&self) -> KitResult<Infallible> {
        Err(removed("method", "event.request().method()"))
    }

    #[deprecated(note = "use request().headers()")]
    pub fn headers(&self) -> KitResult<Infallible> {
        Err(removed("headers", "event.request().headers()"))
    }

    #[deprecated(note = "use url().origin()")]
    pub fn origin(&self) -> KitResult<Infallible> {
        Err(removed("origin", "event.url().origin()"))
    }

    #[deprecated(note = "use url().path()")]
    pub fn path(&self) -> KitResult<Infallible> {
        Err(removed("path", "event.url().path()"))
    }

    #[deprecated(note = "use search_params()")]
    pub fn query(&self) -> KitResult<Infallible> {
        Err(removed("query", "event.search_params()"))
    }

    #[deprecated(note = "use request().body()")]
    pub fn body(&self) -> KitResult<Infallible> {
        Err(removed("body", "event.request().body()"))
    }

    #[deprecated(note = "use request().body()")]
    pub fn raw_body(&self) -> KitResult<Infallible> {
        Err(removed("raw_body", "event.request().body()"))
    }
}

fn removed(field: &'static str, replacement: &'static str) -> KitError {
    KitError::RemovedField { field, replacement }
}

fn header_value(name: &str, value: &str) -> KitResult<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| KitError::InvalidHeader {
        name: name.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use axum::http::Request;

    fn event(state: &DispatchState) -> RequestEvent {
        let request = KitRequest::new(
            Request::builder()
                .uri("/blog/hello?draft=1")
                .header("host", "example.com")
                .body(Bytes::new())
                .unwrap(),
        )
        .unwrap();

        let mut params = Params::new();
        params.insert("slug".into(), "hello".into());
        RequestEvent::new(request, Some("blog/[slug]".into()), params, state, "test-adapter")
    }

    #[test]
    fn test_event_fields() {
        let event = event(&DispatchState::new());
        assert_eq!(event.route_id(), Some("blog/[slug]"));
        assert_eq!(event.param("slug"), Some("hello"));
        assert_eq!(event.url().path(), "/blog/hello");
        assert_eq!(event.search().unwrap(), "draft=1");
        assert_eq!(event.search_params().unwrap(), vec![("draft".to_string(), "1".to_string())]);
    }

    #[test]
    fn test_duplicate_header_is_rejected_case_insensitively() {
        let event = event(&DispatchState::new());
        event.set_headers([("Cache-Control", "max-age=60")]).unwrap();

        let err = event.set_headers([("cache-control", "no-store")]).unwrap_err();
        assert!(matches!(err, KitError::HeaderAlreadySet(ref k) if k == "cache-control"));
        assert_eq!(event.queued().headers[header::CACHE_CONTROL], "max-age=60");
    }

    #[test]
    fn test_cookies_queue_and_reject_exact_duplicates() {
        let event = event(&DispatchState::new());
        event.set_headers([("set-cookie", "a=1")]).unwrap();
        event.set_headers([("Set-Cookie", vec!["b=2", "c=3"])]).unwrap();

        let err = event.set_headers([("set-cookie", "a=1")]).unwrap_err();
        assert!(matches!(err, KitError::DuplicateCookie(_)));

        let queued = event.queued();
        assert_eq!(queued.cookies, vec!["a=1", "b=2", "c=3"]);
        assert!(queued.headers.is_empty());
    }

    #[test]
    fn test_multiple_values_are_joined() {
        let event = event(&DispatchState::new());
        event.set_headers([("vary", vec!["accept", "cookie"])]).unwrap();
        assert_eq!(event.queued().headers[header::VARY], "accept, cookie");
    }

    #[test]
    fn test_invalid_header_name() {
        let event = event(&DispatchState::new());
        let err = event.set_headers([("bad header", "x")]).unwrap_err();
        assert!(matches!(err, KitError::InvalidHeader { .. }));
    }

    #[test]
    fn test_prerendering_mirrors_cache_control_and_hides_search() {
        let prerendering = Arc::new(PrerenderState::new());
        let state = DispatchState::new().with_prerendering(prerendering.clone());
        let event = event(&state);

        event.set_headers([("cache-control", "public, max-age=3600")]).unwrap();
        assert_eq!(prerendering.cache().as_deref(), Some("public, max-age=3600"));

        assert!(matches!(event.search(), Err(KitError::SearchDisabled("search"))));
        assert!(event.search_params().is_err());
    }

    #[test]
    fn test_prerendering_strips_query_from_url() {
        let state = DispatchState::new().with_prerendering(Arc::new(PrerenderState::new()));
        let event = event(&state);

        assert_eq!(event.url().path(), "/blog/hello");
        assert_eq!(event.url().query(), None);
        assert_eq!(event.url().query_pairs().count(), 0);
        assert_eq!(event.url().as_str(), "http://example.com/blog/hello");
    }

    #[test]
    fn test_client_address() {
        let event1 = event(&DispatchState::new());
        let err = event1.get_client_address().unwrap_err();
        assert_eq!(
            err.to_string(),
            "test-adapter does not specify getClientAddress. Please raise an issue"
        );

        let state = DispatchState::new().with_client_address(|| "10.0.0.1".to_string());
        assert_eq!(event(&state).get_client_address().unwrap(), "10.0.0.1");
    }

    #[test]
    fn test_locals() {
        #[derive(Clone, Debug, PartialEq)]
        struct User(&'static str);

        let event = event(&DispatchState::new());
        event.locals().insert(User("ada"));
        assert_eq!(event.locals().get::<User>(), Some(&User("ada")));
    }

    #[test]
    #[allow(deprecated)]
    fn test_removed_fields_fail() {
        let event = event(&DispatchState::new());

        let err = event.path().unwrap_err();
        assert_eq!(err.to_string(), "event.path has been replaced by event.url().path()");
        assert!(event.client_address().is_err());
        assert!(event.method().is_err());
        assert!(event.headers().is_err());
        assert!(event.origin().is_err());
        assert!(event.query().is_err());
        assert!(event.body().is_err());
        assert!(event.raw_body().is_err());
    }
}
