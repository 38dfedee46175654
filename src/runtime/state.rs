//! Per-request dispatch state supplied by the caller.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, Mutex};

/// Client address accessor provided by the hosting adapter.
pub type ClientAddress = Arc<dyn Fn() -> String + Send + Sync>;

/// Adapter-specific platform handle (bindings, context objects, ...).
pub type Platform = Arc<dyn Any + Send + Sync>;

/// Who triggered this dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Initiator {
    /// Rendering the generic error page; an unmatched route must not recurse.
    GenericError,
    /// A `fetch` made while loading the given route.
    Route(String),
}

/// Prerendering flags. `cache` receives any `cache-control` the page sets.
#[derive(Debug, Default)]
pub struct PrerenderState {
    /// Rendering the client-only fallback shell.
    pub fallback: bool,
    cache: Mutex<Option<String>>,
}

impl PrerenderState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fallback() -> Self {
        Self {
            fallback: true,
            ..Self::default()
        }
    }

    /// Last `cache-control` value set while prerendering.
    pub fn cache(&self) -> Option<String> {
        self.cache.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub(crate) fn set_cache(&self, value: &str) {
        *self.cache.lock().unwrap_or_else(|e| e.into_inner()) = Some(value.to_string());
    }
}

/// Request-scoped state the pipeline reads (and, for the cache, writes back).
#[derive(Clone, Default)]
pub struct DispatchState {
    pub prerendering: Option<Arc<PrerenderState>>,
    /// `None` for requests straight from a user.
    pub initiator: Option<Initiator>,
    pub client_address: Option<ClientAddress>,
    pub platform: Option<Platform>,
}

impl DispatchState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prerendering(mut self, prerendering: Arc<PrerenderState>) -> Self {
        self.prerendering = Some(prerendering);
        self
    }

    pub fn with_initiator(mut self, initiator: Initiator) -> Self {
        self.initiator = Some(initiator);
        self
    }

    pub fn with_client_address(mut self, f: impl Fn() -> String + Send + Sync + 'static) -> Self {
        self.client_address = Some(Arc::new(f));
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    pub fn is_prerendering(&self) -> bool {
        self.prerendering.is_some()
    }

    /// True while rendering the prerender fallback shell.
    pub fn is_fallback(&self) -> bool {
        self.prerendering.as_ref().is_some_and(|p| p.fallback)
    }
}

impl fmt::Debug for DispatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchState")
            .field("prerendering", &self.prerendering)
            .field("initiator", &self.initiator)
            .field("client_address", &self.client_address.is_some())
            .field("platform", &self.platform.is_some())
            .finish()
    }
}
