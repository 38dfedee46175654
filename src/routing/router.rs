//! Route table and lookup.
//!
//! # Responsibilities
//! - Hold routes compiled from their ids, in declaration order
//! - Look up the first route whose pattern and matchers accept a path
//! - Return the matched route with decoded params, or an explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (shared by concurrent requests without locks)
//! - First match wins; a rejecting matcher moves on to the next candidate
//! - O(n) scan in declaration order, which is what route ids are sorted for

use std::fmt;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use regex::Regex;

use crate::error::KitResult;
use crate::http::url::decode_params;
use crate::routing::matcher::{exec, Matchers, ParamMatcher};
use crate::routing::pattern::parse_route_id;
use crate::routing::Params;
use crate::runtime::render::Endpoint;

/// Indices of the layout, error and leaf nodes that make up a page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageNodes {
    pub layouts: Vec<Option<usize>>,
    pub errors: Vec<Option<usize>>,
    pub leaf: usize,
}

/// A single entry of the route table.
#[derive(Clone)]
pub struct Route {
    /// Route id as declared (`blog/[slug]`).
    pub id: String,
    pub pattern: Regex,
    pub names: Vec<String>,
    pub types: Vec<Option<String>>,
    /// Set when the route renders a page.
    pub page: Option<PageNodes>,
    /// Set when the route has a standalone endpoint.
    pub endpoint: Option<Arc<dyn Endpoint>>,
}

impl Route {
    /// Compile `id` into a route with no handlers attached.
    pub fn new(id: impl Into<String>) -> KitResult<Self> {
        let id = id.into();
        let compiled = parse_route_id(&id)?;

        Ok(Self {
            id,
            pattern: compiled.pattern,
            names: compiled.names,
            types: compiled.types,
            page: None,
            endpoint: None,
        })
    }

    /// Compile a page route.
    pub fn page(id: impl Into<String>, nodes: PageNodes) -> KitResult<Self> {
        Ok(Self::new(id)?.with_page(nodes))
    }

    /// Compile an endpoint-only route.
    pub fn endpoint(id: impl Into<String>, endpoint: Arc<dyn Endpoint>) -> KitResult<Self> {
        Ok(Self::new(id)?.with_endpoint(endpoint))
    }

    pub fn with_page(mut self, nodes: PageNodes) -> Self {
        self.page = Some(nodes);
        self
    }

    pub fn with_endpoint(mut self, endpoint: Arc<dyn Endpoint>) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    /// Try this route against a decoded path.
    pub fn exec(&self, path: &str, matchers: &Matchers) -> KitResult<Option<Params>> {
        match self.pattern.captures(path) {
            Some(captures) => exec(&captures, &self.names, &self.types, matchers),
            None => Ok(None),
        }
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("id", &self.id)
            .field("pattern", &self.pattern.as_str())
            .field("names", &self.names)
            .field("types", &self.types)
            .field("page", &self.page)
            .field("endpoint", &self.endpoint.is_some())
            .finish()
    }
}

/// Source of the route table and param matchers.
pub trait Manifest: Send + Sync {
    /// Load the param matchers. Called once per request that needs routing.
    fn matchers(&self) -> BoxFuture<'_, KitResult<Matchers>>;

    /// Routes in declaration order.
    fn routes(&self) -> &[Route];
}

/// A manifest whose routes and matchers are known up front.
#[derive(Clone, Default)]
pub struct StaticManifest {
    routes: Vec<Route>,
    matchers: Matchers,
}

impl StaticManifest {
    pub fn new(routes: Vec<Route>) -> Self {
        Self {
            routes,
            matchers: Matchers::new(),
        }
    }

    /// Register a matcher for `[name=type]` params.
    pub fn with_matcher(mut self, type_tag: impl Into<String>, matcher: impl ParamMatcher + 'static) -> Self {
        self.matchers.insert(type_tag.into(), Arc::new(matcher));
        self
    }

    pub fn push(&mut self, route: Route) {
        self.routes.push(route);
    }
}

impl Manifest for StaticManifest {
    fn matchers(&self) -> BoxFuture<'_, KitResult<Matchers>> {
        Box::pin(async move { Ok(self.matchers.clone()) })
    }

    fn routes(&self) -> &[Route] {
        &self.routes
    }
}

/// Find the first route accepting `path`, returning it with decoded params.
pub fn match_route<'r>(
    routes: &'r [Route],
    path: &str,
    matchers: &Matchers,
) -> KitResult<Option<(&'r Route, Params)>> {
    for candidate in routes {
        if let Some(params) = candidate.exec(path, matchers)? {
            tracing::debug!(route_id = %candidate.id, path = %path, "Route matched");
            return Ok(Some((candidate, decode_params(params))));
        }
    }

    Ok(None)
}
