//! Process-wide dispatch options.

use std::fmt;
use std::sync::Arc;

use crate::config::{KitConfig, MethodOverrideConfig};
use crate::http::TrailingSlash;
use crate::routing::Manifest;
use crate::runtime::errors::DEFAULT_ERROR_TEMPLATE;
use crate::runtime::fetch::{Fetch, HttpFetch};
use crate::runtime::hooks::{DefaultHooks, Hooks};
use crate::runtime::render::Renderer;

/// Everything `respond` needs besides the request itself.
#[derive(Clone)]
pub struct SsrOptions {
    pub manifest: Arc<dyn Manifest>,
    pub hooks: Arc<dyn Hooks>,
    pub renderer: Arc<dyn Renderer>,
    pub fetch: Arc<dyn Fetch>,
    /// Mount prefix, empty for the root.
    pub base_path: String,
    pub trailing_slash: TrailingSlash,
    pub method_override: MethodOverrideConfig,
    /// Include the error chain in JSON error bodies.
    pub expose_stack: bool,
    pub adapter_name: String,
    /// Last-resort error document.
    pub error_template: String,
}

impl SsrOptions {
    pub fn new(manifest: Arc<dyn Manifest>, renderer: Arc<dyn Renderer>) -> Self {
        Self {
            manifest,
            hooks: Arc::new(DefaultHooks),
            renderer,
            fetch: Arc::new(HttpFetch::new()),
            base_path: String::new(),
            trailing_slash: TrailingSlash::default(),
            method_override: MethodOverrideConfig::default(),
            expose_stack: false,
            adapter_name: env!("CARGO_PKG_NAME").to_string(),
            error_template: DEFAULT_ERROR_TEMPLATE.to_string(),
        }
    }

    /// Options taking paths, trailing slash, method override and error
    /// exposure from `config`.
    pub fn from_config(config: &KitConfig, manifest: Arc<dyn Manifest>, renderer: Arc<dyn Renderer>) -> Self {
        let mut options = Self::new(manifest, renderer)
            .with_base_path(config.paths.base.clone())
            .with_trailing_slash(config.trailing_slash)
            .with_method_override(config.method_override.clone())
            .with_expose_stack(config.observability.expose_stack);

        if !config.adapter_name.is_empty() {
            options.adapter_name = config.adapter_name.clone();
        }
        options
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn Hooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_fetch(mut self, fetch: Arc<dyn Fetch>) -> Self {
        self.fetch = fetch;
        self
    }

    pub fn with_base_path(mut self, base: impl Into<String>) -> Self {
        self.base_path = base.into();
        self
    }

    pub fn with_trailing_slash(mut self, trailing_slash: TrailingSlash) -> Self {
        self.trailing_slash = trailing_slash;
        self
    }

    pub fn with_method_override(mut self, method_override: MethodOverrideConfig) -> Self {
        self.method_override = method_override;
        self
    }

    pub fn with_expose_stack(mut self, expose_stack: bool) -> Self {
        self.expose_stack = expose_stack;
        self
    }

    pub fn with_error_template(mut self, template: impl Into<String>) -> Self {
        self.error_template = template.into();
        self
    }
}

impl fmt::Debug for SsrOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SsrOptions")
            .field("routes", &self.manifest.routes().len())
            .field("base_path", &self.base_path)
            .field("trailing_slash", &self.trailing_slash)
            .field("method_override", &self.method_override)
            .field("expose_stack", &self.expose_stack)
            .field("adapter_name", &self.adapter_name)
            .finish_non_exhaustive()
    }
}
