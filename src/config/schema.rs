//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the router.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::http::TrailingSlash;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct KitConfig {
    /// Listener configuration (bind address, body limit).
    pub listener: ListenerConfig,

    /// Path configuration.
    pub paths: PathsConfig,

    /// Canonical form of page paths.
    pub trailing_slash: TrailingSlash,

    /// Form method override.
    pub method_override: MethodOverrideConfig,

    /// Route table for the bundled server, in match order.
    pub routes: Vec<RouteConfig>,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Name reported in adapter-related errors.
    pub adapter_name: String,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,

    /// Maximum buffered request body size.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            max_body_bytes: 512 * 1024,
        }
    }
}

/// Path configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct PathsConfig {
    /// Prefix the app is mounted under (e.g., "/docs"). Empty for the root.
    pub base: String,
}

/// Method override via a query parameter on POST requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MethodOverrideConfig {
    /// Query parameter carrying the method.
    pub parameter: String,

    /// Methods a POST may be turned into. Empty disables overriding.
    pub allowed: Vec<String>,
}

impl Default for MethodOverrideConfig {
    fn default() -> Self {
        Self {
            parameter: "_method".to_string(),
            allowed: Vec::new(),
        }
    }
}

impl MethodOverrideConfig {
    pub fn is_allowed(&self, method: &str) -> bool {
        self.allowed.iter().any(|m| m.eq_ignore_ascii_case(method))
    }
}

/// What a configured route serves.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RouteKind {
    #[default]
    Page,
    Endpoint,
}

/// A route served by the bundled server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route id (e.g., "blog/[slug]").
    pub id: String,

    #[serde(default)]
    pub kind: RouteKind,

    /// Static body for endpoints; page title for pages.
    pub body: Option<String>,

    /// Endpoint content type (default: text/plain).
    pub content_type: Option<String>,

    /// ETag attached to endpoint responses.
    pub etag: Option<String>,

    /// Cache-Control attached to endpoint responses.
    pub cache_control: Option<String>,
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,

    /// Include the error chain in JSON error bodies.
    pub expose_stack: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
            expose_stack: false,
        }
    }
}
