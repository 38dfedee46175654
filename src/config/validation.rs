//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the base path and method override settings
//! - Compile every configured route id
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: KitConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;

use axum::http::Method;

use crate::config::schema::KitConfig;
use crate::routing::pattern::parse_route_id;

/// A single semantic problem in a config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check `config` and collect every problem found.
pub fn validate_config(config: &KitConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let base = &config.paths.base;
    if !base.is_empty() && (!base.starts_with('/') || base.ends_with('/')) {
        errors.push(ValidationError::new(
            "paths.base",
            "must be a root-relative path that starts but does not end with '/' (e.g. \"/base-path\"), or empty",
        ));
    }

    if config.method_override.parameter.is_empty() {
        errors.push(ValidationError::new("method_override.parameter", "must not be empty"));
    }

    for method in &config.method_override.allowed {
        let upper = method.to_ascii_uppercase();
        if upper == "GET" || upper == "HEAD" {
            errors.push(ValidationError::new(
                "method_override.allowed",
                format!("{method} cannot be overridden into"),
            ));
        } else if Method::from_bytes(upper.as_bytes()).is_err() {
            errors.push(ValidationError::new(
                "method_override.allowed",
                format!("{method} is not a valid method"),
            ));
        }
    }

    for (i, route) in config.routes.iter().enumerate() {
        if let Err(e) = parse_route_id(&route.id) {
            errors.push(ValidationError::new(format!("routes[{i}].id"), e.to_string()));
        }
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::RouteConfig;

    fn route(id: &str) -> RouteConfig {
        RouteConfig {
            id: id.to_string(),
            kind: Default::default(),
            body: None,
            content_type: None,
            etag: None,
            cache_control: None,
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&KitConfig::default()).is_ok());
    }

    #[test]
    fn test_all_errors_are_reported() {
        let mut config = KitConfig::default();
        config.paths.base = "docs/".to_string();
        config.method_override.allowed = vec!["GET".into(), "PUT".into(), "bad method".into()];
        config.routes = vec![route("blog/[slug]"), route("[a][b]")];

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "paths.base",
                "method_override.allowed",
                "method_override.allowed",
                "routes[1].id",
            ]
        );
    }

    #[test]
    fn test_base_path_rules() {
        for (base, ok) in [("", true), ("/docs", true), ("/", false), ("/docs/", false), ("docs", false)] {
            let mut config = KitConfig::default();
            config.paths.base = base.to_string();
            assert_eq!(validate_config(&config).is_ok(), ok, "{base:?}");
        }
    }
}
