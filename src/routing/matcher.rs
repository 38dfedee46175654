//! Param matchers and parameter extraction.
//!
//! # Responsibilities
//! - Define the `ParamMatcher` predicate applications register per type tag
//! - Turn a successful pattern match into named params
//! - Reject the candidate (not the request) when a matcher says no
//!
//! # Design Decisions
//! - A missing matcher is a configuration error and fails the request hard
//! - A rejecting matcher is a soft miss so the next route can be tried

use std::collections::HashMap;
use std::sync::Arc;

use regex::Captures;

use crate::error::{KitError, KitResult};
use crate::routing::Params;

/// Predicate deciding whether a raw captured value is acceptable for a typed param.
pub trait ParamMatcher: Send + Sync {
    /// Returns true if `value` is accepted.
    fn matches(&self, value: &str) -> bool;
}

impl<F> ParamMatcher for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn matches(&self, value: &str) -> bool {
        self(value)
    }
}

/// Matchers keyed by the type tag used in route ids (`[id=integer]`).
pub type Matchers = HashMap<String, Arc<dyn ParamMatcher>>;

/// Extract params from a pattern match.
///
/// Returns `Ok(None)` when a matcher rejects its value.
pub fn exec(
    captures: &Captures<'_>,
    names: &[String],
    types: &[Option<String>],
    matchers: &Matchers,
) -> KitResult<Option<Params>> {
    let mut params = Params::new();

    for (i, name) in names.iter().enumerate() {
        let value = captures.get(i + 1).map(|m| m.as_str()).unwrap_or("");

        if let Some(Some(type_tag)) = types.get(i) {
            let matcher = matchers
                .get(type_tag)
                .ok_or_else(|| KitError::MissingMatcher(type_tag.clone()))?;

            if !matcher.matches(value) {
                return Ok(None);
            }
        }

        params.insert(name.clone(), value.to_string());
    }

    Ok(Some(params))
}
