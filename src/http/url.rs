//! URL path decoding and normalization.
//!
//! # Responsibilities
//! - Decode request paths with URI semantics (reserved characters stay escaped)
//! - Finish decoding extracted params exactly once
//! - Compute the canonical trailing-slash form of a path
//!
//! # Design Decisions
//! - Malformed escapes and invalid UTF-8 are errors, never replaced lossily
//! - Reserved characters survive path decoding so `%2F` can never split a segment

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::routing::Params;

/// Path suffix that marks a data-only request for a page.
pub const DATA_SUFFIX: &str = "/__data.json";

/// Characters that `decode_uri` leaves percent-encoded.
const RESERVED: &[u8] = b";/?:@&=+$,#";

static ESCAPE: Lazy<Regex> = Lazy::new(|| Regex::new("%[0-9A-Fa-f]{2}").expect("valid regex"));

static RESERVED_ESCAPE: Lazy<Regex> = Lazy::new(|| {
    let alternatives: Vec<String> = RESERVED.iter().map(|b| format!("%{b:02X}")).collect();
    Regex::new(&format!("(?i){}", alternatives.join("|"))).expect("valid regex")
});

/// Path contained a malformed percent-encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Malformed URI")]
pub struct MalformedUri;

/// Trailing slash policy for page routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrailingSlash {
    /// `/about/` redirects to `/about`.
    #[default]
    Never,
    /// `/about` redirects to `/about/`.
    Always,
    /// Both forms are served as-is.
    Ignore,
}

/// Decode a path the way `decodeURI` does: every escape is decoded except
/// those that encode a reserved character.
pub fn decode_uri(input: &str) -> Result<String, MalformedUri> {
    decode(input, RESERVED)
}

/// Decode every percent-escape in `input`.
pub fn decode_uri_component(input: &str) -> Result<String, MalformedUri> {
    decode(input, &[])
}

fn decode(input: &str, keep: &[u8]) -> Result<String, MalformedUri> {
    if !input.contains('%') {
        return Ok(input.to_string());
    }

    // Every `%` must start a two-digit escape
    if ESCAPE.find_iter(input).count() != input.matches('%').count() {
        return Err(MalformedUri);
    }

    // Kept escapes are re-escaped so one decoding pass restores them
    let protected = ESCAPE.replace_all(input, |caps: &Captures<'_>| {
        let escape = &caps[0];
        match u8::from_str_radix(&escape[1..], 16) {
            Ok(byte) if keep.contains(&byte) => format!("%25{}", &escape[1..]),
            _ => escape.to_string(),
        }
    });

    urlencoding::decode(&protected)
        .map(Cow::into_owned)
        .map_err(|_| MalformedUri)
}

/// Decode the reserved characters `decode_uri` left escaped in param values.
///
/// Input has already been through `decode_uri`, so only the reserved
/// escapes remain and nothing is decoded twice.
pub fn decode_params(params: Params) -> Params {
    params
        .into_iter()
        .map(|(name, value)| (name, decode_reserved(&value)))
        .collect()
}

fn decode_reserved(value: &str) -> String {
    if !value.contains('%') {
        return value.to_string();
    }

    RESERVED_ESCAPE
        .replace_all(value, |caps: &Captures<'_>| {
            urlencoding::decode(&caps[0])
                .map(Cow::into_owned)
                .unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
}

/// Canonical form of `path` under the configured trailing slash policy.
pub fn normalize_path(path: &str, trailing_slash: TrailingSlash) -> String {
    if path == "/" {
        return path.to_string();
    }

    match trailing_slash {
        TrailingSlash::Ignore => path.to_string(),
        TrailingSlash::Never => path.strip_suffix('/').unwrap_or(path).to_string(),
        TrailingSlash::Always if !path.ends_with('/') => format!("{path}/"),
        TrailingSlash::Always => path.to_string(),
    }
}
