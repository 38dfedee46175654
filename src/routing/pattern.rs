//! Route id compilation.
//!
//! Turns a file-system style route id such as `blog/[slug]` or
//! `docs/[...path]` into an anchored regex plus the ordered parameter
//! names and matcher types that line up with its capture groups.
//!
//! # Design Decisions
//! - Compiled once at startup; a bad id is a configuration error
//! - Capture group `i + 1` always belongs to `names[i]`
//! - Param captures are reluctant so adjacent params in one segment split fairly

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::error::{KitError, KitResult};
use crate::http::url::decode_uri_component;

static PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\.\.\.)?([A-Za-z0-9_]+)(?:=([A-Za-z0-9_]+))?$").expect("valid regex"));

static REST_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[\.\.\.([A-Za-z0-9_]+)(?:=([A-Za-z0-9_]+))?\]$").expect("valid regex"));

static BRACKETED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[(.+?)\]").expect("valid regex"));

static GROUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\([^)]+\)$").expect("valid regex"));

static ENCODED_OPEN: Lazy<Regex> = Lazy::new(|| Regex::new("%5[Bb]").expect("valid regex"));

static ENCODED_CLOSE: Lazy<Regex> = Lazy::new(|| Regex::new("%5[Dd]").expect("valid regex"));

/// A route id compiled into a matchable pattern.
#[derive(Debug, Clone)]
pub struct CompiledRoute {
    /// Anchored pattern matched against the decoded request path.
    pub pattern: Regex,
    /// Parameter names, in capture group order.
    pub names: Vec<String>,
    /// Matcher type per parameter; `None` accepts any value.
    pub types: Vec<Option<String>>,
}

/// Returns `false` for `(group)` segments, which never appear in URLs.
pub fn affects_path(segment: &str) -> bool {
    !GROUP.is_match(segment)
}

/// Compile a route id.
pub fn parse_route_id(id: &str) -> KitResult<CompiledRoute> {
    let mut names = Vec::new();
    let mut types = Vec::new();

    if id.contains("][") {
        return Err(KitError::InvalidRoute {
            id: id.to_string(),
            reason: "parameters must be separated",
        });
    }

    if id.matches('[').count() != id.matches(']').count() {
        return Err(KitError::InvalidRoute {
            id: id.to_string(),
            reason: "brackets are unbalanced",
        });
    }

    if id.is_empty() {
        return Ok(CompiledRoute {
            pattern: Regex::new("^/$")?,
            names,
            types,
        });
    }

    // `/foo` gets an optional trailing slash, `/foo.json` does not
    let mut add_trailing_slash = true;

    let segments: Vec<&str> = id.split('/').filter(|s| affects_path(s)).collect();
    let mut source = String::from("^");

    for (i, segment) in segments.iter().enumerate() {
        let decoded = decode_uri_component(segment).map_err(|_| KitError::InvalidRoute {
            id: id.to_string(),
            reason: "segment contains a malformed percent-encoding",
        })?;

        // /[...rest] may match zero segments, so the slash is optional too
        if let Some(caps) = REST_SEGMENT.captures(&decoded) {
            names.push(caps[1].to_string());
            types.push(caps.get(2).map(|m| m.as_str().to_string()));
            source.push_str("(?:/(.*))?");
            continue;
        }

        if decoded.is_empty() {
            continue;
        }

        let is_last = i == segments.len() - 1;
        source.push('/');

        let mut cursor = 0;
        for caps in BRACKETED.captures_iter(&decoded) {
            let (Some(whole), Some(content)) = (caps.get(0), caps.get(1)) else {
                continue;
            };

            let literal = &decoded[cursor..whole.start()];
            if is_last && literal.contains('.') {
                add_trailing_slash = false;
            }
            source.push_str(&escape_literal(literal));

            let param = PARAM
                .captures(content.as_str())
                .ok_or_else(|| KitError::InvalidParam(content.as_str().to_string()))?;
            names.push(param[2].to_string());
            types.push(param.get(3).map(|m| m.as_str().to_string()));
            source.push_str(if param.get(1).is_some() { "(.*?)" } else { "([^/]+?)" });

            cursor = whole.end();
        }

        let literal = &decoded[cursor..];
        if is_last && literal.contains('.') {
            add_trailing_slash = false;
        }
        source.push_str(&escape_literal(literal));
    }

    if add_trailing_slash {
        source.push_str("/?");
    }
    source.push('$');

    tracing::trace!(route_id = %id, pattern = %source, "Compiled route");

    Ok(CompiledRoute {
        pattern: Regex::new(&source)?,
        names,
        types,
    })
}

/// Prepare literal route text for matching against a `decode_uri` path.
fn escape_literal(content: &str) -> String {
    if content.is_empty() {
        return String::new();
    }

    // `[` and `]` delimit params, so files spell them `%5B` / `%5D`
    let normalized: String = content.nfc().collect();
    let unescaped = ENCODED_OPEN.replace_all(&normalized, "[");
    let unescaped = ENCODED_CLOSE.replace_all(&unescaped, "]");

    // `#` and `?` stay encoded after `decode_uri`, so match them encoded
    let encoded = unescaped.replace('#', "%23").replace('?', "%3F");

    regex::escape(&encoded)
}
