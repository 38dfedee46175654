//! Error pages and error serialisation.
//!
//! # Design Decisions
//! - `static_error_page` is the last resort: no I/O, no collaborators, cannot fail
//! - Stack traces (the error source chain) are only exposed when configured

use axum::http::StatusCode;
use axum::response::Response;
use serde_json::json;

use crate::error::{KitError, KitResult};
use crate::http::response::html;
use crate::runtime::event::RequestEvent;
use crate::runtime::options::SsrOptions;
use crate::runtime::render::ErrorPageParams;
use crate::runtime::resolve::ResolveOptions;
use crate::runtime::state::DispatchState;

/// Fallback document; `%kit.status%` and `%kit.error.message%` are substituted.
pub const DEFAULT_ERROR_TEMPLATE: &str = "<!DOCTYPE html>
<html lang=\"en\">
\t<head>
\t\t<meta charset=\"utf-8\" />
\t\t<title>%kit.error.message%</title>
\t</head>
\t<body>
\t\t<h1>%kit.status%</h1>
\t\t<p>%kit.error.message%</p>
\t</body>
</html>
";

/// Render an error page through the renderer.
pub async fn respond_with_error(
    event: &RequestEvent,
    options: &SsrOptions,
    state: &DispatchState,
    status: StatusCode,
    error: &KitError,
    resolve: &ResolveOptions,
) -> KitResult<Response> {
    tracing::debug!(status = %status, error = %error, "Rendering error page");

    options
        .renderer
        .render_error_page(ErrorPageParams {
            event,
            options,
            state,
            status,
            error,
            resolve,
        })
        .await
}

/// Minimal HTML error document built from the configured template.
pub fn static_error_page(options: &SsrOptions, status: StatusCode, message: &str) -> Response {
    let body = options
        .error_template
        .replace("%kit.status%", status.as_str())
        .replace("%kit.error.message%", &escape_html(message));

    html(status, body)
}

/// JSON body describing `error`.
pub fn serialize_error(error: &KitError, expose_stack: bool) -> String {
    let mut body = json!({
        "name": error.name(),
        "message": error.to_string(),
    });

    if expose_stack {
        body["stack"] = json!(error.chain());
    }

    body.to_string()
}

pub(crate) fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
