//! Error types shared by the routing and dispatch subsystems.

use axum::http::StatusCode;
use thiserror::Error;

/// Boxed error produced by user code (hooks, renderers, endpoints).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result alias used throughout the crate.
pub type KitResult<T> = Result<T, KitError>;

/// Errors raised while compiling routes or dispatching a request.
#[derive(Debug, Error)]
pub enum KitError {
    /// Route id is structurally invalid (adjacent or unbalanced brackets).
    #[error("Invalid route {id}: {reason}")]
    InvalidRoute { id: String, reason: &'static str },

    /// A bracketed segment does not follow `[...name=type]` syntax.
    #[error("Invalid param: {0}. Params and matcher names can only have underscores and alphanumeric characters.")]
    InvalidParam(String),

    /// Compiled route pattern was rejected by the regex engine.
    #[error("Invalid route pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// A route references a param matcher that the manifest does not provide.
    #[error("Missing \"{0}\" param matcher")]
    MissingMatcher(String),

    /// Method override used on a request that is not a POST.
    #[error("{parameter}={method} is only allowed with POST requests")]
    MethodOverrideNotPost { parameter: String, method: String },

    /// A resolve option that no longer exists was supplied.
    #[error("{option} has been removed: {hint}")]
    RemovedOption {
        option: &'static str,
        hint: &'static str,
    },

    /// A request event field that no longer exists was accessed.
    #[error("event.{field} has been replaced by {replacement}")]
    RemovedField {
        field: &'static str,
        replacement: &'static str,
    },

    /// A response header was set twice through the event.
    #[error("\"{0}\" header is already set")]
    HeaderAlreadySet(String),

    /// An identical cookie was queued twice through the event.
    #[error("\"{0}\" header already has cookie with same value")]
    DuplicateCookie(String),

    /// A header name or value could not be represented in HTTP.
    #[error("Invalid header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },

    /// The hosting adapter did not provide a client address accessor.
    #[error("{adapter} does not specify getClientAddress. Please raise an issue")]
    ClientAddressUnavailable { adapter: String },

    /// Search params were accessed while prerendering.
    #[error("Cannot access url.{0} on a page with prerendering enabled")]
    SearchDisabled(&'static str),

    /// Explicit HTTP failure with a status (e.g. not found).
    #[error("{message}")]
    Http { status: StatusCode, message: String },

    /// Failure building an HTTP response.
    #[error("HTTP error: {0}")]
    Response(#[from] axum::http::Error),

    /// Failure forwarding a request over the network.
    #[error("Fetch failed: {0}")]
    Fetch(String),

    /// Failure raised by user code.
    #[error(transparent)]
    Handler(#[from] BoxError),
}

impl KitError {
    /// Create an explicit HTTP error.
    pub fn http(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Status code a rendered error page should carry for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            KitError::Http { status, .. } => *status,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short machine-readable name of the error kind.
    pub fn name(&self) -> &'static str {
        match self {
            KitError::InvalidRoute { .. } => "InvalidRoute",
            KitError::InvalidParam(_) => "InvalidParam",
            KitError::Pattern(_) => "InvalidPattern",
            KitError::MissingMatcher(_) => "MissingMatcher",
            KitError::MethodOverrideNotPost { .. } => "MethodOverride",
            KitError::RemovedOption { .. } | KitError::RemovedField { .. } => "Removed",
            KitError::HeaderAlreadySet(_)
            | KitError::DuplicateCookie(_)
            | KitError::InvalidHeader { .. } => "HeaderError",
            KitError::ClientAddressUnavailable { .. } => "ClientAddress",
            KitError::SearchDisabled(_) => "SearchDisabled",
            KitError::Http { .. } => "HttpError",
            KitError::Response(_) => "ResponseError",
            KitError::Fetch(_) => "FetchError",
            KitError::Handler(_) => "Error",
        }
    }

    /// Render the error and its source chain, one cause per line.
    pub fn chain(&self) -> String {
        let mut out = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            out.push_str("\n    caused by: ");
            out.push_str(&cause.to_string());
            source = cause.source();
        }
        out
    }
}
