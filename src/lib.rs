//! Server-side request router and dispatcher for file-route web applications.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::server ──▶ runtime::respond ──▶ routing (match + params)
//!                                            │
//!                                            ▼
//!                                  RequestEvent ──▶ Hooks::handle ──▶ Resolve
//!                                                                       │
//!                                            ┌──────────────────────────┤
//!                                            ▼                          ▼
//!                                     Renderer (page,             Fetch (unmatched,
//!                                     data, endpoint)             re-entrant requests)
//!     Client Response                        │
//!     ◀────────────── queued headers/cookies, 304, error recovery
//! ```
//!
//! Cross-cutting: `config`, `observability`, `lifecycle`.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod runtime;
pub mod site;

pub use config::KitConfig;
pub use error::{KitError, KitResult};
pub use http::{HttpServer, KitRequest};
pub use lifecycle::Shutdown;
pub use runtime::{respond, DispatchState, SsrOptions};
