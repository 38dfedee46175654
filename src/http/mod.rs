//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, body buffering, client address)
//!     → request.rs (absolute URL, effective method)
//!     → url.rs (path decoding, trailing slash policy)
//!     → [runtime::respond decides the response]
//!     → response.rs (queued headers/cookies, 304, fixed responses)
//!     → Send to client
//! ```

pub mod negotiate;
pub mod request;
pub mod response;
pub mod server;
pub mod url;

pub use request::KitRequest;
pub use server::HttpServer;
pub use url::{TrailingSlash, DATA_SUFFIX};
