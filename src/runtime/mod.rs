//! Request dispatch runtime.
//!
//! # Data Flow
//! ```text
//! respond.rs (override, decode, match, redirect)
//!     → event.rs (RequestEvent: params, locals, header queue)
//!     → hooks.rs (user handle hook)
//!     → resolve.rs (branch selection, header/cookie/304 post-processing)
//!     → render.rs collaborators / fetch.rs
//!     → errors.rs (JSON errors, error pages, static last resort)
//! ```
//!
//! # Design Decisions
//! - Collaborators are trait objects held by `SsrOptions`, shared across requests
//! - All per-request state lives in the `RequestEvent` and the dispatch context

pub mod errors;
pub mod event;
pub mod fetch;
pub mod hooks;
pub mod options;
pub mod render;
pub mod resolve;
pub mod respond;
pub mod state;

pub use event::{HeaderInput, QueuedResponse, RequestEvent};
pub use fetch::{Fetch, HttpFetch};
pub use hooks::{DefaultHooks, Hooks};
pub use options::SsrOptions;
pub use render::{Endpoint, ErrorPageParams, PageConfig, RenderParams, Renderer};
pub use resolve::{ChunkTransform, Resolve, ResolveOptions, ResolveOpts};
pub use respond::{respond, MatchedRoute};
pub use state::{DispatchState, Initiator, PrerenderState};
