//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at startup):
//!     route id ("blog/[slug=word]")
//!     → pattern.rs (regex + param names + matcher types)
//!     → router.rs (Route, frozen into the manifest's ordered table)
//!
//! Incoming Request (decoded path):
//!     → router.rs (scan routes in order)
//!     → matcher.rs (extract params, consult param matchers)
//!     → Return: matched Route + decoded params, or NoMatch
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Deterministic: same input always matches same route
//! - First match wins (declaration order)

use std::collections::HashMap;

pub mod matcher;
pub mod pattern;
pub mod router;

/// Route params by name.
pub type Params = HashMap<String, String>;

pub use matcher::{Matchers, ParamMatcher};
pub use pattern::{parse_route_id, CompiledRoute};
pub use router::{match_route, Manifest, PageNodes, Route, StaticManifest};
