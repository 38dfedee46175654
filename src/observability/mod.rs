//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatch pipeline produces:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through the trace layer's spans
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
