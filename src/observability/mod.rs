//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Pipeline stages and the server produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID (x-request-id) flows into boundary failure reports
//! - Metrics are cheap; recording without an exporter is a no-op

pub mod logging;
pub mod metrics;
