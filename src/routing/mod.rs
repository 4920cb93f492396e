//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (host, path)
//!     → stage.rs (pipeline stage)
//!     → router.rs (route lookup)
//!     → matcher.rs (evaluate match conditions)
//!     → attributes: route = <name | path>, action = <id | unset>
//!
//! Route Compilation (at startup and on reload):
//!     RouteConfig[]
//!     → Compile matchers
//!     → Sort by priority
//!     → Freeze as immutable Router
//! ```
//!
//! # Design Decisions
//! - Routes compiled ahead of time, immutable at runtime
//! - No regex in hot path (prefix / exact matching only)
//! - Deterministic: same input always matches same route
//! - First match wins (ordered by priority)

pub mod matcher;
pub mod router;
pub mod stage;

pub use router::{Route, Router};
pub use stage::RoutingStage;
