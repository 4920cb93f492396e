//! Stages shipped with the runtime.
//!
//! A correctly assembled stage list starts with [`ErrorBoundary`] and ends with
//! [`ActionDispatch`]; anything in between is application-specific
//! (see [`crate::routing::RoutingStage`]).

pub mod action_dispatch;
pub mod error_boundary;

pub use action_dispatch::ActionDispatch;
pub use error_boundary::{ErrorBoundary, Failure, FailureContext, FailureReporter, TracingReporter};
