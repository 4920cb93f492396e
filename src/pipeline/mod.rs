//! Request pipeline.
//!
//! # Data Flow
//! ```text
//! Pipeline::handle(request)
//!     → stage 0 (error boundary) ──▶ next.handle
//!         → stage 1 (routing, other intermediates) ──▶ next.handle
//!             → stage n (action dispatch) → Response
//!         ◀── response or PipelineError unwinds
//!     ◀── boundary turns any failure into a 500
//! ```
//!
//! # Design Decisions
//! - Purely synchronous: one call stack per traversal, no suspension points
//! - Failures propagate unchanged until a stage chooses to catch them
//! - Without a boundary stage, failures escape `Pipeline::handle`

pub mod error;
pub mod runner;

pub use error::{
    ActionNotFound, BoxError, InvalidAction, InvalidActionKind, NotFoundReason, PipelineError,
};
pub use runner::{Middleware, Next, Pipeline, PipelineBuilder};
