//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Build registry + router → Assemble pipeline
//!
//! Shutdown (shutdown.rs, signals.rs):
//!     Signal or trigger → Stop accepting → Drain in-flight requests → Exit
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then pipeline, then listener
//! - Reload reuses startup assembly; a failed reload keeps the old pipeline

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use signals::shutdown_signal;
pub use startup::{assemble_pipeline, build_registry};
