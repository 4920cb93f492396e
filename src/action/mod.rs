//! Actions and the registry that resolves them.
//!
//! # Data Flow
//! ```text
//! "action" attribute (set by routing)
//!     → registry.rs (identifier → Resolvable, or ServiceNotFound)
//!     → handler.rs (Resolvable → RequestHandler, or not a handler)
//!     → RequestHandler::handle → Response
//! ```

pub mod builtin;
pub mod handler;
pub mod registry;

pub use builtin::{JsonAction, RedirectAction, TextAction};
pub use handler::{HandlerFn, RequestHandler, Resolvable};
pub use registry::{
    ActionLocator, ActionLocatorBuilder, ActionRegistry, ServiceNotFound, MAX_ALIAS_DEPTH,
};
