//! Request-dispatch core of an HTTP application runtime.
//!
//! A request travels through an ordered list of stages: an error boundary
//! first, an action dispatcher last, anything else in between. See
//! [`pipeline`] for the handoff protocol.

pub mod action;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod middleware;
pub mod observability;
pub mod pipeline;
pub mod routing;

pub use action::{ActionLocator, ActionRegistry, RequestHandler, Resolvable};
pub use config::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use middleware::{ActionDispatch, ErrorBoundary};
pub use pipeline::{Middleware, Next, Pipeline, PipelineError};
