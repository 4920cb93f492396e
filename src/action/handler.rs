//! Action capabilities.
//!
//! A registry hands back [`Resolvable`] objects. Only those that expose a
//! [`RequestHandler`] through [`Resolvable::as_handler`] can be dispatched to.

use std::fmt;

use crate::http::{Request, Response};
use crate::pipeline::PipelineError;

/// Produces the response for a request.
pub trait RequestHandler: Send + Sync {
    fn handle(&self, request: Request) -> Result<Response, PipelineError>;
}

/// Any object an [`ActionRegistry`](super::ActionRegistry) can resolve.
pub trait Resolvable: Send + Sync + fmt::Debug {
    /// The request-handler view of this object, if it has one.
    fn as_handler(&self) -> Option<&dyn RequestHandler> {
        None
    }

    /// Concrete type name, used in diagnostics.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Adapts a closure into an action.
pub struct HandlerFn<F> {
    name: &'static str,
    f: F,
}

impl<F> HandlerFn<F>
where
    F: Fn(Request) -> Result<Response, PipelineError> + Send + Sync,
{
    pub fn new(name: &'static str, f: F) -> Self {
        Self { name, f }
    }
}

impl<F> RequestHandler for HandlerFn<F>
where
    F: Fn(Request) -> Result<Response, PipelineError> + Send + Sync,
{
    fn handle(&self, request: Request) -> Result<Response, PipelineError> {
        (self.f)(request)
    }
}

impl<F> Resolvable for HandlerFn<F>
where
    F: Fn(Request) -> Result<Response, PipelineError> + Send + Sync,
{
    fn as_handler(&self) -> Option<&dyn RequestHandler> {
        Some(self)
    }

    fn type_name(&self) -> &'static str {
        self.name
    }
}

impl<F> fmt::Debug for HandlerFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HandlerFn").field(&self.name).finish()
    }
}
