//! Action dispatch stage.
//!
//! Sits last in the stage list: it resolves the request's `action` attribute
//! through the registry and returns whatever that action responds with.
//! `next` is never used. Nothing is cached; every request re-queries the
//! registry.

use std::sync::Arc;

use crate::action::ActionRegistry;
use crate::http::{Request, RequestAttributesExt, Response};
use crate::observability::metrics;
use crate::pipeline::{ActionNotFound, InvalidAction, Middleware, Next, PipelineError};

pub struct ActionDispatch {
    registry: Arc<dyn ActionRegistry>,
}

impl ActionDispatch {
    pub fn new(registry: Arc<dyn ActionRegistry>) -> Self {
        Self { registry }
    }

    fn not_found(&self, action: Option<String>, route: Option<String>) -> PipelineError {
        ActionNotFound::new(action, route, self.registry.identifiers()).into()
    }
}

impl Middleware for ActionDispatch {
    fn process(&self, request: Request, _next: Next<'_>) -> Result<Response, PipelineError> {
        let route = request.route_name().map(str::to_string);

        let Some(action_id) = request.action_id() else {
            tracing::debug!(route = ?route, "Request carries no action");
            metrics::record_dispatch(None, "unrouted");
            return Err(self.not_found(None, route));
        };

        let action = match self.registry.resolve(action_id) {
            Ok(action) => action,
            Err(e) => {
                tracing::debug!(action = %action_id, missing = %e.id, "Action not resolvable");
                metrics::record_dispatch(Some(action_id), "not_found");
                return Err(self.not_found(Some(e.id), route));
            }
        };

        let Some(handler) = action.as_handler() else {
            metrics::record_dispatch(Some(action_id), "invalid");
            return Err(InvalidAction::missing_handler(action.clone()).into());
        };

        tracing::debug!(action = %action_id, handler = action.type_name(), "Dispatching");
        metrics::record_dispatch(Some(action_id), "dispatched");
        handler.handle(request)
    }

    fn name(&self) -> &'static str {
        "action_dispatch"
    }
}
