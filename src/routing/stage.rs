//! Routing stage: attaches `route` and `action` attributes.

use std::sync::Arc;

use crate::http::{Request, RequestAttributesExt, Response, ACTION_ATTRIBUTE, ROUTE_ATTRIBUTE};
use crate::pipeline::{Middleware, Next, PipelineError};
use crate::routing::Router;

/// Resolves the route for a request and always delegates.
///
/// Without a match the request path is recorded as the route and no action
/// is set, leaving the dispatch stage to report it.
pub struct RoutingStage {
    router: Arc<Router>,
}

impl RoutingStage {
    pub fn new(router: Arc<Router>) -> Self {
        Self { router }
    }
}

impl Middleware for RoutingStage {
    fn process(&self, mut request: Request, next: Next<'_>) -> Result<Response, PipelineError> {
        match self.router.match_request(&request) {
            Some(route) => {
                tracing::debug!(route = %route.name, action = %route.action, "Route matched");
                let (name, action) = (route.name.clone(), route.action.clone());
                request.set_attribute(ROUTE_ATTRIBUTE, name);
                request.set_attribute(ACTION_ATTRIBUTE, action);
            }
            None => {
                let path = request.uri().path().to_string();
                tracing::debug!(path = %path, "No route matched");
                request.set_attribute(ROUTE_ATTRIBUTE, path);
            }
        }

        next.handle(request)
    }

    fn name(&self) -> &'static str {
        "routing"
    }
}
