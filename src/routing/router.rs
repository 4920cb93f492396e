//! Route lookup.
//!
//! # Responsibilities
//! - Store compiled routes
//! - Look up matching route for request
//! - Return matched route or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Higher priority first; equal priorities keep config order
//! - Explicit `None` rather than a silent default route

use crate::config::RouteConfig;
use crate::http::Request;
use crate::routing::matcher::{
    AndMatcher, ExactPathMatcher, HostMatcher, Matcher, PathPrefixMatcher,
};

/// A compiled route.
#[derive(Debug)]
pub struct Route {
    pub name: String,
    pub action: String,
    pub priority: u32,
    matcher: AndMatcher,
}

impl Route {
    pub fn from_config(config: &RouteConfig) -> Self {
        let mut matchers: Vec<Box<dyn Matcher>> = Vec::new();
        if let Some(host) = &config.host {
            matchers.push(Box::new(HostMatcher::new(host.clone())));
        }
        if let Some(prefix) = &config.path_prefix {
            matchers.push(Box::new(PathPrefixMatcher::new(prefix.clone())));
        }
        if let Some(path) = &config.path {
            matchers.push(Box::new(ExactPathMatcher::new(path.clone())));
        }

        Self {
            name: config.name.clone(),
            action: config.action.clone(),
            priority: config.priority,
            matcher: AndMatcher::new(matchers),
        }
    }

    pub fn matches(&self, req: &Request) -> bool {
        self.matcher.matches(req)
    }
}

/// Ordered route table.
#[derive(Debug, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub fn from_config(configs: &[RouteConfig]) -> Self {
        let mut routes: Vec<Route> = configs.iter().map(Route::from_config).collect();
        // sort_by is stable, so equal priorities keep their config order
        routes.sort_by(|a, b| b.priority.cmp(&a.priority));

        for route in &routes {
            if route.matcher.is_wildcard() {
                tracing::warn!(route = %route.name, "Route has no conditions and matches every request");
            }
        }

        Self { routes }
    }

    /// First route matching the request.
    pub fn match_request(&self, req: &Request) -> Option<&Route> {
        self.routes.iter().find(|r| r.matches(req))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
