//! Error boundary stage.
//!
//! Sits first in the stage list. Everything that goes wrong further down the
//! chain, an `Err` or a panic, ends here as a 500 response. The original
//! failure is handed to a [`FailureReporter`] and never re-raised.

use axum::{
    body::Body,
    http::{header, HeaderValue, Method, StatusCode},
};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::http::{PlainResponseFactory, Request, Response, ResponseFactory};
use crate::observability::metrics;
use crate::pipeline::{Middleware, Next, PipelineError};

/// A failure caught by the boundary.
#[derive(Debug)]
pub enum Failure<'a> {
    Error(&'a PipelineError),
    Panic(&'a str),
}

impl Failure<'_> {
    pub fn kind(&self) -> &'static str {
        match self {
            Failure::Error(err) => err.kind(),
            Failure::Panic(_) => "panic",
        }
    }
}

/// What the boundary knew about the request before handing it on.
#[derive(Debug, Clone)]
pub struct FailureContext {
    pub method: Method,
    pub path: String,
    pub request_id: Option<String>,
}

impl FailureContext {
    fn from_request(request: &Request) -> Self {
        Self {
            method: request.method().clone(),
            path: request.uri().path().to_string(),
            request_id: request
                .headers()
                .get("x-request-id")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        }
    }
}

/// Receives every failure the boundary swallows.
pub trait FailureReporter: Send + Sync {
    fn report(&self, context: &FailureContext, failure: &Failure<'_>);
}

/// Logs failures through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl FailureReporter for TracingReporter {
    fn report(&self, context: &FailureContext, failure: &Failure<'_>) {
        let request_id = context.request_id.as_deref().unwrap_or("unknown");
        match failure {
            Failure::Error(PipelineError::ActionNotFound(e)) => tracing::error!(
                request_id = %request_id,
                method = %context.method,
                path = %context.path,
                kind = failure.kind(),
                action = ?e.action,
                route = ?e.route,
                available_actions = ?e.available_actions,
                "{}", e
            ),
            Failure::Error(PipelineError::InvalidAction(e)) => tracing::error!(
                request_id = %request_id,
                method = %context.method,
                path = %context.path,
                kind = failure.kind(),
                action = e.action.type_name(),
                reason = %e.reason,
                "{}", e
            ),
            Failure::Error(err) => tracing::error!(
                request_id = %request_id,
                method = %context.method,
                path = %context.path,
                kind = failure.kind(),
                error = %err,
                "Request failed"
            ),
            Failure::Panic(message) => tracing::error!(
                request_id = %request_id,
                method = %context.method,
                path = %context.path,
                kind = failure.kind(),
                panic = %message,
                "Stage panicked"
            ),
        }
    }
}

/// Converts every downstream failure into a server-error response.
pub struct ErrorBoundary {
    factory: Arc<dyn ResponseFactory>,
    reporter: Arc<dyn FailureReporter>,
    expose_details: bool,
}

impl ErrorBoundary {
    pub fn new(factory: impl ResponseFactory + 'static) -> Self {
        Self {
            factory: Arc::new(factory),
            reporter: Arc::new(TracingReporter),
            expose_details: false,
        }
    }

    pub fn with_reporter(mut self, reporter: impl FailureReporter + 'static) -> Self {
        self.reporter = Arc::new(reporter);
        self
    }

    /// Render failure details as JSON instead of the factory's response.
    /// Meant for development only.
    pub fn expose_details(mut self, expose: bool) -> Self {
        self.expose_details = expose;
        self
    }

    fn render(&self, failure: &Failure<'_>) -> Response {
        if !self.expose_details {
            return self.factory.create_response(StatusCode::INTERNAL_SERVER_ERROR);
        }

        let body = failure_details(failure);
        let Ok(bytes) = serde_json::to_vec(&body) else {
            return self.factory.create_response(StatusCode::INTERNAL_SERVER_ERROR);
        };
        let mut response = Response::new(Body::from(bytes));
        *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        response
    }
}

impl Default for ErrorBoundary {
    fn default() -> Self {
        Self::new(PlainResponseFactory)
    }
}

impl Middleware for ErrorBoundary {
    fn process(&self, request: Request, next: Next<'_>) -> Result<Response, PipelineError> {
        let context = FailureContext::from_request(&request);

        let response = match panic::catch_unwind(AssertUnwindSafe(|| next.handle(request))) {
            Ok(Ok(response)) => return Ok(response),
            Ok(Err(err)) => {
                let failure = Failure::Error(&err);
                self.reporter.report(&context, &failure);
                metrics::record_failure(failure.kind());
                self.render(&failure)
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                let failure = Failure::Panic(&message);
                self.reporter.report(&context, &failure);
                metrics::record_failure(failure.kind());
                self.render(&failure)
            }
        };

        Ok(response)
    }

    fn name(&self) -> &'static str {
        "error_boundary"
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

fn failure_details(failure: &Failure<'_>) -> serde_json::Value {
    let mut details = serde_json::json!({
        "error": failure.kind(),
    });

    match failure {
        Failure::Error(err) => {
            details["message"] = err.to_string().into();
            match err {
                PipelineError::ActionNotFound(e) => {
                    details["action"] = e.action.clone().into();
                    details["route"] = e.route.clone().into();
                    details["available_actions"] = e.available_actions.clone().into();
                }
                PipelineError::InvalidAction(e) => {
                    details["action"] = e.action.type_name().into();
                    details["reason"] = e.reason.clone().into();
                }
                _ => {}
            }
        }
        Failure::Panic(message) => {
            details["message"] = (*message).into();
        }
    }

    details
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{ActionNotFound, Pipeline};
    use std::sync::Mutex;

    struct Fails;

    impl Middleware for Fails {
        fn process(&self, _request: Request, _next: Next<'_>) -> Result<Response, PipelineError> {
            Err(ActionNotFound::new(Some("missing".into()), Some("/foo".into()), vec!["home".into()]).into())
        }
    }

    struct Panics;

    impl Middleware for Panics {
        fn process(&self, _request: Request, _next: Next<'_>) -> Result<Response, PipelineError> {
            panic!("stage exploded");
        }
    }

    struct Ok200;

    impl Middleware for Ok200 {
        fn process(&self, _request: Request, _next: Next<'_>) -> Result<Response, PipelineError> {
            Ok(Response::new(Body::from("fine")))
        }
    }

    #[derive(Clone, Default)]
    struct Collect(Arc<Mutex<Vec<&'static str>>>);

    impl FailureReporter for Collect {
        fn report(&self, _context: &FailureContext, failure: &Failure<'_>) {
            self.0.lock().unwrap().push(failure.kind());
        }
    }

    fn request() -> Request {
        axum::http::Request::builder().uri("/foo").body(Body::empty()).unwrap()
    }

    #[test]
    fn test_success_passes_through() {
        let reports = Collect::default();
        let pipeline = Pipeline::builder()
            .with(ErrorBoundary::default().with_reporter(reports.clone()))
            .with(Ok200)
            .build();

        let response = pipeline.handle(request()).unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(reports.0.lock().unwrap().is_empty());
    }

    #[test]
    fn test_error_becomes_500_and_is_reported() {
        let reports = Collect::default();
        let pipeline = Pipeline::builder()
            .with(ErrorBoundary::default().with_reporter(reports.clone()))
            .with(Fails)
            .build();

        let response = pipeline.handle(request()).unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(*reports.0.lock().unwrap(), vec!["action_not_found"]);
    }

    #[test]
    fn test_panic_becomes_500() {
        let reports = Collect::default();
        let pipeline = Pipeline::builder()
            .with(ErrorBoundary::default().with_reporter(reports.clone()))
            .with(Panics)
            .build();

        let response = pipeline.handle(request()).unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(*reports.0.lock().unwrap(), vec!["panic"]);
    }

    #[test]
    fn test_no_response_is_converted_too() {
        let pipeline = Pipeline::builder().with(ErrorBoundary::default()).build();
        let response = pipeline.handle(request()).unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_default_body_leaks_nothing() {
        let pipeline = Pipeline::builder()
            .with(ErrorBoundary::default())
            .with(Fails)
            .build();

        let response = pipeline.handle(request()).unwrap();
        let body = axum::body::to_bytes(response.into_body(), 4096).await.unwrap();
        assert_eq!(&body[..], b"Internal Server Error");
    }

    #[tokio::test]
    async fn test_exposed_details_carry_fields() {
        let pipeline = Pipeline::builder()
            .with(ErrorBoundary::default().expose_details(true))
            .with(Fails)
            .build();

        let response = pipeline.handle(request()).unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::body::to_bytes(response.into_body(), 4096).await.unwrap();
        let details: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(details["error"], "action_not_found");
        assert_eq!(details["action"], "missing");
        assert_eq!(details["route"], "/foo");
        assert_eq!(details["available_actions"][0], "home");
    }
}
