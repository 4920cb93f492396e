//! Response construction for the pipeline.
//!
//! # Responsibilities
//! - Build the generic responses the error boundary falls back to
//! - Keep status-line and body policy out of the stages themselves
//!
//! # Design Decisions
//! - The factory is a trait so hosts can brand their error pages
//! - The default body is the canonical reason phrase, nothing request-specific

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
};

/// Request type flowing through the pipeline.
pub type Request = axum::http::Request<Body>;

/// Response type flowing back out of the pipeline.
pub type Response = axum::response::Response;

/// Creates responses for a given status code.
pub trait ResponseFactory: Send + Sync {
    fn create_response(&self, status: StatusCode) -> Response;
}

/// Plain-text responses carrying the canonical reason phrase.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainResponseFactory;

impl ResponseFactory for PlainResponseFactory {
    fn create_response(&self, status: StatusCode) -> Response {
        let body = status.canonical_reason().unwrap_or_default();
        let mut response = Response::new(Body::from(body));
        *response.status_mut() = status;
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        response
    }
}
