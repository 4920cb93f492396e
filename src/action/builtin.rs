//! Actions that can be declared in configuration.

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
};

use crate::action::{RequestHandler, Resolvable};
use crate::http::{Request, Response};
use crate::pipeline::PipelineError;

/// Fixed text response.
#[derive(Debug, Clone)]
pub struct TextAction {
    status: StatusCode,
    body: String,
    content_type: HeaderValue,
}

impl TextAction {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            content_type: HeaderValue::from_static("text/plain; charset=utf-8"),
        }
    }

    pub fn with_content_type(mut self, content_type: HeaderValue) -> Self {
        self.content_type = content_type;
        self
    }
}

impl RequestHandler for TextAction {
    fn handle(&self, _request: Request) -> Result<Response, PipelineError> {
        let mut response = Response::new(Body::from(self.body.clone()));
        *response.status_mut() = self.status;
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, self.content_type.clone());
        Ok(response)
    }
}

impl Resolvable for TextAction {
    fn as_handler(&self) -> Option<&dyn RequestHandler> {
        Some(self)
    }
}

/// Fixed JSON response.
#[derive(Debug, Clone)]
pub struct JsonAction {
    status: StatusCode,
    body: serde_json::Value,
}

impl JsonAction {
    pub fn new(status: StatusCode, body: serde_json::Value) -> Self {
        Self { status, body }
    }
}

impl RequestHandler for JsonAction {
    fn handle(&self, _request: Request) -> Result<Response, PipelineError> {
        let bytes = serde_json::to_vec(&self.body).map_err(PipelineError::handler)?;
        let mut response = Response::new(Body::from(bytes));
        *response.status_mut() = self.status;
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        Ok(response)
    }
}

impl Resolvable for JsonAction {
    fn as_handler(&self) -> Option<&dyn RequestHandler> {
        Some(self)
    }
}

/// Redirect to a fixed location.
#[derive(Debug, Clone)]
pub struct RedirectAction {
    status: StatusCode,
    location: HeaderValue,
}

impl RedirectAction {
    pub fn new(status: StatusCode, location: HeaderValue) -> Self {
        Self { status, location }
    }
}

impl RequestHandler for RedirectAction {
    fn handle(&self, _request: Request) -> Result<Response, PipelineError> {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = self.status;
        response
            .headers_mut()
            .insert(header::LOCATION, self.location.clone());
        Ok(response)
    }
}

impl Resolvable for RedirectAction {
    fn as_handler(&self) -> Option<&dyn RequestHandler> {
        Some(self)
    }
}
