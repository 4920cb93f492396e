//! Pipeline executor.
//!
//! # Responsibilities
//! - Hold the ordered stage list
//! - Hand a request to the first stage together with a view of the rest
//! - Fail with `NoResponse` when the list runs out
//!
//! # Design Decisions
//! - The stage list is immutable and shared (`Arc<[_]>`); a traversal is a
//!   borrowed slice that shrinks by one stage per handoff
//! - `Next` is consumed by `handle`, so a stage delegates at most once
//! - No cursor is stored on the pipeline: concurrent and repeated traversals
//!   never interfere with each other

use std::fmt;
use std::sync::Arc;

use crate::action::{RequestHandler, Resolvable};
use crate::http::{Request, Response};
use crate::pipeline::PipelineError;

/// One processing stage of the pipeline.
pub trait Middleware: Send + Sync {
    /// Produce a response, either directly or by delegating to `next`.
    fn process(&self, request: Request, next: Next<'_>) -> Result<Response, PipelineError>;

    /// Name used in logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// The stages remaining after the one currently running.
pub struct Next<'a> {
    stages: &'a [Arc<dyn Middleware>],
}

impl<'a> Next<'a> {
    fn new(stages: &'a [Arc<dyn Middleware>]) -> Self {
        Self { stages }
    }

    /// A view with no stages left; handing it a request fails with `NoResponse`.
    pub fn empty() -> Next<'static> {
        Next { stages: &[] }
    }

    /// Number of stages that would still run.
    pub fn remaining(&self) -> usize {
        self.stages.len()
    }

    /// Run the rest of the chain.
    pub fn handle(self, request: Request) -> Result<Response, PipelineError> {
        let Some((stage, rest)) = self.stages.split_first() else {
            tracing::error!("Stage list exhausted without producing a response");
            return Err(PipelineError::NoResponse);
        };

        tracing::trace!(stage = stage.name(), remaining = rest.len(), "Entering stage");
        stage.process(request, Next::new(rest))
    }
}

impl fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("remaining", &self.stages.len())
            .finish()
    }
}

/// An ordered, immutable list of stages.
///
/// `handle` may be called any number of times, including concurrently: every
/// call is an independent traversal that runs each stage at most once, in
/// construction order.
#[derive(Clone)]
pub struct Pipeline {
    stages: Arc<[Arc<dyn Middleware>]>,
}

impl Pipeline {
    pub fn new(stages: Vec<Arc<dyn Middleware>>) -> Self {
        Self {
            stages: stages.into(),
        }
    }

    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Stage names in execution order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run one traversal of the whole stage list.
    pub fn handle(&self, request: Request) -> Result<Response, PipelineError> {
        Next::new(&self.stages).handle(request)
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish()
    }
}

// A pipeline is itself a handler, so it can be registered as an action.
impl RequestHandler for Pipeline {
    fn handle(&self, request: Request) -> Result<Response, PipelineError> {
        Pipeline::handle(self, request)
    }
}

impl Resolvable for Pipeline {
    fn as_handler(&self) -> Option<&dyn RequestHandler> {
        Some(self)
    }
}

/// Fluent assembly of a [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    stages: Vec<Arc<dyn Middleware>>,
}

impl PipelineBuilder {
    /// Append a stage.
    pub fn with(mut self, stage: impl Middleware + 'static) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }

    /// Append a stage that is shared with other pipelines.
    pub fn with_arc(mut self, stage: Arc<dyn Middleware>) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn build(self) -> Pipeline {
        Pipeline::new(self.stages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::StatusCode;
    use std::sync::Mutex;

    /// Records its label, then delegates.
    struct Recorder {
        label: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Middleware for Recorder {
        fn process(&self, request: Request, next: Next<'_>) -> Result<Response, PipelineError> {
            self.log.lock().unwrap().push(self.label);
            next.handle(request)
        }
    }

    /// Answers without delegating.
    struct Terminal(StatusCode);

    impl Middleware for Terminal {
        fn process(&self, _request: Request, _next: Next<'_>) -> Result<Response, PipelineError> {
            let mut response = Response::new(Body::empty());
            *response.status_mut() = self.0;
            Ok(response)
        }
    }

    /// Reports how many stages follow it.
    struct Remaining(Arc<Mutex<Vec<usize>>>);

    impl Middleware for Remaining {
        fn process(&self, request: Request, next: Next<'_>) -> Result<Response, PipelineError> {
            self.0.lock().unwrap().push(next.remaining());
            next.handle(request)
        }
    }

    fn request() -> Request {
        axum::http::Request::builder().uri("/").body(Body::empty()).unwrap()
    }

    #[test]
    fn test_empty_pipeline_fails_with_no_response() {
        let pipeline = Pipeline::new(vec![]);
        let err = pipeline.handle(request()).unwrap_err();
        assert!(matches!(err, PipelineError::NoResponse));
    }

    #[test]
    fn test_stages_run_in_order_once() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Pipeline::builder()
            .with(Recorder { label: "a", log: log.clone() })
            .with(Recorder { label: "b", log: log.clone() })
            .with(Recorder { label: "c", log: log.clone() })
            .with(Terminal(StatusCode::OK))
            .build();

        let response = pipeline.handle(request()).unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_delegating_past_the_end_fails() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Pipeline::builder()
            .with(Recorder { label: "only", log: log.clone() })
            .build();

        let err = pipeline.handle(request()).unwrap_err();
        assert!(matches!(err, PipelineError::NoResponse));
        assert_eq!(*log.lock().unwrap(), vec!["only"]);
    }

    #[test]
    fn test_next_sees_only_later_stages() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Pipeline::builder()
            .with(Remaining(seen.clone()))
            .with(Remaining(seen.clone()))
            .with(Terminal(StatusCode::NO_CONTENT))
            .build();

        pipeline.handle(request()).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![2, 1]);
    }

    #[test]
    fn test_short_circuit_skips_later_stages() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Pipeline::builder()
            .with(Terminal(StatusCode::FORBIDDEN))
            .with(Recorder { label: "never", log: log.clone() })
            .build();

        let response = pipeline.handle(request()).unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_reinvocation_is_a_fresh_traversal() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Pipeline::builder()
            .with(Recorder { label: "a", log: log.clone() })
            .with(Terminal(StatusCode::OK))
            .build();

        assert_eq!(pipeline.handle(request()).unwrap().status(), StatusCode::OK);
        assert_eq!(pipeline.handle(request()).unwrap().status(), StatusCode::OK);
        assert_eq!(*log.lock().unwrap(), vec!["a", "a"]);
    }

    #[test]
    fn test_empty_next_fails() {
        let err = Next::empty().handle(request()).unwrap_err();
        assert!(matches!(err, PipelineError::NoResponse));
    }
}
