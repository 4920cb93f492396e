//! Failure taxonomy for a pipeline traversal.
//!
//! Two families of failures exist:
//! - request-resolution failures ([`ActionNotFound`], [`InvalidAction`]), caused by
//!   routing input or registry contents;
//! - pipeline-assembly failures ([`PipelineError::NoResponse`]), caused by a stage
//!   list with no terminal stage.
//!
//! Every variant carries structured fields so the error boundary and whatever
//! instruments it can branch on kind without parsing messages.

use std::sync::Arc;
use thiserror::Error;

use crate::action::Resolvable;

/// Boxed error raised by a stage or an action outside the core taxonomy.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can escape a pipeline traversal.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The request named no action, or an action the registry cannot resolve.
    #[error(transparent)]
    ActionNotFound(#[from] ActionNotFound),

    /// The registry resolved an object that cannot serve requests.
    #[error(transparent)]
    InvalidAction(#[from] InvalidAction),

    /// The stage list ran out before any stage produced a response.
    #[error("The last middleware of the stack must return a response")]
    NoResponse,

    /// Any other failure raised by a stage or an action.
    #[error("Handler failed: {0}")]
    Handler(#[source] BoxError),
}

impl PipelineError {
    /// Wrap an arbitrary error raised by a stage or action.
    pub fn handler(err: impl Into<BoxError>) -> Self {
        Self::Handler(err.into())
    }

    /// Stable label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ActionNotFound(_) => "action_not_found",
            Self::InvalidAction(e) => match e.kind {
                InvalidActionKind::Shape => "invalid_action",
                InvalidActionKind::MissingHandler => "invalid_action_type",
            },
            Self::NoResponse => "no_response",
            Self::Handler(_) => "handler",
        }
    }

    /// True for failures caused by how the stage list was assembled.
    pub fn is_assembly_error(&self) -> bool {
        matches!(self, Self::NoResponse)
    }
}

/// Why an action could not be found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundReason {
    /// Routing attached no action identifier at all.
    Unrouted,
    /// Routing named an identifier the registry could not resolve.
    Unresolved,
}

/// No action could be resolved for the request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error(
    "Action \"{}\" not found for route \"{}\"",
    .action.as_deref().unwrap_or("NULL"),
    .route.as_deref().unwrap_or("NULL")
)]
pub struct ActionNotFound {
    /// Identifier the lookup failed on, `None` when routing set none.
    pub action: Option<String>,
    /// Route being served, when routing recorded one.
    pub route: Option<String>,
    /// Every identifier the registry could have resolved.
    pub available_actions: Vec<String>,
}

impl ActionNotFound {
    pub fn new(
        action: Option<String>,
        route: Option<String>,
        available_actions: Vec<String>,
    ) -> Self {
        Self {
            action,
            route,
            available_actions,
        }
    }

    pub fn reason(&self) -> NotFoundReason {
        match self.action {
            Some(_) => NotFoundReason::Unresolved,
            None => NotFoundReason::Unrouted,
        }
    }
}

/// Which validation an action failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidActionKind {
    /// Generic shape failure with a caller-supplied reason.
    Shape,
    /// The object does not implement [`RequestHandler`](crate::action::RequestHandler).
    MissingHandler,
}

/// A resolved action failed validation.
#[derive(Debug, Clone, Error)]
#[error("The action \"{}\" is invalid. {reason}", .action.type_name())]
pub struct InvalidAction {
    /// The object that failed validation.
    pub action: Arc<dyn Resolvable>,
    /// Human-readable reason.
    pub reason: String,
    pub kind: InvalidActionKind,
}

impl InvalidAction {
    pub const MISSING_HANDLER_REASON: &'static str =
        "The action must implement the RequestHandler trait.";

    pub fn new(action: Arc<dyn Resolvable>, reason: impl Into<String>) -> Self {
        Self {
            action,
            reason: reason.into(),
            kind: InvalidActionKind::Shape,
        }
    }

    /// The resolved object lacks the request-handler capability.
    pub fn missing_handler(action: Arc<dyn Resolvable>) -> Self {
        Self {
            action,
            reason: Self::MISSING_HANDLER_REASON.to_string(),
            kind: InvalidActionKind::MissingHandler,
        }
    }

    pub fn is_type_error(&self) -> bool {
        self.kind == InvalidActionKind::MissingHandler
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Inert;

    impl Resolvable for Inert {}

    #[test]
    fn test_not_found_message_uses_null_placeholders() {
        let err = ActionNotFound::new(None, None, vec![]);
        assert_eq!(err.to_string(), "Action \"NULL\" not found for route \"NULL\"");
        assert_eq!(err.reason(), NotFoundReason::Unrouted);

        let err = ActionNotFound::new(Some("home".into()), Some("/".into()), vec![]);
        assert_eq!(err.to_string(), "Action \"home\" not found for route \"/\"");
        assert_eq!(err.reason(), NotFoundReason::Unresolved);
    }

    #[test]
    fn test_missing_handler_has_fixed_reason() {
        let err = InvalidAction::missing_handler(Arc::new(Inert));
        assert!(err.is_type_error());
        assert_eq!(err.reason, InvalidAction::MISSING_HANDLER_REASON);
        assert!(err.to_string().contains("Inert"));
        assert!(err.to_string().ends_with(InvalidAction::MISSING_HANDLER_REASON));
    }

    #[test]
    fn test_kind_labels() {
        let shape: PipelineError = InvalidAction::new(Arc::new(Inert), "bad").into();
        let typed: PipelineError = InvalidAction::missing_handler(Arc::new(Inert)).into();
        assert_eq!(shape.kind(), "invalid_action");
        assert_eq!(typed.kind(), "invalid_action_type");
        assert_eq!(PipelineError::NoResponse.kind(), "no_response");
        assert!(PipelineError::NoResponse.is_assembly_error());
        assert_eq!(PipelineError::handler("boom").kind(), "handler");
    }
}
