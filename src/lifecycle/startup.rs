//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the action registry from configuration
//! - Compile routes
//! - Assemble the stage list: boundary → routing → dispatch
//!
//! # Design Decisions
//! - Fail fast: configuration is validated before anything is built
//! - The same assembly runs at startup and on every reload

use axum::http::{HeaderValue, StatusCode};
use std::sync::Arc;

use crate::action::{ActionLocator, JsonAction, RedirectAction, TextAction};
use crate::config::{validate_config, ActionConfig, ActionKind, AppConfig, ConfigError};
use crate::middleware::{ActionDispatch, ErrorBoundary};
use crate::pipeline::Pipeline;
use crate::routing::{Router, RoutingStage};

/// Build the registry for the configured actions.
///
/// Expects validated configuration; a status or header value that slipped
/// through falls back to a safe default rather than failing.
pub fn build_registry(actions: &[ActionConfig]) -> ActionLocator {
    let mut builder = ActionLocator::builder();

    for action in actions {
        let id = action.id.clone();
        builder = match &action.kind {
            ActionKind::Text {
                status,
                body,
                content_type,
            } => {
                let mut text = TextAction::new(status_or(*status, StatusCode::OK), body.clone());
                if let Some(ct) = content_type.as_deref().and_then(|ct| HeaderValue::from_str(ct).ok()) {
                    text = text.with_content_type(ct);
                }
                builder.instance(id, text)
            }
            ActionKind::Json { status, body } => builder.instance(
                id,
                JsonAction::new(status_or(*status, StatusCode::OK), body.clone()),
            ),
            ActionKind::Redirect { location, status } => {
                let location = HeaderValue::from_str(location)
                    .unwrap_or_else(|_| HeaderValue::from_static("/"));
                builder.instance(
                    id,
                    RedirectAction::new(status_or(*status, StatusCode::FOUND), location),
                )
            }
            ActionKind::Alias { target } => builder.alias(id, target.clone()),
        };
    }

    builder.build()
}

fn status_or(code: u16, fallback: StatusCode) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(fallback)
}

/// Validate `config` and assemble the request pipeline it describes.
pub fn assemble_pipeline(config: &AppConfig) -> Result<Pipeline, ConfigError> {
    validate_config(config).map_err(ConfigError::Validation)?;

    let registry = Arc::new(build_registry(&config.actions));
    let router = Arc::new(Router::from_config(&config.routes));

    tracing::info!(
        actions = registry.len(),
        routes = router.len(),
        debug = config.debug,
        "Assembling pipeline"
    );

    Ok(Pipeline::builder()
        .with(ErrorBoundary::default().expose_details(config.debug))
        .with(RoutingStage::new(router))
        .with(ActionDispatch::new(registry))
        .build())
}
