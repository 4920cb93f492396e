//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (routes and aliases reference existing actions)
//! - Reject alias chains the registry could never resolve (cycles, excess depth)
//! - Validate value ranges (status codes, timeouts, addresses)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use axum::http::{HeaderValue, StatusCode};
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use thiserror::Error;

use crate::action::MAX_ALIAS_DEPTH;
use crate::config::schema::{ActionKind, AppConfig};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid bind address \"{0}\"")]
    BindAddress(String),

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroTimeout,

    #[error("action at index {0} has an empty id")]
    EmptyActionId(usize),

    #[error("action \"{0}\" is defined more than once")]
    DuplicateAction(String),

    #[error("route \"{0}\" is defined more than once")]
    DuplicateRoute(String),

    #[error("route \"{route}\" targets unknown action \"{action}\"")]
    UnknownRouteAction { route: String, action: String },

    #[error("alias \"{alias}\" targets unknown action \"{target}\"")]
    UnknownAliasTarget { alias: String, target: String },

    #[error("alias \"{0}\" targets itself")]
    SelfAlias(String),

    #[error("alias \"{0}\" is part of an alias cycle")]
    AliasCycle(String),

    #[error("alias \"{alias}\" resolves through more than {limit} aliases")]
    AliasChainTooDeep { alias: String, limit: usize },

    #[error("action \"{action}\" has invalid status code {status}")]
    InvalidStatus { action: String, status: u16 },

    #[error("action \"{action}\" has an invalid header value for {field}")]
    InvalidHeaderValue { action: String, field: &'static str },
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    let mut action_ids = HashSet::new();
    for (index, action) in config.actions.iter().enumerate() {
        if action.id.is_empty() {
            errors.push(ValidationError::EmptyActionId(index));
        } else if !action_ids.insert(action.id.as_str()) {
            errors.push(ValidationError::DuplicateAction(action.id.clone()));
        }
    }

    for action in &config.actions {
        match &action.kind {
            ActionKind::Text {
                status,
                content_type,
                ..
            } => {
                check_status(&action.id, *status, &mut errors);
                if let Some(ct) = content_type {
                    if HeaderValue::from_str(ct).is_err() {
                        errors.push(ValidationError::InvalidHeaderValue {
                            action: action.id.clone(),
                            field: "content_type",
                        });
                    }
                }
            }
            ActionKind::Json { status, .. } => check_status(&action.id, *status, &mut errors),
            ActionKind::Redirect { location, status } => {
                check_status(&action.id, *status, &mut errors);
                if HeaderValue::from_str(location).is_err() {
                    errors.push(ValidationError::InvalidHeaderValue {
                        action: action.id.clone(),
                        field: "location",
                    });
                }
            }
            ActionKind::Alias { target } => {
                if *target == action.id {
                    errors.push(ValidationError::SelfAlias(action.id.clone()));
                } else if !action_ids.contains(target.as_str()) {
                    errors.push(ValidationError::UnknownAliasTarget {
                        alias: action.id.clone(),
                        target: target.clone(),
                    });
                }
            }
        }
    }

    check_alias_chains(config, &mut errors);

    let mut route_names = HashSet::new();
    for route in &config.routes {
        if !route_names.insert(route.name.as_str()) {
            errors.push(ValidationError::DuplicateRoute(route.name.clone()));
        }
        if !action_ids.contains(route.action.as_str()) {
            errors.push(ValidationError::UnknownRouteAction {
                route: route.name.clone(),
                action: route.action.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Follow every alias chain the way the registry would.
fn check_alias_chains(config: &AppConfig, errors: &mut Vec<ValidationError>) {
    let aliases: HashMap<&str, &str> = config
        .actions
        .iter()
        .filter_map(|action| match &action.kind {
            ActionKind::Alias { target } => Some((action.id.as_str(), target.as_str())),
            _ => None,
        })
        .collect();

    for action in &config.actions {
        let ActionKind::Alias { target } = &action.kind else {
            continue;
        };
        // Reported as SelfAlias above.
        if *target == action.id {
            continue;
        }

        let start = action.id.as_str();
        let mut visited = HashSet::from([start]);
        let mut current = target.as_str();
        let mut chain_len = 1;
        let mut cyclic = false;

        while let Some(&next) = aliases.get(current) {
            chain_len += 1;
            if next == start {
                errors.push(ValidationError::AliasCycle(action.id.clone()));
                cyclic = true;
                break;
            }
            if !visited.insert(current) {
                // A cycle further down; its members report it.
                cyclic = true;
                break;
            }
            current = next;
        }

        if !cyclic && chain_len > MAX_ALIAS_DEPTH {
            errors.push(ValidationError::AliasChainTooDeep {
                alias: action.id.clone(),
                limit: MAX_ALIAS_DEPTH,
            });
        }
    }
}

fn check_status(action: &str, status: u16, errors: &mut Vec<ValidationError>) {
    if StatusCode::from_u16(status).is_err() {
        errors.push(ValidationError::InvalidStatus {
            action: action.to_string(),
            status,
        });
    }
}
