//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that every route descriptor can ever match a deployment
//! - Validate value ranges (intervals > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: config → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system
//! - Duplicate routes are allowed; lookup picks the first

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::{ProxyConfig, RouteDescriptor};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("route #{index}: `route` must not be empty")]
    EmptyRoute { index: usize },

    #[error("route #{index} ({route}): `job` must not be empty")]
    EmptyJob { index: usize, route: String },

    #[error("route #{index} ({route}): one of `deployment` or `deployment-prefix` is required")]
    NoDeploymentMatch { index: usize, route: String },

    #[error("listener.bind_address `{0}` is not a socket address")]
    BindAddress(String),

    #[error("observability.metrics_address `{0}` is not a socket address")]
    MetricsAddress(String),

    #[error("director.host must be set")]
    MissingDirectorHost,

    #[error("sync.{0} must be greater than zero")]
    ZeroInterval(&'static str),
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, str::is_empty)
}

/// Validate the route descriptor list.
pub fn validate_routes(routes: &[RouteDescriptor]) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for (index, descriptor) in routes.iter().enumerate() {
        if descriptor.route.is_empty() {
            errors.push(ValidationError::EmptyRoute { index });
        }
        if descriptor.job.is_empty() {
            errors.push(ValidationError::EmptyJob {
                index,
                route: descriptor.route.clone(),
            });
        }
        if is_blank(&descriptor.deployment) && is_blank(&descriptor.deployment_prefix) {
            errors.push(ValidationError::NoDeploymentMatch {
                index,
                route: descriptor.route.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate the proxy settings after command line overrides were applied.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    let director = &config.director;
    let has_overrides = director.auth_url.is_some() && director.api_url.is_some();
    if director.host.is_empty() && !has_overrides {
        errors.push(ValidationError::MissingDirectorHost);
    }

    if config.sync.degraded_interval_secs == 0 {
        errors.push(ValidationError::ZeroInterval("degraded_interval_secs"));
    }
    if config.sync.normal_interval_secs == 0 {
        errors.push(ValidationError::ZeroInterval("normal_interval_secs"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
