//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (intervals > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BalancerConfig → Result<(), Vec<ValidationError>>
//! - Backend URLs are checked at registration, where a bad one is skipped
//!   instead of rejecting the whole config

use std::net::SocketAddr;
use crate::config::schema::BalancerConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    BindAddress(String),
    #[error("observability.metrics_address '{0}' is not a socket address")]
    MetricsAddress(String),
    #[error("health_check.{0} must be greater than zero")]
    Zero(&'static str),
    #[error("health_check.path '{0}' must start with '/'")]
    ProbePath(String),
}

pub fn validate_config(config: &BalancerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    let health = &config.health_check;
    if health.interval_secs == 0 {
        errors.push(ValidationError::Zero("interval_secs"));
    }
    if health.timeout_secs == 0 {
        errors.push(ValidationError::Zero("timeout_secs"));
    }
    if health.unhealthy_threshold == 0 {
        errors.push(ValidationError::Zero("unhealthy_threshold"));
    }
    if !health.path.starts_with('/') {
        errors.push(ValidationError::ProbePath(health.path.clone()));
    }

    let observability = &config.observability;
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(observability.metrics_address.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
