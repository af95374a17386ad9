//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Detect duplicate credentials and fallback users
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::fmt;
use std::net::SocketAddr;
use url::Url;

use crate::config::schema::ServiceConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than zero"));
    }

    let breaker = &config.breaker;
    if breaker.name.trim().is_empty() {
        errors.push(ValidationError::new("breaker.name", "must not be empty"));
    }
    if let Err(e) = breaker.settings().validate() {
        errors.push(ValidationError::new("breaker", e.to_string()));
    }
    if config.timeouts.request_secs > 0
        && breaker.call_timeout_ms >= config.timeouts.request_secs.saturating_mul(1000)
    {
        errors.push(ValidationError::new(
            "breaker.call_timeout_ms",
            "must be shorter than timeouts.request_secs",
        ));
    }

    match Url::parse(&config.upstream.base_url) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(ValidationError::new(
            "upstream.base_url",
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new("upstream.base_url", e.to_string())),
    }

    let mut seen = HashSet::new();
    for (i, cred) in config.credentials.iter().enumerate() {
        if cred.username.is_empty() {
            errors.push(ValidationError::new(format!("credentials[{}].username", i), "must not be empty"));
        } else if !seen.insert(cred.username.as_str()) {
            errors.push(ValidationError::new(
                format!("credentials[{}].username", i),
                format!("duplicate username '{}'", cred.username),
            ));
        }
    }

    let mut seen = HashSet::new();
    for (i, user) in config.fallback_users.iter().enumerate() {
        if user.username.is_empty() {
            errors.push(ValidationError::new(format!("fallback_users[{}].username", i), "must not be empty"));
        } else if !seen.insert(user.username.as_str()) {
            errors.push(ValidationError::new(
                format!("fallback_users[{}].username", i),
                format!("duplicate username '{}'", user.username),
            ));
        }
    }

    let obs = &config.observability;
    if !LOG_LEVELS.contains(&obs.log_level.to_ascii_lowercase().as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("unknown level '{}'", obs.log_level),
        ));
    }
    if obs.metrics_enabled && obs.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", obs.metrics_address),
        ));
    }

    if config.admin.enabled && config.admin.api_key.is_empty() {
        errors.push(ValidationError::new("admin.api_key", "must not be empty when admin is enabled"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
