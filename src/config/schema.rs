//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;
use serde::{Deserialize, Serialize};

use crate::resilience::{BreakerSettings, DispatchMode, HalfOpenAdmission, TimeoutAction};
use crate::users::fallback::default_users;
use crate::users::model::User;

/// Root configuration for the login service.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration for inbound requests.
    pub timeouts: TimeoutConfig,

    /// Circuit breaker guarding the user API.
    pub breaker: BreakerConfig,

    /// Remote user API.
    pub upstream: UpstreamConfig,

    /// Accepted username/password pairs.
    pub credentials: Vec<CredentialConfig>,

    /// Users served while the user API is unavailable.
    pub fallback_users: Vec<User>,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    pub admin: AdminConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            timeouts: TimeoutConfig::default(),
            breaker: BreakerConfig::default(),
            upstream: UpstreamConfig::default(),
            credentials: default_credentials(),
            fallback_users: default_users(),
            observability: ObservabilityConfig::default(),
            admin: AdminConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8081").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8081".to_string(),
        }
    }
}

/// Timeout configuration for inbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BreakerConfig {
    /// Breaker name used in logs and metrics.
    pub name: String,

    /// Failures before the breaker opens.
    pub max_failures: u32,

    /// Time the breaker stays open before admitting a trial call, in milliseconds.
    pub reset_timeout_ms: u64,

    /// Deadline for a single upstream call, in milliseconds.
    pub call_timeout_ms: u64,

    /// Trial admission while half-open.
    pub half_open_admission: HalfOpenAdmission,

    /// Whether upstream calls may overlap.
    pub dispatch: DispatchMode,

    /// What to do with a call that missed its deadline.
    pub on_timeout: TimeoutAction,
}

impl BreakerConfig {
    pub fn settings(&self) -> BreakerSettings {
        BreakerSettings::new(
            self.max_failures,
            Duration::from_millis(self.reset_timeout_ms),
            Duration::from_millis(self.call_timeout_ms),
        )
        .with_half_open_admission(self.half_open_admission)
        .with_dispatch(self.dispatch)
        .with_timeout_action(self.on_timeout)
    }
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            name: "users-api".to_string(),
            max_failures: 3,
            reset_timeout_ms: 10_000,
            call_timeout_ms: 5_000,
            half_open_admission: HalfOpenAdmission::default(),
            dispatch: DispatchMode::default(),
            on_timeout: TimeoutAction::default(),
        }
    }
}

/// Remote user API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL; users are fetched from `{base_url}/users/{username}`.
    pub base_url: String,

    /// Static bearer token sent with every request.
    pub bearer_token: Option<String>,

    /// TCP connect timeout in milliseconds.
    pub connect_timeout_ms: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8083".to_string(),
            bearer_token: None,
            connect_timeout_ms: 2_000,
        }
    }
}

/// One accepted username/password pair.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CredentialConfig {
    pub username: String,
    pub password: String,
}

fn default_credentials() -> Vec<CredentialConfig> {
    [("admin", "admin"), ("johnd", "foo"), ("janed", "ddd")]
        .into_iter()
        .map(|(username, password)| CredentialConfig {
            username: username.to_string(),
            password: password.to_string(),
        })
        .collect()
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::default(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable admin routes.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
        }
    }
}
