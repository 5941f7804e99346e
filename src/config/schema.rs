//! Typed configuration of an application.
//!
//! Every section falls back to its `Default` when absent from the file, so a
//! config may be as small as a single key.

use serde::{Deserialize, Serialize};

use crate::routing::method::DEFAULT_METHODS;

/// Root configuration of an application.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Application name, used in logs and the admin API.
    pub app_name: String,

    /// Methods registered by `all`. Custom extension methods are allowed.
    pub request_methods: Vec<String>,

    /// When false, `/users/` matches a route registered as `/users`.
    pub strict_routing: bool,

    pub listener: ListenerConfig,

    pub timeouts: TimeoutConfig,

    pub observability: ObservabilityConfig,

    /// Introspection API, disabled by default.
    pub admin: AdminConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: "route-groups".to_string(),
            request_methods: DEFAULT_METHODS.iter().map(|m| m.to_string()).collect(),
            strict_routing: false,
            listener: ListenerConfig::default(),
            timeouts: TimeoutConfig::default(),
            observability: ObservabilityConfig::default(),
            admin: AdminConfig::default(),
        }
    }
}

/// Where the demo binary accepts connections.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Socket address, `host:port`.
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upper bound on one request, handler chain included.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Logging and metrics.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default filter level; `RUST_LOG` overrides it.
    pub log_level: String,

    /// Serve Prometheus metrics on `metrics_address`.
    pub metrics_enabled: bool,

    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin introspection API configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    pub enabled: bool,

    /// Bearer token required on every admin request. Must be set when
    /// the API is enabled.
    pub api_key: String,

    /// Path prefix the admin routes live under.
    pub bind_path: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: String::new(),
            bind_path: "/admin".to_string(),
        }
    }
}
