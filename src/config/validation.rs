//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Request methods are valid, unique method tokens
//! - Value ranges (timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::routing::method::parse_method;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("request_methods must not be empty")]
    NoRequestMethods,

    #[error("invalid request method `{0}`")]
    InvalidMethod(String),

    #[error("duplicate request method `{0}`")]
    DuplicateMethod(String),

    #[error("invalid {field} `{value}`")]
    InvalidAddress { field: &'static str, value: String },

    #[error("timeouts.request_secs must be greater than 0")]
    ZeroTimeout,

    #[error("admin.api_key must be set when the admin API is enabled")]
    MissingApiKey,

    #[error("unknown log level `{0}`")]
    InvalidLogLevel(String),
}

pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.request_methods.is_empty() {
        errors.push(ValidationError::NoRequestMethods);
    }
    let mut seen = HashSet::new();
    for token in &config.request_methods {
        if parse_method(token).is_none() {
            errors.push(ValidationError::InvalidMethod(token.clone()));
        } else if !seen.insert(token.as_str()) {
            errors.push(ValidationError::DuplicateMethod(token.clone()));
        }
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    if config.admin.enabled && config.admin.api_key.trim().is_empty() {
        errors.push(ValidationError::MissingApiKey);
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !["trace", "debug", "info", "warn", "error"].contains(&level.as_str()) {
        errors.push(ValidationError::InvalidLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&AppConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = AppConfig::default();
        config.request_methods = vec!["GET".into(), "GET".into(), "NOT A METHOD".into()];
        config.timeouts.request_secs = 0;
        config.listener.bind_address = "nowhere".into();
        config.observability.log_level = "loud".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::DuplicateMethod("GET".into()),
                ValidationError::InvalidMethod("NOT A METHOD".into()),
                ValidationError::InvalidAddress {
                    field: "listener.bind_address",
                    value: "nowhere".into(),
                },
                ValidationError::ZeroTimeout,
                ValidationError::InvalidLogLevel("loud".into()),
            ]
        );
    }

    #[test]
    fn test_empty_methods() {
        let mut config = AppConfig::default();
        config.request_methods.clear();
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::NoRequestMethods])
        );
    }

    #[test]
    fn test_admin_requires_key() {
        let mut config = AppConfig::default();
        config.admin.enabled = true;
        config.admin.api_key = "  ".into();
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::MissingApiKey])
        );
    }
}
