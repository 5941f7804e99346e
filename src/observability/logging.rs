//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once at startup
//! - Pick the log level from the environment, falling back to config
//!
//! # Design Decisions
//! - `RUST_LOG` wins over `observability.log_level` when set
//! - Library code only emits events; installing a subscriber is the binary's job

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Install the global tracing subscriber.
///
/// Returns false when a subscriber was already installed.
pub fn init(config: &ObservabilityConfig) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "route_groups={level},tower_http={level}",
            level = config.log_level.to_ascii_lowercase()
        ))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}
