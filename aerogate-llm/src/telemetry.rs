//! Tracing subscriber initialization
//!
//! Installs a JSON `tracing-subscriber` filtered by `RUST_LOG`, falling back
//! to caller-supplied directives when the variable is unset.

use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Directives used when neither `RUST_LOG` nor the caller supplies any.
pub const DEFAULT_DIRECTIVES: &str = "aerogate_llm=info,warn";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TelemetryError {
    #[error("invalid filter directives '{directives}': {reason}")]
    InvalidDirectives { directives: String, reason: String },

    #[error("failed to init subscriber: {0}")]
    Init(String),
}

/// Build the filter: `RUST_LOG` if set and valid, else `default_directives`.
pub fn env_filter(default_directives: &str) -> Result<EnvFilter, TelemetryError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => {
            EnvFilter::try_new(default_directives).map_err(|e| TelemetryError::InvalidDirectives {
                directives: default_directives.to_string(),
                reason: e.to_string(),
            })
        }
    }
}

/// Install the global subscriber. Call once at startup.
///
/// Returns an error instead of panicking when a subscriber is already set.
pub fn init_tracing(default_directives: &str) -> Result<(), TelemetryError> {
    let filter = env_filter(default_directives)?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().json())
        .try_init()
        .map_err(|e| TelemetryError::Init(e.to_string()))?;

    tracing::info!(directives = default_directives, "Telemetry initialized");
    Ok(())
}
