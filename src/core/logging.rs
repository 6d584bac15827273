//! Logging initialization
//!
//! Sets up the tracing subscriber once at startup. `RUST_LOG` takes
//! precedence over the configured level when set.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging at the given level
///
/// Unrecognized levels fall back to "info" rather than failing startup.
pub fn init_logging(log_level: &str) {
    let level = log_level.trim().to_lowercase();
    let level = match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => level.as_str(),
        "warning" => "warn",
        _ => "info",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
