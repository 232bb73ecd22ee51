use crate::config::AppConfig;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initializes the global tracing subscriber.
///
/// The filter honors `RUST_LOG` when set and falls back to the configured
/// `log_level`. JSON output is selected by `log_json` for deployments that
/// ship logs to a structured collector.
pub fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));

    if config.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_current_span(true))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .init();
    }

    info!(
        environment = %config.environment,
        log_json = config.log_json,
        "Tracing initialized"
    );
}

/// Best-effort initializer for tests and examples; ignores the error when a
/// subscriber is already installed.
pub fn try_init_for_tests() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::new("info"))
        .with(fmt::layer().with_test_writer())
        .try_init();
}
