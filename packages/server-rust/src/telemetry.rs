//! Process-wide `tracing` subscriber setup.
//!
//! Library code only emits spans and events; the embedding binary calls
//! [`init_tracing`] once at startup.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::service::config::TelemetryConfig;

/// Install a global subscriber filtered by `RUST_LOG`, falling back to
/// `config.default_directive`.
///
/// Returns `Ok(false)` when a global subscriber was already installed (for
/// example by a test harness); the existing one is left in place.
///
/// # Errors
///
/// Returns an error if `config.default_directive` is not a valid filter.
pub fn init_tracing(config: &TelemetryConfig) -> anyhow::Result<bool> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.default_directive)?,
    };

    let registry = tracing_subscriber::registry().with(filter);
    let installed = if config.json {
        registry
            .with(fmt::layer().json().with_current_span(true))
            .try_init()
            .is_ok()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init().is_ok()
    };

    if installed {
        tracing::info!(json = config.json, "tracing initialized");
    }
    Ok(installed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_directive_is_rejected() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let config = TelemetryConfig {
            default_directive: "healthins=loud".into(),
            json: false,
        };
        assert!(init_tracing(&config).is_err());
    }

    #[test]
    fn second_install_reports_existing_subscriber() {
        let config = TelemetryConfig::default();
        let _ = init_tracing(&config);
        assert!(!init_tracing(&config).unwrap());
    }
}
