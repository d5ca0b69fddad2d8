//! Logging setup. `log` records from the library are bridged into `tracing`
//! so spans and plain log lines end up in the same output.

use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

use crate::config::LoggingConfig;
use crate::error::ConfigError;

/// Builds the filter from `RUST_LOG`, falling back to the configured level.
pub fn env_filter(config: &LoggingConfig) -> Result<EnvFilter, ConfigError> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|_| ConfigError::InvalidValue {
            field: "logging.level",
            value: config.level.clone(),
        })
}

/// Installs the global subscriber. Safe to call more than once: later calls
/// keep the first subscriber.
pub fn init_logging(config: &LoggingConfig) -> Result<(), ConfigError> {
    let filter = env_filter(config)?;

    let installed = if config.json {
        let subscriber = Registry::default()
            .with(filter)
            .with(fmt::layer().json().with_target(true));
        tracing::subscriber::set_global_default(subscriber).is_ok()
    } else {
        let subscriber = Registry::default()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr));
        tracing::subscriber::set_global_default(subscriber).is_ok()
    };

    if installed {
        // A logger may already be set by an embedding application.
        let _ = tracing_log::LogTracer::init();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_env_filter_from_config_level() {
        std::env::remove_var("RUST_LOG");
        let config = LoggingConfig {
            level: "debug".to_string(),
            json: false,
        };
        assert!(env_filter(&config).is_ok());
    }

    #[test]
    #[serial]
    fn test_invalid_level_is_rejected() {
        std::env::remove_var("RUST_LOG");
        let config = LoggingConfig {
            level: "meetscribe=loud".to_string(),
            json: false,
        };
        let err = env_filter(&config).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "logging.level",
                ..
            }
        ));
    }

    #[test]
    #[serial]
    fn test_init_logging_twice_is_harmless() {
        let config = LoggingConfig::default();
        init_logging(&config).unwrap();
        init_logging(&config).unwrap();
    }
}
