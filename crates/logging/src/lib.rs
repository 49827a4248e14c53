//! Logging for the Unified Orchestrator
//!
//! Installs a global `tracing` subscriber with an environment-driven filter,
//! human readable or JSON console output, and an optional daily rolling file.

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use orchestrator_config::LoggingConfig;

/// Keeps the non-blocking file writer flushing for the life of the process
static FILE_GUARD: OnceCell<WorkerGuard> = OnceCell::new();

/// Set once a subscriber has been installed by this crate
static INSTALLED: OnceCell<()> = OnceCell::new();

/// Builds the filter: `RUST_LOG` wins over the configured level
pub fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.level)
            .with_context(|| format!("invalid log filter '{}'", config.level)),
    }
}

/// Initializes logging
///
/// Returns `false` when a global subscriber was already installed, either by
/// an earlier call or by someone else.
pub fn init(config: &LoggingConfig) -> Result<bool> {
    if INSTALLED.get().is_some() {
        return Ok(false);
    }

    let filter = build_filter(config)?;

    let (file_layer, guard) = match &config.directory {
        Some(directory) => {
            std::fs::create_dir_all(directory)
                .with_context(|| format!("creating log directory {}", directory.display()))?;
            let appender = tracing_appender::rolling::daily(directory, &config.file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer);

    let installed = if config.json {
        registry
            .with(fmt::layer().json().with_target(true))
            .try_init()
            .is_ok()
    } else {
        registry
            .with(fmt::layer().with_target(true))
            .try_init()
            .is_ok()
    };

    if !installed {
        return Ok(false);
    }

    let _ = INSTALLED.set(());
    if let Some(guard) = guard {
        let _ = FILE_GUARD.set(guard);
    }

    tracing::debug!("Logging initialized (level={}, json={})", config.level, config.json);

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_filter_is_reported() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let config = LoggingConfig {
            level: "orchestrator=verbose".to_string(),
            ..LoggingConfig::default()
        };
        assert!(build_filter(&config).is_err());
    }

    #[test]
    fn test_init_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoggingConfig {
            directory: Some(dir.path().to_path_buf()),
            ..LoggingConfig::default()
        };

        let first = init(&config).unwrap();
        let second = init(&config).unwrap();

        assert!(!second);
        if first {
            tracing::info!("written to the rolling file");
        }
    }
}
