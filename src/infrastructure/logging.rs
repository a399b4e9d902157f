//! Logging system configuration and initialization
//!
//! Console output plus a daily-rotated log file, driven by the
//! `LoggingConfig` section of the application configuration. `RUST_LOG`
//! overrides the configured level filter.

use anyhow::{Result, anyhow};
use lazy_static::lazy_static;
use std::sync::Mutex;
use tracing::info;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{
    EnvFilter, Registry,
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

pub use super::config::LoggingConfig;

// Keeps the non-blocking file writers alive for the process lifetime.
lazy_static! {
    static ref LOG_GUARDS: Mutex<Vec<tracing_appender::non_blocking::WorkerGuard>> =
        Mutex::new(Vec::new());
}

/// Initialize logging with the given configuration.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(&config.level)
            // HTTP client internals stay quiet below trace level.
            .add_directive("reqwest=info".parse().unwrap())
            .add_directive("hyper=warn".parse().unwrap())
            .add_directive("h2=warn".parse().unwrap())
    });

    let registry = Registry::default().with(env_filter);

    match (config.file_output, config.console_output) {
        (true, true) => {
            let file_writer = build_file_writer(config)?;
            let file_layer = fmt::Layer::new()
                .with_writer(file_writer)
                .with_target(false)
                .with_ansi(false);
            let console_layer = fmt::Layer::new()
                .with_writer(std::io::stdout)
                .with_target(false);

            registry.with(file_layer).with(console_layer).init();
        }
        (true, false) => {
            let file_writer = build_file_writer(config)?;
            let file_layer = fmt::Layer::new()
                .with_writer(file_writer)
                .with_target(false)
                .with_ansi(false);

            registry.with(file_layer).init();
        }
        (false, true) => {
            let console_layer = fmt::Layer::new()
                .with_writer(std::io::stdout)
                .with_target(false);

            registry.with(console_layer).init();
        }
        (false, false) => {
            return Err(anyhow!("No logging output configured"));
        }
    }

    info!("Logging system initialized");
    info!("Log level: {}", config.level);
    if config.file_output {
        info!("Log directory: {:?}", config.directory);
    }

    Ok(())
}

/// Daily-rotated `scraper.log` inside the configured directory.
fn build_file_writer(config: &LoggingConfig) -> Result<non_blocking::NonBlocking> {
    std::fs::create_dir_all(&config.directory)
        .map_err(|e| anyhow!("Failed to create log directory {:?}: {}", config.directory, e))?;

    let file_appender = rolling::daily(&config.directory, "scraper.log");
    let (file_writer, file_guard) = non_blocking(file_appender);
    LOG_GUARDS.lock().unwrap().push(file_guard);

    Ok(file_writer)
}

/// Log version and environment details for diagnostics.
pub fn log_system_info() {
    info!("Application version: {}", env!("CARGO_PKG_VERSION"));
    info!("Operating system: {}", std::env::consts::OS);

    if let Ok(current_dir) = std::env::current_dir() {
        info!("Working directory: {:?}", current_dir);
    }
}
