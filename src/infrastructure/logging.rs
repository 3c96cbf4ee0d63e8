//! Logging system configuration and initialization
//!
//! - Console output and a rolling log file (daily or never)
//! - Level from configuration, overridable with `RUST_LOG`
//! - Optional JSON formatting for the file layer
//! - Chatty dependencies (sqlx, reqwest, hyper) quieted unless TRACE is requested

use anyhow::{Context, Result, anyhow};
use once_cell::sync::Lazy;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub use crate::infrastructure::config::LoggingConfig;

const LOG_FILE_NAME: &str = "store-sync.log";

// Keeps the non-blocking writers alive for the process lifetime
static LOG_GUARDS: Lazy<Mutex<Vec<WorkerGuard>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Targets quieted unless the configured level asks for trace output
const QUIET_DIRECTIVES: &[&str] = &[
    "sqlx::query=warn",
    "sqlx::sqlite=warn",
    "reqwest=info",
    "hyper=warn",
    "hyper_util=warn",
    "h2=warn",
    "rustls=warn",
    "tauri=info",
    "wry=warn",
];

/// Build the filter: `RUST_LOG` wins, otherwise the configured level with dependency overrides
pub fn build_env_filter(level: &str) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let mut filter = EnvFilter::try_new(level).with_context(|| format!("Invalid log level '{level}'"))?;
    if !level.to_lowercase().contains("trace") {
        for directive in QUIET_DIRECTIVES {
            filter = filter.add_directive(directive.parse()?);
        }
    }
    Ok(filter)
}

fn file_writer(directory: &Path, rotation: &str) -> Result<non_blocking::NonBlocking> {
    std::fs::create_dir_all(directory)
        .with_context(|| format!("Failed to create log directory {:?}", directory))?;

    let appender = match rotation {
        "never" => rolling::never(directory, LOG_FILE_NAME),
        _ => rolling::daily(directory, LOG_FILE_NAME),
    };
    let (writer, guard) = non_blocking(appender);
    LOG_GUARDS
        .lock()
        .map_err(|_| anyhow!("Log guard registry poisoned"))?
        .push(guard);
    Ok(writer)
}

fn console_layer<S>() -> fmt::Layer<S> {
    fmt::Layer::new().with_target(false)
}

/// Initialize logging with the given configuration, writing files under `directory`
pub fn init_logging_with_config(config: &LoggingConfig, directory: &Path) -> Result<()> {
    let env_filter = build_env_filter(&config.level)?;
    let registry = Registry::default().with(env_filter);

    match (config.file_output, config.json_format) {
        (true, true) => {
            let file_layer = fmt::Layer::new()
                .json()
                .with_writer(file_writer(directory, &config.rotation)?)
                .with_target(true)
                .with_thread_ids(true)
                .with_ansi(false);
            let console_layer = config.console_output.then(console_layer);
            registry.with(file_layer).with(console_layer).try_init()?;
        }
        (true, false) => {
            let file_layer = fmt::Layer::new()
                .with_writer(file_writer(directory, &config.rotation)?)
                .with_target(true)
                .with_ansi(false);
            let console_layer = config.console_output.then(console_layer);
            registry.with(file_layer).with(console_layer).try_init()?;
        }
        (false, _) if config.console_output => {
            registry.with(console_layer()).try_init()?;
        }
        (false, _) => return Err(anyhow!("No logging output configured")),
    }

    info!(
        level = %config.level,
        json = config.json_format,
        console = config.console_output,
        file = config.file_output,
        "Logging system initialized"
    );
    if config.file_output {
        info!("Log directory: {:?}", directory);
    }
    Ok(())
}

/// Initialize console-only logging with default settings
pub fn init_console_logging() -> Result<()> {
    let config = LoggingConfig {
        file_output: false,
        ..LoggingConfig::default()
    };
    init_logging_with_config(&config, Path::new("."))
}
