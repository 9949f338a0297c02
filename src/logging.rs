//! Logging setup.
//!
//! TUI mode writes to `<paths.logs>/formflow-{datetime}.log` so output never
//! lands on the wizard screen. CLI subcommands log to stderr.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;

/// Keep alive until exit; dropping it flushes buffered log lines
pub struct LoggingHandle {
    pub _guard: Option<WorkerGuard>,

    /// Set only when logging to a file
    pub log_file_path: Option<PathBuf>,
}

/// Level filter: `RUST_LOG` wins, then `--debug`, then `logging.level`
fn env_filter(config: &Config, debug_override: bool) -> EnvFilter {
    let level = if debug_override {
        "debug".to_string()
    } else {
        config.logging.level.clone()
    };
    EnvFilter::new(std::env::var("RUST_LOG").unwrap_or(level))
}

fn log_file_name(now: chrono::DateTime<chrono::Utc>) -> String {
    format!("formflow-{}.log", now.format("%Y%m%dT%H%M%SZ"))
}

fn writes_to_file(config: &Config, is_tui_mode: bool) -> bool {
    is_tui_mode && config.logging.to_file
}

pub fn init_logging(
    config: &Config,
    is_tui_mode: bool,
    debug_override: bool,
) -> Result<LoggingHandle> {
    let filter = env_filter(config, debug_override);

    if writes_to_file(config, is_tui_mode) {
        let logs_dir = config.logs_path();
        std::fs::create_dir_all(&logs_dir)
            .with_context(|| format!("Failed to create log directory {}", logs_dir.display()))?;

        let log_filename = log_file_name(chrono::Utc::now());
        let log_file_path = logs_dir.join(&log_filename);
        let (writer, guard) = file_writer(&logs_dir, &log_filename);

        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(writer),
            )
            .init();

        Ok(LoggingHandle {
            _guard: Some(guard),
            log_file_path: Some(log_file_path),
        })
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();

        Ok(LoggingHandle {
            _guard: None,
            log_file_path: None,
        })
    }
}

fn file_writer(
    dir: &Path,
    file_name: &str,
) -> (tracing_appender::non_blocking::NonBlocking, WorkerGuard) {
    tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name))
}
