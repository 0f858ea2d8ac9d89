//! Logger module
//!
//! Provides logging utilities for the catalog server including:
//! - Subscriber setup (`tracing-subscriber`, stdout or file)
//! - Server lifecycle logging
//! - Access logging with multiple formats on the `access` target
//! - Error and warning logging

mod format;

pub use format::AccessLogEntry;

use std::fs::{File, OpenOptions};
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("Failed to open log file '{}': {source}", path.display())]
    Open { path: PathBuf, source: io::Error },
    #[error("Invalid log level '{level}': {source}")]
    Filter {
        level: String,
        source: tracing_subscriber::filter::ParseError,
    },
    #[error("Failed to install log subscriber: {0}")]
    Install(String),
}

/// Initialize the global subscriber
///
/// `RUST_LOG` takes precedence over `logging.level`. Should be called once at
/// application startup.
pub fn init(config: &Config) -> Result<(), LoggerError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.logging.level).map_err(|source| {
            LoggerError::Filter {
                level: config.logging.level.clone(),
                source,
            }
        })?,
    };

    let (writer, ansi) = match &config.logging.log_file {
        Some(path) => (BoxMakeWriter::new(Mutex::new(open_log_file(path)?)), false),
        None => (BoxMakeWriter::new(io::stdout), true),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(true)
        .try_init()
        .map_err(|e| LoggerError::Install(e.to_string()))
}

/// Open or create a log file for appending
fn open_log_file(path: &Path) -> Result<File, LoggerError> {
    let open = || {
        // Create parent directories if they don't exist
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        OpenOptions::new().create(true).append(true).open(path)
    };

    open().map_err(|source| LoggerError::Open {
        path: path.to_path_buf(),
        source,
    })
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    tracing::info!("Catalog server started, listening on http://{addr}");
    tracing::info!(
        level = %config.logging.level,
        access_log = config.logging.access_log,
        max_body_size = config.http.max_body_size,
        "Logging and limits"
    );
    tracing::info!(
        templates = %config.resources.template_dir.display(),
        public = %config.resources.public_dir.display(),
        "Serving resources"
    );
    if let Some(path) = &config.logging.log_file {
        tracing::info!("Log file: {}", path.display());
    }
}

pub fn log_shutdown() {
    tracing::info!("Shutdown signal received, no longer accepting connections");
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    tracing::error!("Failed to serve connection: {err:?}");
}

pub fn log_info(message: &str) {
    tracing::info!("{message}");
}

pub fn log_error(message: &str) {
    tracing::error!("{message}");
}

pub fn log_warning(message: &str) {
    tracing::warn!("{message}");
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    tracing::info!(target: "access", "{}", entry.format(format));
}
