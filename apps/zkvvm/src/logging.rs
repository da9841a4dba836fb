//! Tracing subscriber setup.
//!
//! Two layers are installed:
//!
//! - stderr, filtered at the configured verbosity (`RUST_LOG` takes precedence)
//! - the log file, always at DEBUG
//!
//! User-facing command output does not go through here; commands print to
//! stdout directly.

use std::path::Path;

use tracing::level_filters::LevelFilter;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*};

use crate::errors::{Result, ZkvvmError};

/// Installs the global subscriber.
///
/// If a subscriber is already installed (for example by a library caller),
/// the existing one is kept.
///
/// # Errors
///
/// Returns `Io` if the log file or its directory cannot be created.
pub fn init(verbosity: LevelFilter, log_file: &Path) -> Result<()> {
    let directory = log_file.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(directory).map_err(|e| {
        ZkvvmError::io(
            format!("Failed to create log directory {}", directory.display()),
            e,
        )
    })?;
    let file_name = log_file
        .file_name()
        .map_or_else(|| "zkvvm.log".to_string(), |name| name.to_string_lossy().into_owned());
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(directory)
        .map_err(|e| {
            ZkvvmError::io(
                format!("Failed to open log file {}", log_file.display()),
                std::io::Error::other(e),
            )
        })?;

    let console_filter = EnvFilter::builder()
        .with_default_directive(verbosity.into())
        .from_env_lossy();
    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .with_filter(console_filter);

    let file = fmt::layer()
        .with_writer(appender)
        .with_ansi(false)
        .with_filter(LevelFilter::DEBUG);

    if tracing_subscriber::registry()
        .with(console)
        .with(file)
        .try_init()
        .is_err()
    {
        tracing::debug!("tracing subscriber already installed");
    }
    Ok(())
}
