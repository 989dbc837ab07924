//! Logging setup for the export CLI.
//!
//! Export bodies go to stdout, so logs go to stderr or, on request, to a
//! file.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use crate::error::{ExportError, Result};

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initializes logging to stderr.
pub fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .init();
}

/// Initializes logging to `path`, creating parent directories. The file
/// is truncated on each run.
pub fn init_file_logging(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            ExportError::configuration(format!(
                "Could not create log directory {}: {e}",
                parent.display()
            ))
        })?;
    }

    let log_file = File::create(path).map_err(|e| {
        ExportError::configuration(format!("Could not create log file {}: {e}", path.display()))
    })?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(log_file)
        .with_ansi(false)
        .init();
    Ok(())
}

/// Default log file location.
///
/// Uses the XDG state directory on Linux (`~/.local/state/db-export/db-export.log`),
/// falling back to the config directory, then the temp directory.
pub fn default_log_path() -> PathBuf {
    if let Some(state_dir) = dirs::state_dir() {
        return state_dir.join("db-export").join("db-export.log");
    }

    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("db-export").join("db-export.log");
    }

    std::env::temp_dir().join("db-export.log")
}
