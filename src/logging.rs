//! Tracing subscriber setup.
//!
//! The TUI owns stdout, so logs go to a file. `RUST_LOG` overrides the
//! default filter.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "shellbridge=info";

/// Default log location under the user data directory.
pub fn default_log_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir().context("Could not find data directory")?;
    Ok(data_dir.join("shellbridge").join("shellbridge.log"))
}

/// Install the global subscriber writing to `path`.
pub fn init_global(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
    }
    let file = File::create(path)
        .with_context(|| format!("Failed to create log file: {}", path.display()))?;

    build_subscriber(file, None)
        .try_init()
        .context("Failed to install tracing subscriber")?;
    Ok(())
}

/// Subscriber writing to `log_file`, filtered by `RUST_LOG` or `filter`.
pub fn build_subscriber(
    log_file: File,
    filter: Option<&str>,
) -> impl tracing::Subscriber + Send + Sync {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter.unwrap_or(DEFAULT_FILTER)));

    let fmt_layer = fmt::layer().with_ansi(false).with_writer(Arc::new(log_file));

    tracing_subscriber::registry().with(fmt_layer).with(env_filter)
}
