#![forbid(unsafe_code)]

//! Command-line harness for the drift collage engine.
//!
//! - `layout`: measure image files, compute a collage for a viewport and
//!   print it as JSON, optionally recomputing it to check determinism.
//! - `replay`: feed a JSONL host event script through the web bridge and
//!   print one frame output per line.

pub mod cli;
pub mod error;
pub mod layout;
pub mod replay;

use std::path::Path;

use drift_runtime::ViewerConfig;
use tracing_subscriber::EnvFilter;

pub use cli::{Cli, Commands, run, run_from_env};
pub use error::{HarnessError, Result};

/// Environment variable holding the log filter directive.
pub const LOG_ENV: &str = "DRIFT_LOG";

/// Install the stderr log subscriber. Filter from `DRIFT_LOG`, default `warn`.
pub fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}

/// Load a viewer config file, or the defaults when no path is given.
///
/// Files ending in `.json` are read as JSON, everything else as TOML.
pub fn load_config(path: Option<&Path>) -> Result<ViewerConfig> {
    let Some(path) = path else {
        return Ok(ViewerConfig::default());
    };
    if !path.exists() {
        return Err(HarnessError::MissingPath {
            path: path.to_path_buf(),
        });
    }
    let config = if path.extension().is_some_and(|ext| ext == "json") {
        ViewerConfig::from_json_file(path)?
    } else {
        ViewerConfig::from_toml_file(path)?
    };
    tracing::debug!(target: "drift.harness", path = %path.display(), "config loaded");
    Ok(config)
}
