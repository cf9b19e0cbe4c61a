//! CLI subcommands.

pub mod batch;
pub mod config;
pub mod extract;
mod output;

use std::path::{Path, PathBuf};

use tracing::debug;

use filings_core::FilingsConfig;

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("filings")
        .join("config.json")
}

/// Load the configuration from `--config`, else the default file, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<FilingsConfig> {
    if let Some(path) = config_path {
        return Ok(FilingsConfig::from_file(Path::new(path))?);
    }

    let default_path = default_config_path();
    if default_path.exists() {
        debug!("Using config file {}", default_path.display());
        return Ok(FilingsConfig::from_file(&default_path)?);
    }

    Ok(FilingsConfig::default())
}
