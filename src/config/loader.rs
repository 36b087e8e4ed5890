//! Configuration loading from file system

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};

use super::defaults::CONFIG_PATH;
use super::types::Config;
use crate::error::{ExpandError, Result};

/// Load configuration from ~/.hash-expand/config.json
///
/// Returns `Config::default()` if the file is missing or invalid.
#[instrument(name = "load_config")]
pub fn load_config() -> Config {
    let config_path = PathBuf::from(shellexpand::tilde(CONFIG_PATH).as_ref());
    load_config_at(&config_path)
}

/// Load configuration from `path`, falling back to defaults on any failure.
pub fn load_config_at(path: &Path) -> Config {
    match load_config_from(path) {
        Ok(config) => {
            info!(path = %path.display(), "Successfully loaded config");
            config
        }
        Err(ExpandError::Io { source, .. }) if source.kind() == ErrorKind::NotFound => {
            info!(path = %path.display(), "Config file not found, using defaults");
            Config::default()
        }
        Err(e) => {
            warn!(
                error = %e,
                path = %path.display(),
                "Failed to load config, using defaults"
            );
            Config::default()
        }
    }
}

/// Read, parse and validate the config at `path`.
///
/// # Errors
/// - `Io`: the file cannot be read (including a missing file)
/// - `Parse`: the file is not valid JSON for `Config`
/// - `Config`: a value is out of range
pub fn load_config_from(path: &Path) -> Result<Config> {
    let raw = fs::read_to_string(path).map_err(|source| ExpandError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let config: Config = serde_json::from_str(&raw).map_err(|source| ExpandError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    config.validate()?;
    Ok(config)
}
