//! Loading `~/.govdash/config.json`.
//!
//! Every field has a default, so a missing file is not an error. A file that
//! exists but cannot be read or parsed is.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::types::Config;

/// Location of the user config file.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::HomeDirMissing)?;
    Ok(home.join(".govdash").join("config.json"))
}

/// Load the user config, falling back to defaults when there is none.
pub fn load_config() -> Result<Config, ConfigError> {
    let path = config_path()?;
    if !path.exists() {
        log::info!("No config at {}, using defaults", path.display());
        return Ok(Config::default());
    }
    load_config_from(&path)
}

/// Load a config file from an explicit path.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let config: Config = serde_json::from_str(&content)?;
    if config.data_dir.is_none() {
        log::warn!("Config {} has no dataDir; file-backed loading is disabled", path.display());
    }
    Ok(config)
}
