pub mod types;

use crate::error::{ConfigError, Result};
use log::debug;
use std::fs;
use std::path::Path;

pub use types::{Config, RulesConfig};

/// Load configuration from file or use defaults
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };

    let content = fs::read_to_string(path)
        .map_err(|e| ConfigError::InvalidFile(format!("{}: {}", path.display(), e)))?;
    let config: Config = toml::from_str(&content)
        .map_err(|e| ConfigError::ParsingFailed(format!("{}: {}", path.display(), e)))?;

    debug!("Loaded configuration from {}: {:?}", path.display(), config);
    Ok(config)
}
