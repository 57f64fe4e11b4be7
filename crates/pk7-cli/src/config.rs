//! Configuration file handling.
//!
//! Looks for `.config/pk7.styx` in the current directory or any parent
//! directory. A missing file means defaults.

pub use pk7_config::Config;

use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = ".config/pk7.styx";

/// Load configuration, searching up from the current directory.
///
/// Returns the defaults and `None` when no config file exists.
pub fn load() -> Result<(Config, Option<PathBuf>), ConfigError> {
    let cwd = std::env::current_dir().map_err(|e| ConfigError::Io(e.to_string()))?;
    load_from(&cwd)
}

/// Load configuration starting from a specific directory.
pub fn load_from(start: &Path) -> Result<(Config, Option<PathBuf>), ConfigError> {
    let Some(config_path) = find_config_file(start) else {
        return Ok((Config::default(), None));
    };

    let content =
        std::fs::read_to_string(&config_path).map_err(|e| ConfigError::Io(e.to_string()))?;
    let config: Config =
        facet_styx::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

    Ok((config, Some(config_path)))
}

fn find_config_file(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILE))
        .find(|path| path.exists())
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {CONFIG_FILE}: {0}")]
    Io(String),

    #[error("failed to parse {CONFIG_FILE}: {0}")]
    Parse(String),
}
