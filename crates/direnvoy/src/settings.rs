// ABOUTME: Loads the ImportConfig for the binary from an optional TOML file
// ABOUTME: The library itself never reads files; all configuration enters here

use anyhow::{Context, Result};
use direnvoy_env::ImportConfig;
use std::fs;
use std::path::{Path, PathBuf};

/// Load configuration from `path`, or from the default location when none is
/// given. A missing file is not an error; defaults apply.
pub fn load_config(path: Option<&Path>) -> Result<ImportConfig> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) => path,
            None => return Ok(ImportConfig::default()),
        },
    };

    if !path.exists() {
        return Ok(ImportConfig::default());
    }

    let text = fs::read_to_string(&path)
        .context(format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&text).context(format!("Failed to parse config file: {}", path.display()))
}

/// `~/.config/direnvoy/config.toml`
fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("direnvoy").join("config.toml"))
}
