// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// File name looked up in the project root when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "Devtasks.toml";

/// Load a configuration file and return the raw `RawConfigFile`.
///
/// Only TOML deserialization happens here; see [`load_and_validate`].
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let contents = fs::read_to_string(path.as_ref())?;
    let config: RawConfigFile = toml::from_str(&contents)?;
    Ok(config)
}

/// Load a configuration file from path and validate it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Resolve the config for a project.
///
/// - An explicit path must exist.
/// - Otherwise `<root>/Devtasks.toml` is used if present, and built-in
///   defaults if not.
pub fn load_optional(root: &Path, explicit: Option<&Path>) -> Result<ConfigFile> {
    if let Some(path) = explicit {
        return load_and_validate(path);
    }

    let path = default_config_path(root);
    if path.is_file() {
        debug!(path = %path.display(), "loading project config");
        load_and_validate(&path)
    } else {
        debug!(path = %path.display(), "no project config; using defaults");
        ConfigFile::try_from(RawConfigFile::default())
    }
}

/// `<root>/Devtasks.toml`.
pub fn default_config_path(root: &Path) -> PathBuf {
    root.join(DEFAULT_CONFIG_FILE)
}
