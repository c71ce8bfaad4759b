// src/config/validate.rs

use std::path::Path;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{DevtasksError, Result};
use crate::tasks::TaskRegistry;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = DevtasksError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(
            raw.config,
            raw.styles,
            raw.db_reset,
            raw.task,
        ))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_global_config(cfg)?;
    validate_styles(cfg)?;
    validate_db_reset(cfg)?;
    // Name conflicts, unknown `after` entries and cycles.
    TaskRegistry::from_task_configs(&cfg.task)?;
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.queue_length == 0 {
        return Err(DevtasksError::ConfigError(
            "[config].queue_length must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_styles(cfg: &RawConfigFile) -> Result<()> {
    let styles = &cfg.styles;

    for (key, value) in [
        ("source_dir", &styles.source_dir),
        ("output_dir", &styles.output_dir),
        ("sass_binary", &styles.sass_binary),
    ] {
        if value.trim().is_empty() {
            return Err(DevtasksError::ConfigError(format!(
                "[styles].{key} must not be empty"
            )));
        }
    }

    let source = Path::new(styles.source_dir.trim_end_matches('/'));
    let output = Path::new(styles.output_dir.trim_end_matches('/'));
    if source == output {
        return Err(DevtasksError::ConfigError(format!(
            "[styles].source_dir and [styles].output_dir are both '{}'",
            styles.source_dir
        )));
    }

    Ok(())
}

fn validate_db_reset(cfg: &RawConfigFile) -> Result<()> {
    let db = &cfg.db_reset;
    if db.python.trim().is_empty() {
        return Err(DevtasksError::ConfigError(
            "[db_reset].python must not be empty".to_string(),
        ));
    }
    if db.manage_py.trim().is_empty() {
        return Err(DevtasksError::ConfigError(
            "[db_reset].manage_py must not be empty".to_string(),
        ));
    }
    Ok(())
}
