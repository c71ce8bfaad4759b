// src/errors.rs

//! Crate-wide error type.
//!
//! Everything fatal ends up here and bubbles to `main`, which prints it and
//! exits non-zero. Per-file stylesheet failures are *not* errors at this level;
//! see [`crate::styles::CompileError`].

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DevtasksError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Cycle detected in task graph: {0}")]
    DagCycle(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("required tool '{tool}' could not be found on PATH")]
    ToolMissing { tool: String },

    #[error("step '{step}' failed: `{command}` exited with {}{}", exit_code_label(.code), stderr_suffix(.stderr))]
    CommandFailed {
        step: String,
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("filesystem error at {}: {reason:#}", .path.display())]
    FileSystem { path: PathBuf, reason: anyhow::Error },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DevtasksError {
    pub fn file_system(path: impl Into<PathBuf>, reason: impl Into<anyhow::Error>) -> Self {
        DevtasksError::FileSystem {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

fn exit_code_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("exit code {c}"),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim_end();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("\n{trimmed}")
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, DevtasksError>;
