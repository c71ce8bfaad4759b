// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::types::{CompilerKind, OutputStyle};

/// Raw configuration as read from a TOML file.
///
/// Every section is optional; a project without a `Devtasks.toml` behaves as
/// if this file were empty.
///
/// ```toml
/// [config]
/// queue_length = 1
///
/// [styles]
/// source_dir = "static/styles/scss"
/// output_dir = "static/styles"
/// compiler = "sass"
///
/// [db_reset]
/// python = "python3"
///
/// [task.lint]
/// cmd = "npx stylelint 'static/styles/**/*.css'"
/// after = ["styles"]
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub styles: StylesSection,

    #[serde(default)]
    pub db_reset: DbResetSection,

    /// User-defined shell tasks from `[task.<name>]`.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// Validated configuration.
///
/// Can only be obtained through `TryFrom<RawConfigFile>`, so holders know the
/// task graph is well formed.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    config: ConfigSection,
    styles: StylesSection,
    db_reset: DbResetSection,
    task: BTreeMap<String, TaskConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        styles: StylesSection,
        db_reset: DbResetSection,
        task: BTreeMap<String, TaskConfig>,
    ) -> Self {
        Self {
            config,
            styles,
            db_reset,
            task,
        }
    }

    pub fn config_section(&self) -> &ConfigSection {
        &self.config
    }

    pub fn styles(&self) -> &StylesSection {
        &self.styles
    }

    pub fn db_reset(&self) -> &DbResetSection {
        &self.db_reset
    }

    pub fn tasks(&self) -> &BTreeMap<String, TaskConfig> {
        &self.task
    }

    /// Replace the configured compiler (`--compiler` on the command line).
    pub fn override_compiler(&mut self, compiler: CompilerKind) {
        self.styles.compiler = compiler;
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        let raw = RawConfigFile::default();
        Self::new_unchecked(raw.config, raw.styles, raw.db_reset, raw.task)
    }
}

/// `[config]` section: watch loop behaviour.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Maximum number of rebuilds remembered while a build is in flight.
    #[serde(default = "default_queue_length")]
    pub queue_length: usize,
}

fn default_queue_length() -> usize {
    1
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            queue_length: default_queue_length(),
        }
    }
}

/// `[styles]` section. Paths are relative to the project root.
#[derive(Debug, Clone, Deserialize)]
pub struct StylesSection {
    #[serde(default = "default_source_dir")]
    pub source_dir: String,

    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    #[serde(default)]
    pub compiler: CompilerKind,

    /// Binary used when `compiler = "sass"`.
    #[serde(default = "default_sass_binary")]
    pub sass_binary: String,

    #[serde(default)]
    pub output_style: OutputStyle,
}

fn default_source_dir() -> String {
    "static/styles/scss".to_string()
}

fn default_output_dir() -> String {
    "static/styles".to_string()
}

fn default_sass_binary() -> String {
    "sass".to_string()
}

impl StylesSection {
    /// Glob (relative to root) selecting the stylesheet sources.
    pub fn source_glob(&self) -> String {
        format!("{}/**/*.scss", self.source_dir.trim_end_matches('/'))
    }
}

impl Default for StylesSection {
    fn default() -> Self {
        Self {
            source_dir: default_source_dir(),
            output_dir: default_output_dir(),
            compiler: CompilerKind::default(),
            sass_binary: default_sass_binary(),
            output_style: OutputStyle::default(),
        }
    }
}

/// `[db_reset]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct DbResetSection {
    #[serde(default = "default_python")]
    pub python: String,

    #[serde(default = "default_manage_py")]
    pub manage_py: String,

    /// Fixture names passed to `loaddata`, in order.
    #[serde(default = "default_fixtures")]
    pub fixtures: Vec<String>,

    /// Path patterns never deleted by the migration cleanup step.
    #[serde(default = "default_protected")]
    pub protected: Vec<String>,
}

fn default_python() -> String {
    "python".to_string()
}

fn default_manage_py() -> String {
    "manage.py".to_string()
}

fn default_fixtures() -> Vec<String> {
    vec!["users".to_string(), "subscription_types".to_string()]
}

fn default_protected() -> Vec<String> {
    vec!["*__init__*".to_string(), "*venv*".to_string()]
}

impl Default for DbResetSection {
    fn default() -> Self {
        Self {
            python: default_python(),
            manage_py: default_manage_py(),
            fixtures: default_fixtures(),
            protected: default_protected(),
        }
    }
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    /// Shell command to execute.
    pub cmd: String,

    /// Tasks that must complete before this one runs.
    #[serde(default)]
    pub after: Vec<String>,

    #[serde(default)]
    pub description: Option<String>,
}
