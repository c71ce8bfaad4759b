#![allow(dead_code)]

use devtasks::config::{ConfigFile, RawConfigFile, TaskConfig};
use devtasks::errors::Result;
use devtasks::types::{CompilerKind, OutputStyle};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn with_task(mut self, name: &str, task: TaskConfig) -> Self {
        self.config.task.insert(name.to_string(), task);
        self
    }

    pub fn queue_length(mut self, len: usize) -> Self {
        self.config.config.queue_length = len;
        self
    }

    pub fn source_dir(mut self, dir: &str) -> Self {
        self.config.styles.source_dir = dir.to_string();
        self
    }

    pub fn output_dir(mut self, dir: &str) -> Self {
        self.config.styles.output_dir = dir.to_string();
        self
    }

    pub fn compiler(mut self, compiler: CompilerKind) -> Self {
        self.config.styles.compiler = compiler;
        self
    }

    pub fn sass_binary(mut self, binary: &str) -> Self {
        self.config.styles.sass_binary = binary.to_string();
        self
    }

    pub fn output_style(mut self, style: OutputStyle) -> Self {
        self.config.styles.output_style = style;
        self
    }

    pub fn python(mut self, python: &str) -> Self {
        self.config.db_reset.python = python.to_string();
        self
    }

    pub fn fixtures(mut self, fixtures: &[&str]) -> Self {
        self.config.db_reset.fixtures = fixtures.iter().map(|f| f.to_string()).collect();
        self
    }

    /// Validate without panicking, for tests that expect a config error.
    pub fn try_build(self) -> Result<ConfigFile> {
        ConfigFile::try_from(self.config)
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn new(cmd: &str) -> Self {
        Self {
            task: TaskConfig {
                cmd: cmd.to_string(),
                after: vec![],
                description: None,
            },
        }
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.task.after.push(dep.to_string());
        self
    }

    pub fn description(mut self, text: &str) -> Self {
        self.task.description = Some(text.to_string());
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}
