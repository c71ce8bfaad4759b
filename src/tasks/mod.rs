// src/tasks/mod.rs

//! Named tasks and the runner that executes a resolved chain of them.

pub mod registry;
pub mod runner;

pub use registry::{
    TaskRegistry, DB_RESET_TASK, DEFAULT_TASK, STYLES_TASK, STYLES_WATCH_TASK,
};
pub use runner::{RunReport, TaskRunner};

/// Canonical task name type.
pub type TaskName = String;

/// What a task does when it runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskAction {
    /// Nothing of its own; exists to pull in prerequisites.
    Alias,
    StyleBuild,
    StyleWatch,
    DbReset,
    /// User-defined shell command from `[task.<name>]`.
    Shell(String),
}

impl TaskAction {
    pub fn is_builtin(&self) -> bool {
        !matches!(self, TaskAction::Shell(_))
    }

    /// Only returns on shutdown.
    pub fn is_long_running(&self) -> bool {
        matches!(self, TaskAction::StyleWatch)
    }

    /// Deletes files irreversibly.
    pub fn is_destructive(&self) -> bool {
        matches!(self, TaskAction::DbReset)
    }
}

/// A registered task.
#[derive(Debug, Clone)]
pub struct TaskDef {
    pub name: TaskName,
    pub description: String,
    pub action: TaskAction,
    /// Prerequisites, run first.
    pub after: Vec<TaskName>,
}
