// src/tasks/registry.rs

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::{ConfigFile, TaskConfig};
use crate::dag::TaskGraph;
use crate::errors::{DevtasksError, Result};

use super::{TaskAction, TaskDef, TaskName};

pub const DEFAULT_TASK: &str = "default";
pub const STYLES_TASK: &str = "styles";
pub const STYLES_WATCH_TASK: &str = "styles:watch";
pub const DB_RESET_TASK: &str = "db:reset";

/// Mapping from task name to its definition.
///
/// Always contains the built-in tasks; user tasks from `[task.<name>]` are
/// added on top. Construction validates the whole graph, so a registry that
/// exists is known to be acyclic.
#[derive(Debug, Clone)]
pub struct TaskRegistry {
    tasks: BTreeMap<TaskName, TaskDef>,
    graph: TaskGraph,
}

impl TaskRegistry {
    /// Registry with built-ins plus the user tasks of a validated config.
    pub fn from_config(cfg: &ConfigFile) -> Result<Self> {
        Self::from_task_configs(cfg.tasks())
    }

    /// Registry with built-ins plus the given user task sections.
    pub fn from_task_configs(user: &BTreeMap<String, TaskConfig>) -> Result<Self> {
        let mut tasks = BTreeMap::new();
        for def in builtin_tasks() {
            insert_unique(&mut tasks, def)?;
        }

        for (name, cfg) in user.iter() {
            if name.trim().is_empty() {
                return Err(DevtasksError::ConfigError(
                    "task names must not be empty".to_string(),
                ));
            }
            let def = TaskDef {
                name: name.clone(),
                description: cfg
                    .description
                    .clone()
                    .unwrap_or_else(|| format!("run `{}`", cfg.cmd)),
                action: TaskAction::Shell(cfg.cmd.clone()),
                after: cfg.after.clone(),
            };
            insert_unique(&mut tasks, def)?;
        }

        Self::from_defs(tasks)
    }

    fn from_defs(tasks: BTreeMap<TaskName, TaskDef>) -> Result<Self> {
        let graph = TaskGraph::new(
            tasks
                .values()
                .map(|def| (def.name.as_str(), def.after.as_slice())),
        );
        graph.validate()?;
        validate_destructive_tasks(&tasks)?;

        debug!(tasks = tasks.len(), "task registry validated");
        Ok(Self { tasks, graph })
    }

    pub fn get(&self, name: &str) -> Option<&TaskDef> {
        self.tasks.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TaskDef> {
        self.tasks.values()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn graph(&self) -> &TaskGraph {
        &self.graph
    }

    /// Resolve `targets` (or `default` if empty) into the ordered list of
    /// task definitions to execute.
    ///
    /// A long-running task has to be the last working task in the chain, since
    /// nothing queued after it would ever start.
    pub fn resolve<S: AsRef<str>>(&self, targets: &[S]) -> Result<Vec<&TaskDef>> {
        let names = if targets.is_empty() {
            self.graph.execution_order(&[DEFAULT_TASK])?
        } else {
            self.graph.execution_order(targets)?
        };

        let defs: Vec<&TaskDef> = names
            .iter()
            .map(|n| {
                self.tasks
                    .get(n)
                    .ok_or_else(|| DevtasksError::TaskNotFound(n.clone()))
            })
            .collect::<Result<_>>()?;

        // Only aliases, which do no work, may follow a watch task.
        if let Some(pos) = defs.iter().position(|d| d.action.is_long_running()) {
            let blocked = defs[pos + 1..]
                .iter()
                .find(|d| d.action != TaskAction::Alias);
            if let Some(next) = blocked {
                return Err(DevtasksError::ConfigError(format!(
                    "task '{}' never finishes; it must be the last task in the chain \
                     (followed by '{}')",
                    defs[pos].name, next.name
                )));
            }
        }

        Ok(defs)
    }
}

fn insert_unique(tasks: &mut BTreeMap<TaskName, TaskDef>, def: TaskDef) -> Result<()> {
    if let Some(existing) = tasks.get(&def.name) {
        let what = if existing.action.is_builtin() {
            "conflicts with built-in task"
        } else {
            "is defined more than once"
        };
        return Err(DevtasksError::ConfigError(format!(
            "task '{}' {}",
            def.name, what
        )));
    }
    tasks.insert(def.name.clone(), def);
    Ok(())
}

/// Destructive tasks can only be run when named explicitly.
fn validate_destructive_tasks(tasks: &BTreeMap<TaskName, TaskDef>) -> Result<()> {
    for def in tasks.values() {
        for dep in def.after.iter() {
            if tasks.get(dep).is_some_and(|d| d.action.is_destructive()) {
                return Err(DevtasksError::ConfigError(format!(
                    "task '{}' lists destructive task '{}' in `after`; \
                     it can only be run explicitly",
                    def.name, dep
                )));
            }
        }
    }
    Ok(())
}

fn builtin_tasks() -> Vec<TaskDef> {
    vec![
        TaskDef {
            name: DEFAULT_TASK.to_string(),
            description: "build styles, then keep them up to date".to_string(),
            action: TaskAction::Alias,
            after: vec![STYLES_WATCH_TASK.to_string()],
        },
        TaskDef {
            name: STYLES_TASK.to_string(),
            description: "compile stylesheets and their source maps".to_string(),
            action: TaskAction::StyleBuild,
            after: Vec::new(),
        },
        TaskDef {
            name: STYLES_WATCH_TASK.to_string(),
            description: "rebuild stylesheets whenever a source changes".to_string(),
            action: TaskAction::StyleWatch,
            after: vec![STYLES_TASK.to_string()],
        },
        TaskDef {
            name: DB_RESET_TASK.to_string(),
            description: "delete migrations and the sqlite database, then migrate and load fixtures"
                .to_string(),
            action: TaskAction::DbReset,
            after: Vec::new(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(entries: &[(&str, &str, &[&str])]) -> BTreeMap<String, TaskConfig> {
        entries
            .iter()
            .map(|(name, cmd, after)| {
                (
                    name.to_string(),
                    TaskConfig {
                        cmd: cmd.to_string(),
                        after: after.iter().map(|s| s.to_string()).collect(),
                        description: None,
                    },
                )
            })
            .collect()
    }

    fn names(defs: &[&TaskDef]) -> Vec<String> {
        defs.iter().map(|d| d.name.clone()).collect()
    }

    #[test]
    fn default_resolves_to_build_then_watch() {
        let registry = TaskRegistry::from_task_configs(&BTreeMap::new()).unwrap();
        let empty: [&str; 0] = [];
        assert_eq!(
            names(&registry.resolve(&empty).unwrap()),
            vec!["styles", "styles:watch", "default"]
        );
    }

    #[test]
    fn db_reset_runs_alone() {
        let registry = TaskRegistry::from_task_configs(&BTreeMap::new()).unwrap();
        assert_eq!(names(&registry.resolve(&["db:reset"]).unwrap()), vec!["db:reset"]);
    }

    #[test]
    fn user_task_cannot_shadow_builtin() {
        let err =
            TaskRegistry::from_task_configs(&user(&[("styles", "make css", &[])])).unwrap_err();
        assert!(matches!(
            err,
            DevtasksError::ConfigError(msg) if msg.contains("conflicts with built-in")
        ));
    }

    #[test]
    fn destructive_task_cannot_be_a_prerequisite() {
        let configs = user(&[("fresh", "echo", &["db:reset"])]);
        let err = TaskRegistry::from_task_configs(&configs).unwrap_err();
        assert!(matches!(err, DevtasksError::ConfigError(msg) if msg.contains("destructive")));
    }

    #[test]
    fn watch_must_be_last() {
        let registry =
            TaskRegistry::from_task_configs(&user(&[("lint", "echo lint", &["styles"])])).unwrap();
        assert!(registry.resolve(&["styles:watch", "lint"]).is_err());
        assert_eq!(
            names(&registry.resolve(&["lint", "styles:watch"]).unwrap()),
            vec!["styles", "lint", "styles:watch"]
        );
    }

    #[test]
    fn only_aliases_may_follow_watch() {
        let registry =
            TaskRegistry::from_task_configs(&user(&[("lint", "echo lint", &["styles"])])).unwrap();
        let err = registry.resolve(&["default", "lint"]).unwrap_err();
        assert!(matches!(err, DevtasksError::ConfigError(msg) if msg.contains("'lint'")));
    }
}
