// src/reset/mod.rs

//! Local database reset.
//!
//! A fixed sequence of typed steps, run strictly in order. The first step
//! that fails stops the sequence; nothing after it runs.

pub mod selector;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{error, info};

use crate::config::DbResetSection;
use crate::errors::{DevtasksError, Result};
use crate::exec::{CommandRunner, Invocation};
use crate::fs::FileSystem;

pub use selector::FileSelector;

/// What a single step does.
#[derive(Debug, Clone)]
pub enum ResetAction {
    /// Delete every file the selector matches below the working dir.
    DeleteFiles(FileSelector),
    /// Run one external process; non-zero exit fails the step.
    Run(Invocation),
}

#[derive(Debug, Clone)]
pub struct ResetStep {
    pub name: String,
    pub action: ResetAction,
}

impl fmt::Display for ResetStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.action {
            ResetAction::DeleteFiles(sel) => write!(f, "{}: {} -delete", self.name, sel),
            ResetAction::Run(inv) => write!(f, "{}: {}", self.name, inv),
        }
    }
}

/// Ordered steps of a reset.
#[derive(Debug, Clone)]
pub struct ResetPlan {
    steps: Vec<ResetStep>,
}

impl ResetPlan {
    /// The standard five steps:
    ///
    /// 1. delete migration modules
    /// 2. delete sqlite databases
    /// 3. `manage.py makemigrations`
    /// 4. `manage.py migrate`
    /// 5. `manage.py loaddata <fixtures>`
    pub fn from_config(cfg: &DbResetSection) -> Result<Self> {
        let mut loaddata = vec!["loaddata".to_string()];
        loaddata.extend(cfg.fixtures.iter().cloned());

        let steps = vec![
            ResetStep {
                name: "delete-migrations".to_string(),
                action: ResetAction::DeleteFiles(FileSelector::migrations(&cfg.protected)?),
            },
            ResetStep {
                name: "delete-databases".to_string(),
                action: ResetAction::DeleteFiles(FileSelector::sqlite_databases()?),
            },
            ResetStep {
                name: "makemigrations".to_string(),
                action: ResetAction::Run(manage(cfg, ["makemigrations".to_string()])),
            },
            ResetStep {
                name: "migrate".to_string(),
                action: ResetAction::Run(manage(cfg, ["migrate".to_string()])),
            },
            ResetStep {
                name: "loaddata".to_string(),
                action: ResetAction::Run(manage(cfg, loaddata)),
            },
        ];

        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[ResetStep] {
        &self.steps
    }
}

/// `<python> <manage.py> <args...>`
fn manage(cfg: &DbResetSection, args: impl IntoIterator<Item = String>) -> Invocation {
    let mut full = vec![cfg.manage_py.clone()];
    full.extend(args);
    Invocation::program(cfg.python.clone(), full)
}

/// What a completed reset did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResetReport {
    pub deleted: Vec<PathBuf>,
    pub completed: Vec<String>,
}

/// Executes a [`ResetPlan`] in a working directory.
pub struct ResetPipeline {
    root: PathBuf,
    plan: ResetPlan,
    fs: Arc<dyn FileSystem>,
    runner: Arc<dyn CommandRunner>,
}

impl fmt::Debug for ResetPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResetPipeline")
            .field("root", &self.root)
            .field("steps", &self.plan.steps.len())
            .finish_non_exhaustive()
    }
}

impl ResetPipeline {
    pub fn new(
        root: impl Into<PathBuf>,
        plan: ResetPlan,
        fs: Arc<dyn FileSystem>,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self {
            root: root.into(),
            plan,
            fs,
            runner,
        }
    }

    pub fn plan(&self) -> &ResetPlan {
        &self.plan
    }

    pub async fn run(&self) -> Result<ResetReport> {
        let mut report = ResetReport::default();
        let total = self.plan.steps.len();

        for (idx, step) in self.plan.steps.iter().enumerate() {
            info!(step = %step.name, "[{}/{}] {}", idx + 1, total, step);

            let result = match &step.action {
                ResetAction::DeleteFiles(selector) => {
                    self.delete_files(selector, &mut report.deleted)
                }
                ResetAction::Run(invocation) => self
                    .runner
                    .run(invocation, &self.root)
                    .await
                    .and_then(|out| out.into_result(&step.name, invocation))
                    .map(|_| ()),
            };

            if let Err(err) = result {
                error!(step = %step.name, "database reset aborted");
                return Err(err);
            }
            report.completed.push(step.name.clone());
        }

        info!(
            deleted = report.deleted.len(),
            steps = report.completed.len(),
            "database reset complete"
        );
        Ok(report)
    }

    fn delete_files(&self, selector: &FileSelector, deleted: &mut Vec<PathBuf>) -> Result<()> {
        let files = selector
            .select(self.fs.as_ref(), &self.root)
            .map_err(|e| DevtasksError::file_system(&self.root, e))?;

        for path in files {
            self.fs
                .remove_file(&path)
                .map_err(|e| DevtasksError::file_system(&path, e))?;
            info!(path = %display_rel(&self.root, &path), "deleted");
            deleted.push(path);
        }
        Ok(())
    }
}

fn display_rel(root: &Path, path: &Path) -> String {
    crate::watch::path_utils::relative_str(root, path)
        .unwrap_or_else(|| path.display().to_string())
}
