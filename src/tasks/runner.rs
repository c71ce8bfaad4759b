// src/tasks/runner.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{mpsc, Notify};
use tracing::{debug, info};

use crate::config::{ConfigFile, StylesSection};
use crate::engine::{WatchCore, WatchEvent, WatchReport, WatchRuntime};
use crate::errors::Result;
use crate::exec::{CommandRunner, Invocation, PipelineBuildBackend, ProcessRunner};
use crate::fs::{FileSystem, RealFileSystem};
use crate::reset::{ResetPipeline, ResetPlan, ResetReport};
use crate::styles::{compiler_from_config, BuildReport, StylePipeline};
use crate::types::CompilerKind;
use crate::watch::spawn_watcher;

use super::{TaskAction, TaskDef, TaskName, TaskRegistry};

/// Capacity of the watch runtime's event channel.
const WATCH_CHANNEL_CAPACITY: usize = 64;

/// What a finished chain did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Tasks that ran to completion, in order.
    pub completed: Vec<TaskName>,
    /// Report of the last style build in the chain.
    pub styles: Option<BuildReport>,
    pub watch: Option<WatchReport>,
    pub reset: Option<ResetReport>,
}

/// Executes resolved task chains for one project root.
pub struct TaskRunner {
    root: PathBuf,
    config: ConfigFile,
    registry: TaskRegistry,
    fs: Arc<dyn FileSystem>,
    commands: Arc<dyn CommandRunner>,
    shutdown: Arc<Notify>,
}

impl std::fmt::Debug for TaskRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskRunner")
            .field("root", &self.root)
            .field("tasks", &self.registry.len())
            .finish_non_exhaustive()
    }
}

impl TaskRunner {
    pub fn new(
        root: impl Into<PathBuf>,
        config: ConfigFile,
        fs: Arc<dyn FileSystem>,
        commands: Arc<dyn CommandRunner>,
    ) -> Result<Self> {
        let registry = TaskRegistry::from_config(&config)?;
        Ok(Self {
            root: root.into(),
            config,
            registry,
            fs,
            commands,
            shutdown: Arc::new(Notify::new()),
        })
    }

    /// Runner backed by the real filesystem and real processes.
    pub fn from_config(root: impl Into<PathBuf>, config: ConfigFile) -> Result<Self> {
        Self::new(
            root,
            config,
            Arc::new(RealFileSystem),
            Arc::new(ProcessRunner),
        )
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    /// Stops a running watch loop the same way Ctrl-C does. A signal sent
    /// before the loop starts is kept until it does.
    pub fn shutdown_handle(&self) -> Arc<Notify> {
        Arc::clone(&self.shutdown)
    }

    pub fn style_pipeline(&self) -> Result<StylePipeline> {
        let styles = self.config.styles();
        let compiler =
            compiler_from_config(styles, Arc::clone(&self.fs), Arc::clone(&self.commands));
        StylePipeline::new(&self.root, styles, compiler, Arc::clone(&self.fs))
    }

    pub fn reset_pipeline(&self) -> Result<ResetPipeline> {
        let plan = ResetPlan::from_config(self.config.db_reset())?;
        Ok(ResetPipeline::new(
            &self.root,
            plan,
            Arc::clone(&self.fs),
            Arc::clone(&self.commands),
        ))
    }

    /// Resolve `targets` (empty means `default`) and run the chain strictly
    /// in order. The first error aborts the chain.
    pub async fn run<S: AsRef<str>>(&self, targets: &[S]) -> Result<RunReport> {
        let chain = self.registry.resolve(targets)?;
        info!(
            chain = ?chain.iter().map(|d| d.name.as_str()).collect::<Vec<_>>(),
            "running tasks"
        );

        let mut report = RunReport::default();
        for def in chain {
            self.run_task(def, &mut report).await?;
            report.completed.push(def.name.clone());
        }
        Ok(report)
    }

    async fn run_task(&self, def: &TaskDef, report: &mut RunReport) -> Result<()> {
        info!(task = %def.name, "task started");

        match &def.action {
            TaskAction::Alias => {
                debug!(task = %def.name, "alias task; nothing to run");
            }
            TaskAction::StyleBuild => {
                report.styles = Some(self.style_pipeline()?.run().await?);
            }
            TaskAction::StyleWatch => {
                report.watch = Some(self.watch_styles().await?);
            }
            TaskAction::DbReset => {
                report.reset = Some(self.reset_pipeline()?.run().await?);
            }
            TaskAction::Shell(cmd) => {
                let invocation = Invocation::shell(cmd.clone());
                self.commands
                    .run(&invocation, &self.root)
                    .await?
                    .into_result(&def.name, &invocation)?;
            }
        }

        info!(task = %def.name, "task finished");
        Ok(())
    }

    /// Watch the source dir and rebuild on change until Ctrl-C, the
    /// [`shutdown_handle`](Self::shutdown_handle) fires, or a build fails
    /// fatally.
    ///
    /// Does not build up front; chains reach this through `styles:watch`,
    /// whose prerequisite is the initial build.
    pub async fn watch_styles(&self) -> Result<WatchReport> {
        let pipeline = Arc::new(self.style_pipeline()?);
        let (tx, rx) = mpsc::channel::<WatchEvent>(WATCH_CHANNEL_CAPACITY);

        let _watcher = spawn_watcher(&self.root, pipeline.pattern().clone(), tx.clone())?;

        // Ctrl-C or shutdown handle -> graceful shutdown.
        let signals = {
            let tx = tx.clone();
            let shutdown = Arc::clone(&self.shutdown);
            tokio::spawn(async move {
                tokio::select! {
                    res = tokio::signal::ctrl_c() => {
                        if let Err(e) = res {
                            eprintln!("failed to listen for Ctrl+C: {e}");
                            return;
                        }
                    }
                    _ = shutdown.notified() => {}
                }
                let _ = tx.send(WatchEvent::ShutdownRequested).await;
            })
        };

        let backend = PipelineBuildBackend::new(pipeline, tx);
        let core = WatchCore::new(self.config.config_section().queue_length);
        let result = WatchRuntime::new(core, rx, backend).run().await;
        signals.abort();
        result
    }

    /// Human-readable plan for `--dry-run`: one line per task and the
    /// commands it would run.
    pub fn describe<S: AsRef<str>>(&self, targets: &[S]) -> Result<Vec<String>> {
        let chain = self.registry.resolve(targets)?;
        let styles = self.config.styles();

        let mut lines = Vec::new();
        for (idx, def) in chain.iter().enumerate() {
            lines.push(format!("{}. {}", idx + 1, def.name));
            match &def.action {
                TaskAction::Alias => {}
                TaskAction::StyleBuild => lines.push(format!(
                    "     compile {} -> {} ({}, {})",
                    styles.source_glob(),
                    styles.output_dir,
                    compiler_label(styles),
                    styles.output_style
                )),
                TaskAction::StyleWatch => lines.push(format!(
                    "     watch {} (queue_length = {})",
                    styles.source_dir,
                    self.config.config_section().queue_length
                )),
                TaskAction::DbReset => {
                    for step in ResetPlan::from_config(self.config.db_reset())?.steps() {
                        lines.push(format!("     {step}"));
                    }
                }
                TaskAction::Shell(cmd) => lines.push(format!("     sh -c {cmd:?}")),
            }
        }
        Ok(lines)
    }
}

fn compiler_label(styles: &StylesSection) -> String {
    match styles.compiler {
        CompilerKind::Sass => format!("sass binary `{}`", styles.sass_binary),
        CompilerKind::Rsass => "rsass".to_string(),
    }
}
