// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod reset;
pub mod styles;
pub mod tasks;
pub mod types;
pub mod watch;

use std::path::Path;

use tracing::debug;

use crate::cli::CliArgs;
use crate::config::load_optional;
use crate::errors::Result;
use crate::reset::ResetReport;
use crate::styles::BuildReport;
use crate::tasks::{TaskRunner, STYLES_WATCH_TASK};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (plus CLI overrides)
/// - the task registry and chain resolution
/// - the task runner
pub async fn run(args: CliArgs) -> Result<()> {
    let mut cfg = load_optional(&args.root, args.config.as_deref())?;
    if let Some(compiler) = args.compiler {
        cfg.override_compiler(compiler);
    }

    let runner = TaskRunner::from_config(&args.root, cfg)?;

    if args.list {
        print_task_list(&runner);
        return Ok(());
    }

    if args.dry_run {
        print_dry_run(&runner, &args.tasks)?;
        return Ok(());
    }

    let report = runner.run(args.tasks.as_slice()).await?;
    debug!(completed = ?report.completed, "all tasks finished");
    Ok(())
}

/// Compile every stylesheet under `root` once.
///
/// Per-file compile errors are part of the returned report, not an `Err`.
pub async fn run_style_build(root: impl AsRef<Path>) -> Result<BuildReport> {
    let root = root.as_ref();
    let runner = TaskRunner::from_config(root, load_optional(root, None)?)?;
    runner.style_pipeline()?.run().await
}

/// Build once, then rebuild on every source change until Ctrl-C or a fatal
/// build error.
pub async fn run_watch(root: impl AsRef<Path>) -> Result<()> {
    let root = root.as_ref();
    let runner = TaskRunner::from_config(root, load_optional(root, None)?)?;
    runner.run(&[STYLES_WATCH_TASK]).await.map(|_| ())
}

/// Delete migrations and the sqlite database, then migrate and load fixtures.
pub async fn run_db_reset(root: impl AsRef<Path>) -> Result<ResetReport> {
    let root = root.as_ref();
    let runner = TaskRunner::from_config(root, load_optional(root, None)?)?;
    runner.reset_pipeline()?.run().await
}

fn print_task_list(runner: &TaskRunner) {
    println!("tasks ({}):", runner.registry().len());
    for def in runner.registry().iter() {
        println!("  {:<16} {}", def.name, def.description);
        if !def.after.is_empty() {
            println!("  {:<16}   after: {}", "", def.after.join(", "));
        }
    }
}

/// Simple dry-run output: print the resolved chain and its commands.
fn print_dry_run(runner: &TaskRunner, targets: &[String]) -> Result<()> {
    println!("devtasks dry-run (root: {})", runner.root().display());
    for line in runner.describe(targets)? {
        println!("{line}");
    }
    debug!("dry-run complete (no execution)");
    Ok(())
}
