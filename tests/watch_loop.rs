// tests/watch_loop.rs

use std::fs;
use std::path::Path;
use std::sync::Arc;

use devtasks::engine::WatchReport;
use devtasks::errors::Result;
use devtasks::exec::ProcessRunner;
use devtasks::fs::RealFileSystem;
use devtasks::tasks::{RunReport, TaskRunner};
use devtasks::types::CompilerKind;
use devtasks_test_utils::builders::ConfigFileBuilder;
use devtasks_test_utils::{init_tracing, with_timeout};
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};

const SOURCE: &str = "static/styles/scss/a.scss";
const OUTPUT: &str = "static/styles/a.css";

fn project() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join(SOURCE);
    fs::create_dir_all(source.parent().unwrap()).unwrap();
    fs::write(source, "a { color: red; }\n").unwrap();
    dir
}

fn rsass_runner(root: &Path) -> TaskRunner {
    let cfg = ConfigFileBuilder::new().compiler(CompilerKind::Rsass).build();
    TaskRunner::new(root, cfg, Arc::new(RealFileSystem), Arc::new(ProcessRunner)).unwrap()
}

async fn wait_for_output(root: &Path, needle: &str) {
    let path = root.join(OUTPUT);
    with_timeout(async {
        loop {
            if fs::read_to_string(&path).is_ok_and(|css| css.contains(needle)) {
                return;
            }
            sleep(Duration::from_millis(20)).await;
        }
    })
    .await
}

/// Swap in new contents with a single rename, so the watcher sees one event.
fn replace_source(root: &Path, contents: &str) {
    let staged = root.join("a.scss.next");
    fs::write(&staged, contents).unwrap();
    fs::rename(&staged, root.join(SOURCE)).unwrap();
}

/// Drives a chain that ends in `styles:watch` through one edit and a
/// shutdown, returning the chain's report.
async fn edit_once_then_stop(
    root: &Path,
    shutdown: Arc<tokio::sync::Notify>,
    handle: JoinHandle<Result<RunReport>>,
) -> RunReport {
    wait_for_output(root, "color: red").await;
    // Let the watcher register before touching the source.
    sleep(Duration::from_millis(300)).await;

    replace_source(root, "a { color: green; }\n");
    wait_for_output(root, "color: green").await;

    shutdown.notify_one();
    with_timeout(handle).await.unwrap().unwrap()
}

#[tokio::test]
async fn test_styles_watch_rebuilds_once_per_edit() {
    init_tracing();
    let dir = project();
    let runner = rsass_runner(dir.path());
    let shutdown = runner.shutdown_handle();

    let handle = tokio::spawn(async move { runner.run(&["styles:watch"]).await });
    let report = edit_once_then_stop(dir.path(), shutdown, handle).await;

    assert_eq!(report.completed, vec!["styles", "styles:watch"]);
    assert_eq!(report.watch, Some(WatchReport { builds: 1 }));
    assert_eq!(report.styles.map(|r| r.compiled.len()), Some(1));

    let map = fs::read_to_string(dir.path().join("static/styles/a.css.map")).unwrap();
    assert!(map.contains("a.scss"));
}

#[tokio::test]
async fn test_no_targets_runs_the_default_chain() {
    init_tracing();
    let dir = project();
    let runner = rsass_runner(dir.path());
    let shutdown = runner.shutdown_handle();

    let handle = tokio::spawn(async move { runner.run(&[] as &[&str]).await });
    let report = edit_once_then_stop(dir.path(), shutdown, handle).await;

    assert_eq!(report.completed, vec!["styles", "styles:watch", "default"]);
    assert_eq!(report.watch, Some(WatchReport { builds: 1 }));
}

#[tokio::test]
async fn test_shutdown_before_the_watch_starts_is_kept() {
    init_tracing();
    let dir = project();
    let runner = rsass_runner(dir.path());
    runner.shutdown_handle().notify_one();

    let report = with_timeout(runner.run(&["styles:watch"])).await.unwrap();

    assert_eq!(report.completed, vec!["styles", "styles:watch"]);
    assert_eq!(report.watch, Some(WatchReport::default()));
    assert!(dir.path().join(OUTPUT).is_file());
}
