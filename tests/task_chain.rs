// tests/task_chain.rs

use std::sync::Arc;

use devtasks::errors::DevtasksError;
use devtasks::fs::mock::MockFileSystem;
use devtasks::tasks::{TaskRegistry, TaskRunner};
use devtasks_test_utils::builders::{ConfigFileBuilder, TaskConfigBuilder};
use devtasks_test_utils::fake_runner::FakeCommandRunner;
use devtasks_test_utils::init_tracing;

fn names(registry: &TaskRegistry, targets: &[&str]) -> Vec<String> {
    registry
        .resolve(targets)
        .unwrap()
        .into_iter()
        .map(|d| d.name.clone())
        .collect()
}

#[test]
fn test_default_resolves_to_build_then_watch() {
    let registry = TaskRegistry::from_config(&ConfigFileBuilder::new().build()).unwrap();
    let empty: [&str; 0] = [];
    assert_eq!(names(&registry, &empty), vec!["styles", "styles:watch", "default"]);
}

#[test]
fn test_user_tasks_join_the_graph() {
    let cfg = ConfigFileBuilder::new()
        .with_task("lint", TaskConfigBuilder::new("stylelint").after("styles").build())
        .with_task(
            "check",
            TaskConfigBuilder::new("echo ok").after("lint").after("styles").build(),
        )
        .build();
    let registry = TaskRegistry::from_config(&cfg).unwrap();

    assert_eq!(names(&registry, &["check"]), vec!["styles", "lint", "check"]);
    // Each task runs once even when reachable twice.
    assert_eq!(names(&registry, &["lint", "check"]), vec!["styles", "lint", "check"]);
}

#[tokio::test]
async fn test_shell_chain_runs_in_dependency_order() {
    init_tracing();
    let cfg = ConfigFileBuilder::new()
        .with_task("collect", TaskConfigBuilder::new("python manage.py collectstatic").build())
        .with_task(
            "deploy",
            TaskConfigBuilder::new("rsync -a static/ host:/srv").after("collect").build(),
        )
        .build();
    let commands = FakeCommandRunner::new();
    let runner = TaskRunner::new(
        ".",
        cfg,
        Arc::new(MockFileSystem::new()),
        Arc::new(commands.clone()),
    )
    .unwrap();

    let report = runner.run(&["deploy"]).await.unwrap();

    assert_eq!(
        commands.executed(),
        vec!["python manage.py collectstatic", "rsync -a static/ host:/srv"]
    );
    assert_eq!(report.completed, vec!["collect", "deploy"]);
}

#[tokio::test]
async fn test_failing_prerequisite_aborts_the_chain() {
    init_tracing();
    let cfg = ConfigFileBuilder::new()
        .with_task("test", TaskConfigBuilder::new("pytest").build())
        .with_task("ship", TaskConfigBuilder::new("echo ship").after("test").build())
        .build();
    let commands = FakeCommandRunner::new().fail_with("pytest", 2, "1 failed");
    let runner = TaskRunner::new(
        ".",
        cfg,
        Arc::new(MockFileSystem::new()),
        Arc::new(commands.clone()),
    )
    .unwrap();

    let result = runner.run(&["ship"]).await;

    assert!(matches!(
        result,
        Err(DevtasksError::CommandFailed { ref step, code: Some(2), .. }) if step == "test"
    ));
    assert_eq!(commands.executed(), vec!["pytest"]);
}

#[tokio::test]
async fn test_styles_task_runs_the_pipeline() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("./static/styles/scss/a.scss", "a {}");
    fs.add_file("./static/styles/scss/_mixins.scss", "");
    let commands = FakeCommandRunner::new();
    let runner = TaskRunner::new(
        ".",
        ConfigFileBuilder::new().build(),
        Arc::new(fs),
        Arc::new(commands.clone()),
    )
    .unwrap();

    let report = runner.run(&["styles"]).await.unwrap();

    assert_eq!(
        commands.executed(),
        vec!["sass --style=expanded --source-map static/styles/scss/a.scss static/styles/a.css"]
    );
    assert_eq!(report.styles.map(|r| r.compiled.len()), Some(1));
}

#[test]
fn test_dry_run_describes_without_executing() {
    let commands = FakeCommandRunner::new();
    let runner = TaskRunner::new(
        ".",
        ConfigFileBuilder::new().build(),
        Arc::new(MockFileSystem::new()),
        Arc::new(commands.clone()),
    )
    .unwrap();

    let lines = runner.describe(&["db:reset"]).unwrap();

    assert_eq!(lines[0], "1. db:reset");
    assert!(lines.iter().any(|l| l.contains("python manage.py migrate")));
    assert!(lines.iter().any(|l| l.contains("-path '*migrations*'")));
    assert!(commands.executed().is_empty());
}

#[test]
fn test_dry_run_of_no_targets_describes_the_default_chain() {
    let commands = FakeCommandRunner::new();
    let runner = TaskRunner::new(
        ".",
        ConfigFileBuilder::new().build(),
        Arc::new(MockFileSystem::new()),
        Arc::new(commands.clone()),
    )
    .unwrap();

    let lines = runner.describe(&[] as &[&str]).unwrap();
    let tasks: Vec<&str> = lines
        .iter()
        .map(String::as_str)
        .filter(|l| !l.starts_with(' '))
        .collect();

    assert_eq!(tasks, vec!["1. styles", "2. styles:watch", "3. default"]);
    assert!(lines.iter().any(|l| l.contains("watch static/styles/scss")));
    assert!(commands.executed().is_empty());
}
