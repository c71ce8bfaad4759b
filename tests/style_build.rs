// tests/style_build.rs

use std::fs;
use std::path::Path;
use std::sync::Arc;

use devtasks::errors::DevtasksError;
use devtasks::exec::ProcessRunner;
use devtasks::fs::RealFileSystem;
use devtasks::tasks::TaskRunner;
use devtasks::types::CompilerKind;
use devtasks_test_utils::builders::ConfigFileBuilder;
use devtasks_test_utils::fake_runner::FakeCommandRunner;
use devtasks_test_utils::init_tracing;
use tempfile::TempDir;

fn project(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (rel, contents) in files {
        let path = dir.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }
    dir
}

fn rsass_runner(root: &Path) -> TaskRunner {
    let cfg = ConfigFileBuilder::new().compiler(CompilerKind::Rsass).build();
    TaskRunner::new(root, cfg, Arc::new(RealFileSystem), Arc::new(ProcessRunner)).unwrap()
}

#[tokio::test]
async fn test_every_source_gets_css_and_map() {
    init_tracing();
    let dir = project(&[
        ("static/styles/scss/main.scss", "$c: red;\nbody { color: $c; }\n"),
        ("static/styles/scss/pages/home.scss", "h1 { margin: 0; }\n"),
        ("static/styles/scss/pages/about.scss", "h2 { margin: 1px; }\n"),
    ]);

    let report = rsass_runner(dir.path())
        .style_pipeline()
        .unwrap()
        .run()
        .await
        .unwrap();

    assert!(report.is_clean());
    assert_eq!(report.compiled.len(), 3);

    let out = dir.path().join("static/styles");
    for name in ["main", "pages/home", "pages/about"] {
        assert!(out.join(format!("{name}.css")).is_file(), "{name}.css missing");
        assert!(out.join(format!("{name}.css.map")).is_file(), "{name}.css.map missing");
    }

    let css = fs::read_to_string(out.join("main.css")).unwrap();
    assert!(css.contains("color: red"));
    assert!(css.trim_end().ends_with("/*# sourceMappingURL=main.css.map */"));

    let map: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("main.css.map")).unwrap()).unwrap();
    assert_eq!(map["version"], 3);
    assert_eq!(map["file"], "main.css");
}

#[tokio::test]
async fn test_broken_file_is_reported_and_others_still_compile() {
    init_tracing();
    let dir = project(&[
        ("static/styles/scss/a.scss", "a { color: blue; }\n"),
        ("static/styles/scss/b.scss", "b { color: red;\n"),
    ]);

    let report = rsass_runner(dir.path())
        .style_pipeline()
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(report.compiled, vec![Path::new("static/styles/scss/a.scss")]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].source, Path::new("static/styles/scss/b.scss"));
    assert!(!report.failed[0].message.is_empty());
    assert_eq!(
        report.failed_sources().collect::<Vec<_>>(),
        vec![Path::new("static/styles/scss/b.scss")]
    );

    let out = dir.path().join("static/styles");
    assert!(out.join("a.css").is_file());
    assert!(out.join("a.css.map").is_file());
    assert!(!out.join("b.css").exists());
}

#[tokio::test]
async fn test_partials_are_imported_not_emitted() {
    init_tracing();
    let dir = project(&[
        ("static/styles/scss/_colors.scss", "$brand: #336699;\n"),
        (
            "static/styles/scss/site.scss",
            "@import \"colors\";\nheader { color: $brand; }\n",
        ),
    ]);

    let report = rsass_runner(dir.path())
        .style_pipeline()
        .unwrap()
        .run()
        .await
        .unwrap();

    assert!(report.is_clean());
    let out = dir.path().join("static/styles");
    assert!(out.join("site.css").is_file());
    assert!(!out.join("_colors.css").exists());
    assert!(fs::read_to_string(out.join("site.css")).unwrap().contains("#336699"));
}

#[tokio::test]
async fn test_existing_outputs_are_overwritten() {
    init_tracing();
    let dir = project(&[
        ("static/styles/scss/a.scss", "a { color: green; }\n"),
        ("static/styles/a.css", "stale"),
    ]);

    rsass_runner(dir.path())
        .style_pipeline()
        .unwrap()
        .run()
        .await
        .unwrap();

    let css = fs::read_to_string(dir.path().join("static/styles/a.css")).unwrap();
    assert!(!css.contains("stale"));
    assert!(css.contains("green"));
}

#[tokio::test]
async fn test_missing_source_dir_is_filesystem_error() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();

    let result = rsass_runner(dir.path()).style_pipeline().unwrap().run().await;
    assert!(matches!(result, Err(DevtasksError::FileSystem { .. })));
}

#[tokio::test]
async fn test_missing_sass_binary_aborts_the_run() {
    init_tracing();
    let dir = project(&[("static/styles/scss/a.scss", "a { color: blue; }\n")]);
    let cfg = ConfigFileBuilder::new()
        .sass_binary("devtasks-test-no-such-sass")
        .build();
    let runner = TaskRunner::new(
        dir.path(),
        cfg,
        Arc::new(RealFileSystem),
        Arc::new(ProcessRunner),
    )
    .unwrap();

    let result = runner.style_pipeline().unwrap().run().await;
    match result {
        Err(DevtasksError::ToolMissing { tool }) => {
            assert_eq!(tool, "devtasks-test-no-such-sass")
        }
        other => panic!("Expected ToolMissing, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_sass_cli_invocation_per_file() {
    init_tracing();
    let dir = project(&[
        ("static/styles/scss/a.scss", ""),
        ("static/styles/scss/nested/b.scss", ""),
    ]);
    let commands = FakeCommandRunner::new().fail_with(
        "sass --style=expanded --source-map static/styles/scss/nested",
        65,
        "Error: expected \"}\".",
    );
    let runner = TaskRunner::new(
        dir.path(),
        ConfigFileBuilder::new().build(),
        Arc::new(RealFileSystem),
        Arc::new(commands.clone()),
    )
    .unwrap();

    let report = runner.style_pipeline().unwrap().run().await.unwrap();

    assert_eq!(
        commands.executed(),
        vec![
            "sass --style=expanded --source-map static/styles/scss/a.scss static/styles/a.css",
            "sass --style=expanded --source-map static/styles/scss/nested/b.scss \
             static/styles/nested/b.css",
        ]
    );
    assert_eq!(report.compiled.len(), 1);
    assert_eq!(report.failed.len(), 1);
    assert!(report.failed[0].message.contains("expected"));
}

#[tokio::test]
async fn test_sass_io_failure_aborts_the_run() {
    init_tracing();
    let dir = project(&[
        ("static/styles/scss/a.scss", ""),
        ("static/styles/scss/b.scss", ""),
    ]);
    let commands = FakeCommandRunner::new().fail_with(
        "sass --style=expanded --source-map static/styles/scss/a.scss",
        66,
        "Error writing to static/styles/a.css: Permission denied.",
    );
    let runner = TaskRunner::new(
        dir.path(),
        ConfigFileBuilder::new().build(),
        Arc::new(RealFileSystem),
        Arc::new(commands.clone()),
    )
    .unwrap();

    let result = runner.style_pipeline().unwrap().run().await;

    match result {
        Err(DevtasksError::FileSystem { path, reason }) => {
            assert!(path.ends_with("static/styles/a.css"), "path: {}", path.display());
            assert!(reason.to_string().contains("Permission denied"));
        }
        other => panic!("Expected FileSystem, got: {:?}", other),
    }
    // The run stops at the first fatal failure.
    assert_eq!(commands.executed().len(), 1);
}
