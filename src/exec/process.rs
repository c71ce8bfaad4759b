// src/exec/process.rs

//! Typed external process invocations.

use std::fmt;
use std::future::Future;
use std::io::{ErrorKind, Write};
use std::path::Path;
use std::pin::Pin;
use std::process::Stdio;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::errors::{DevtasksError, Result};

/// One external command, either a program with arguments or a shell line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Program { program: String, args: Vec<String> },
    Shell(String),
}

impl Invocation {
    pub fn program<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Invocation::Program {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn shell(cmd: impl Into<String>) -> Self {
        Invocation::Shell(cmd.into())
    }

    /// The binary that has to exist on PATH for this invocation to start.
    pub fn tool(&self) -> &str {
        match self {
            Invocation::Program { program, .. } => program,
            Invocation::Shell(_) if cfg!(windows) => "cmd",
            Invocation::Shell(_) => "sh",
        }
    }

    fn to_command(&self, cwd: &Path) -> Command {
        let mut cmd = match self {
            Invocation::Program { program, args } => {
                let mut c = Command::new(program);
                c.args(args);
                c
            }
            Invocation::Shell(line) if cfg!(windows) => {
                let mut c = Command::new("cmd");
                c.arg("/C").arg(line);
                c
            }
            Invocation::Shell(line) => {
                let mut c = Command::new("sh");
                c.arg("-c").arg(line);
                c
            }
        };
        cmd.current_dir(cwd);
        cmd
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Invocation::Program { program, args } => {
                f.write_str(program)?;
                for arg in args {
                    write!(f, " {arg}")?;
                }
                Ok(())
            }
            Invocation::Shell(line) => f.write_str(line),
        }
    }
}

/// What a finished process left behind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Turn a non-zero exit into [`DevtasksError::CommandFailed`].
    pub fn into_result(self, step: &str, invocation: &Invocation) -> Result<CommandOutput> {
        if self.success {
            Ok(self)
        } else {
            Err(DevtasksError::CommandFailed {
                step: step.to_string(),
                command: invocation.to_string(),
                code: self.code,
                stderr: self.stderr,
            })
        }
    }
}

/// Runs invocations to completion.
///
/// Production code uses [`ProcessRunner`]; tests substitute a runner that
/// records invocations and returns canned outputs.
pub trait CommandRunner: Send + Sync {
    fn run<'a>(
        &'a self,
        invocation: &'a Invocation,
        cwd: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<CommandOutput>> + Send + 'a>>;
}

/// Spawns real OS processes.
///
/// Output is forwarded line by line to this process's stdout/stderr as it
/// arrives and captured at the same time.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run<'a>(
        &'a self,
        invocation: &'a Invocation,
        cwd: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<CommandOutput>> + Send + 'a>> {
        Box::pin(run_process(invocation, cwd))
    }
}

async fn run_process(invocation: &Invocation, cwd: &Path) -> Result<CommandOutput> {
    info!(command = %invocation, cwd = %cwd.display(), "starting process");

    let mut cmd = invocation.to_command(cwd);
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(DevtasksError::ToolMissing {
                tool: invocation.tool().to_string(),
            });
        }
        Err(err) => {
            return Err(anyhow::Error::new(err)
                .context(format!("spawning `{invocation}`"))
                .into());
        }
    };

    let stdout = child.stdout.take().map(|s| forward_lines(s, Stream::Stdout));
    let stderr = child.stderr.take().map(|s| forward_lines(s, Stream::Stderr));

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for `{invocation}`"))?;

    let stdout = collect(stdout).await;
    let stderr = collect(stderr).await;

    info!(
        command = %invocation,
        exit_code = ?status.code(),
        success = status.success(),
        "process exited"
    );

    Ok(CommandOutput {
        code: status.code(),
        success: status.success(),
        stdout,
        stderr,
    })
}

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

/// Echo every line to the matching stream of this process and return the
/// captured text once the pipe closes.
///
/// Lines are forwarded as raw bytes; only the captured copy is decoded, and
/// invalid UTF-8 there is replaced rather than ending the read. The pipe is
/// drained to EOF so the child never sees a closed reader.
fn forward_lines<R>(reader: R, stream: Stream) -> JoinHandle<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut captured = String::new();
        let mut reader = BufReader::new(reader);
        let mut line = Vec::new();

        loop {
            line.clear();
            match reader.read_until(b'\n', &mut line).await {
                Ok(0) => break,
                Ok(_) => {
                    echo(stream, &line);
                    captured.push_str(&String::from_utf8_lossy(&line));
                }
                Err(err) => {
                    debug!(error = %err, ?stream, "reading process output failed");
                    break;
                }
            }
        }

        captured
    })
}

fn echo(stream: Stream, bytes: &[u8]) {
    let result = match stream {
        Stream::Stdout => std::io::stdout().lock().write_all(bytes),
        Stream::Stderr => std::io::stderr().lock().write_all(bytes),
    };
    if let Err(err) = result {
        debug!(error = %err, ?stream, "echoing process output failed");
    }
}

async fn collect(handle: Option<JoinHandle<String>>) -> String {
    match handle {
        Some(h) => h.await.unwrap_or_else(|err| {
            debug!(error = %err, "output reader task failed");
            String::new()
        }),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn program_invocation_displays_like_a_command_line() {
        let inv = Invocation::program("python", ["manage.py", "loaddata", "users"]);
        assert_eq!(inv.to_string(), "python manage.py loaddata users");
        assert_eq!(inv.tool(), "python");
    }

    #[test]
    fn failed_output_becomes_command_error() {
        let inv = Invocation::shell("exit 3");
        let output = CommandOutput {
            code: Some(3),
            success: false,
            stdout: String::new(),
            stderr: "boom\n".to_string(),
        };
        match output.into_result("migrate", &inv) {
            Err(DevtasksError::CommandFailed { step, code, stderr, .. }) => {
                assert_eq!(step, "migrate");
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "boom\n");
            }
            other => panic!("expected CommandFailed, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn process_runner_captures_output_and_status() {
        let dir = tempfile::tempdir().unwrap();
        let inv = Invocation::shell("echo out; echo err >&2; exit 4");

        let output = ProcessRunner.run(&inv, dir.path()).await.unwrap();
        assert_eq!(output.code, Some(4));
        assert!(!output.success);
        assert_eq!(output.stdout, "out\n");
        assert_eq!(output.stderr, "err\n");
    }

    #[tokio::test]
    async fn missing_binary_is_tool_missing() {
        let dir = tempfile::tempdir().unwrap();
        let inv = Invocation::program("devtasks-no-such-binary-xyz", ["--version"]);

        let err = ProcessRunner.run(&inv, dir.path()).await.unwrap_err();
        assert!(matches!(
            err,
            DevtasksError::ToolMissing { tool } if tool == "devtasks-no-such-binary-xyz"
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn invalid_utf8_output_does_not_stop_the_reader() {
        let dir = tempfile::tempdir().unwrap();
        // Enough output after the bad byte to fill the pipe buffer if nobody
        // were reading it any more.
        let inv = Invocation::shell(
            "printf 'bad \\377 byte\\n'; sleep 0.2; \
             i=0; while [ $i -lt 3000 ]; do echo \"line $i\"; i=$((i+1)); done; \
             echo after; exit 0",
        );

        let output = ProcessRunner.run(&inv, dir.path()).await.unwrap();
        assert_eq!(output.code, Some(0));
        assert!(output.success);
        assert!(output.stdout.starts_with("bad \u{FFFD} byte\n"));
        assert!(output.stdout.contains("line 2999\n"));
        assert!(output.stdout.ends_with("after\n"));
    }
}
