use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use devtasks::errors::{DevtasksError, Result};
use devtasks::exec::{CommandOutput, CommandRunner, Invocation};

/// A fake command runner that:
/// - records every invocation (rendered with `Display`) in order
/// - exits 0 unless an exit code was configured for a command prefix
/// - reports `ToolMissing` for tools marked missing
#[derive(Default, Clone)]
pub struct FakeCommandRunner {
    executed: Arc<Mutex<Vec<String>>>,
    exit_codes: Arc<Mutex<HashMap<String, (i32, String)>>>,
    missing_tools: Arc<Mutex<Vec<String>>>,
}

impl FakeCommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands whose rendered form starts with `prefix` exit with `code`
    /// and print `stderr`.
    pub fn fail_with(self, prefix: &str, code: i32, stderr: &str) -> Self {
        self.exit_codes
            .lock()
            .unwrap()
            .insert(prefix.to_string(), (code, stderr.to_string()));
        self
    }

    pub fn missing_tool(self, tool: &str) -> Self {
        self.missing_tools.lock().unwrap().push(tool.to_string());
        self
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

impl CommandRunner for FakeCommandRunner {
    fn run<'a>(
        &'a self,
        invocation: &'a Invocation,
        _cwd: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<CommandOutput>> + Send + 'a>> {
        Box::pin(async move {
            if self
                .missing_tools
                .lock()
                .unwrap()
                .iter()
                .any(|t| t == invocation.tool())
            {
                return Err(DevtasksError::ToolMissing {
                    tool: invocation.tool().to_string(),
                });
            }

            let rendered = invocation.to_string();
            self.executed.lock().unwrap().push(rendered.clone());

            let failure = self
                .exit_codes
                .lock()
                .unwrap()
                .iter()
                .find(|(prefix, _)| rendered.starts_with(prefix.as_str()))
                .map(|(_, v)| v.clone());

            Ok(match failure {
                Some((code, stderr)) => CommandOutput {
                    code: Some(code),
                    success: false,
                    stdout: String::new(),
                    stderr,
                },
                None => CommandOutput {
                    code: Some(0),
                    success: true,
                    stdout: String::new(),
                    stderr: String::new(),
                },
            })
        })
    }
}
