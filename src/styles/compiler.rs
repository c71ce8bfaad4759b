// src/styles/compiler.rs

//! Stylesheet compiler backends.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use rsass::output::{Format, Style};
use tracing::debug;

use crate::config::StylesSection;
use crate::errors::{DevtasksError, Result};
use crate::exec::{CommandRunner, Invocation};
use crate::fs::FileSystem;
use crate::styles::source_map::{with_mapping_url, SourceMap};
use crate::styles::CompileJob;
use crate::types::{CompilerKind, OutputStyle};

/// Why a single file did not compile.
#[derive(Debug)]
pub enum CompileFailure {
    /// The stylesheet itself is broken. Reported, then the batch continues.
    Stylesheet(String),
    /// The compiler cannot run at all (missing binary, unwritable output).
    /// Aborts the batch.
    Fatal(DevtasksError),
}

impl From<DevtasksError> for CompileFailure {
    fn from(err: DevtasksError) -> Self {
        CompileFailure::Fatal(err)
    }
}

pub type CompileResult = std::result::Result<(), CompileFailure>;

/// Compiles one source file into its CSS and source map outputs.
pub trait StyleCompiler: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    fn compile<'a>(
        &'a self,
        job: &'a CompileJob,
    ) -> Pin<Box<dyn Future<Output = CompileResult> + Send + 'a>>;
}

/// Pick the backend configured in `[styles]`.
pub fn compiler_from_config(
    styles: &StylesSection,
    fs: Arc<dyn FileSystem>,
    runner: Arc<dyn CommandRunner>,
) -> Arc<dyn StyleCompiler> {
    match styles.compiler {
        CompilerKind::Sass => Arc::new(SassCliCompiler::new(
            styles.sass_binary.clone(),
            styles.output_style,
            runner,
        )),
        CompilerKind::Rsass => Arc::new(RsassCompiler::new(styles.output_style, fs)),
    }
}

/// dart-sass exit status for input/output failures. Stylesheet errors exit 65.
const SASS_EXIT_IO_ERROR: i32 = 66;

/// External dart-sass binary. One process per file; sass writes the CSS and
/// the adjacent `.css.map` itself.
pub struct SassCliCompiler {
    binary: String,
    style: OutputStyle,
    runner: Arc<dyn CommandRunner>,
}

impl fmt::Debug for SassCliCompiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SassCliCompiler")
            .field("binary", &self.binary)
            .field("style", &self.style)
            .finish_non_exhaustive()
    }
}

impl SassCliCompiler {
    pub fn new(
        binary: impl Into<String>,
        style: OutputStyle,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self {
            binary: binary.into(),
            style,
            runner,
        }
    }

    pub fn invocation(&self, job: &CompileJob) -> Invocation {
        Invocation::program(
            self.binary.clone(),
            [
                format!("--style={}", self.style),
                "--source-map".to_string(),
                job.source_rel.to_string_lossy().into_owned(),
                job.css_rel.to_string_lossy().into_owned(),
            ],
        )
    }
}

impl StyleCompiler for SassCliCompiler {
    fn name(&self) -> &'static str {
        "sass"
    }

    fn compile<'a>(
        &'a self,
        job: &'a CompileJob,
    ) -> Pin<Box<dyn Future<Output = CompileResult> + Send + 'a>> {
        Box::pin(async move {
            let invocation = self.invocation(job);
            let output = self.runner.run(&invocation, &job.root).await?;

            if output.success {
                return Ok(());
            }

            let message = if output.stderr.trim().is_empty() {
                format!("{} exited with {:?}", self.binary, output.code)
            } else {
                output.stderr.trim_end().to_string()
            };

            if output.code == Some(SASS_EXIT_IO_ERROR) {
                let css_path = job.css_path();
                return Err(CompileFailure::Fatal(DevtasksError::file_system(
                    css_path,
                    anyhow::anyhow!(message),
                )));
            }
            Err(CompileFailure::Stylesheet(message))
        })
    }
}

/// In-process compiler backed by `rsass`.
#[derive(Debug)]
pub struct RsassCompiler {
    style: OutputStyle,
    fs: Arc<dyn FileSystem>,
}

impl RsassCompiler {
    pub fn new(style: OutputStyle, fs: Arc<dyn FileSystem>) -> Self {
        Self { style, fs }
    }

    fn format(&self) -> Format {
        let style = match self.style {
            OutputStyle::Expanded => Style::Expanded,
            OutputStyle::Compressed => Style::Compressed,
        };
        Format {
            style,
            ..Default::default()
        }
    }

    fn write_outputs(&self, job: &CompileJob, css: &str) -> Result<()> {
        let map_name = job
            .map_rel
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let (css_path, map_path) = (job.css_path(), job.map_path());
        let map_json = SourceMap::for_file(&job.css_rel, &job.source_rel)
            .to_json()
            .map_err(|e| DevtasksError::file_system(&map_path, e))?;

        self.fs
            .write(&css_path, with_mapping_url(css, &map_name).as_bytes())
            .map_err(|e| DevtasksError::file_system(&css_path, e))?;
        self.fs
            .write(&map_path, map_json.as_bytes())
            .map_err(|e| DevtasksError::file_system(&map_path, e))?;
        Ok(())
    }
}

impl StyleCompiler for RsassCompiler {
    fn name(&self) -> &'static str {
        "rsass"
    }

    fn compile<'a>(
        &'a self,
        job: &'a CompileJob,
    ) -> Pin<Box<dyn Future<Output = CompileResult> + Send + 'a>> {
        Box::pin(async move {
            let source = job.source_path();
            let format = self.format();

            let compiled = tokio::task::spawn_blocking(move || {
                rsass::compile_scss_path(&source, format).map_err(|e| e.to_string())
            })
            .await
            .map_err(|e| CompileFailure::Fatal(anyhow::Error::new(e).into()))?;

            let css = match compiled {
                Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                Err(message) => return Err(CompileFailure::Stylesheet(message)),
            };

            debug!(source = %job.source_rel.display(), bytes = css.len(), "rsass compiled");
            self.write_outputs(job, &css)?;
            Ok(())
        })
    }
}
