// src/styles/pipeline.rs

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::config::StylesSection;
use crate::errors::{DevtasksError, Result};
use crate::fs::FileSystem;
use crate::styles::compiler::{CompileFailure, StyleCompiler};
use crate::styles::{BuildReport, CompileError, CompileJob};
use crate::watch::path_utils::relative_str;
use crate::watch::patterns::SourcePattern;

/// Compiles every stylesheet under the source dir into the output dir.
///
/// Holds no state between runs: sources are discovered from disk each time.
#[derive(Clone)]
pub struct StylePipeline {
    root: PathBuf,
    pattern: SourcePattern,
    source_dir: PathBuf,
    output_dir: PathBuf,
    compiler: Arc<dyn StyleCompiler>,
    fs: Arc<dyn FileSystem>,
}

impl fmt::Debug for StylePipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StylePipeline")
            .field("root", &self.root)
            .field("pattern", &self.pattern.as_str())
            .field("output_dir", &self.output_dir)
            .field("compiler", &self.compiler.name())
            .finish_non_exhaustive()
    }
}

impl StylePipeline {
    pub fn new(
        root: impl Into<PathBuf>,
        styles: &StylesSection,
        compiler: Arc<dyn StyleCompiler>,
        fs: Arc<dyn FileSystem>,
    ) -> Result<Self> {
        let pattern = SourcePattern::new(&styles.source_glob())?;
        Ok(Self {
            root: root.into(),
            pattern,
            source_dir: PathBuf::from(styles.source_dir.trim_end_matches('/')),
            output_dir: PathBuf::from(styles.output_dir.trim_end_matches('/')),
            compiler,
            fs,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn pattern(&self) -> &SourcePattern {
        &self.pattern
    }

    /// Absolute (root-joined) directory holding the sources.
    pub fn source_dir(&self) -> PathBuf {
        self.root.join(&self.source_dir)
    }

    /// Work out the jobs for the current source set.
    ///
    /// Partials (`_name.scss`) are only imported by other files and get no
    /// output of their own.
    pub fn plan(&self) -> Result<Vec<CompileJob>> {
        let sources = self
            .pattern
            .collect_matching_files(self.fs.as_ref(), &self.root)
            .map_err(|e| DevtasksError::file_system(self.source_dir(), e))?;

        let mut jobs = Vec::with_capacity(sources.len());
        for path in sources {
            let Some(rel) = relative_str(&self.root, &path) else {
                warn!(path = %path.display(), "source outside project root; skipping");
                continue;
            };
            let source_rel = PathBuf::from(rel);

            if is_partial(&source_rel) {
                debug!(source = %source_rel.display(), "skipping partial");
                continue;
            }

            let Ok(inside) = source_rel.strip_prefix(&self.source_dir) else {
                warn!(source = %source_rel.display(), "source outside source dir; skipping");
                continue;
            };

            let css_rel = self.output_dir.join(inside).with_extension("css");
            let map_rel = map_path_for(&css_rel);

            jobs.push(CompileJob {
                root: self.root.clone(),
                source_rel,
                css_rel,
                map_rel,
            });
        }

        Ok(jobs)
    }

    /// Compile every source once.
    ///
    /// A broken stylesheet is logged and recorded, and the rest of the batch
    /// still compiles. Only a compiler that cannot run, or an output that
    /// cannot be written, aborts the run.
    pub async fn run(&self) -> Result<BuildReport> {
        let jobs = self.plan()?;
        info!(
            sources = jobs.len(),
            compiler = self.compiler.name(),
            "building styles"
        );

        let mut report = BuildReport::default();
        for job in jobs.iter() {
            debug!(source = %job.source_rel.display(), css = %job.css_rel.display(), "compiling");

            match self.compiler.compile(job).await {
                Ok(()) => report.compiled.push(job.source_rel.clone()),
                Err(CompileFailure::Stylesheet(message)) => {
                    error!(source = %job.source_rel.display(), "{message}");
                    report.failed.push(CompileError {
                        source: job.source_rel.clone(),
                        message,
                    });
                }
                Err(CompileFailure::Fatal(err)) => return Err(err),
            }
        }

        info!(
            compiled = report.compiled.len(),
            failed = report.failed.len(),
            "style build finished"
        );
        Ok(report)
    }
}

fn is_partial(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('_'))
}

/// `home.css` -> `home.css.map`.
fn map_path_for(css: &Path) -> PathBuf {
    let mut name = OsString::from(css.as_os_str());
    name.push(".map");
    PathBuf::from(name)
}
