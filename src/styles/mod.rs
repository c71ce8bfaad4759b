// src/styles/mod.rs

//! Style build pipeline.
//!
//! - [`pipeline`] discovers sources and drives one compile per file.
//! - [`compiler`] holds the `StyleCompiler` trait and its backends.
//! - [`source_map`] builds maps for backends that do not write their own.

pub mod compiler;
pub mod pipeline;
pub mod source_map;

use std::fmt;
use std::path::{Path, PathBuf};

pub use compiler::{
    compiler_from_config, CompileFailure, RsassCompiler, SassCliCompiler, StyleCompiler,
};
pub use pipeline::StylePipeline;

/// One source file and the outputs it produces. The `*_rel` paths are
/// relative to `root`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileJob {
    pub root: PathBuf,
    pub source_rel: PathBuf,
    pub css_rel: PathBuf,
    pub map_rel: PathBuf,
}

impl CompileJob {
    pub fn source_path(&self) -> PathBuf {
        self.root.join(&self.source_rel)
    }

    pub fn css_path(&self) -> PathBuf {
        self.root.join(&self.css_rel)
    }

    pub fn map_path(&self) -> PathBuf {
        self.root.join(&self.map_rel)
    }
}

/// A stylesheet that failed to compile. Logged and collected; never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    pub source: PathBuf,
    pub message: String,
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.source.display(), self.message)
    }
}

/// Result of one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Sources that compiled, relative to root.
    pub compiled: Vec<PathBuf>,
    pub failed: Vec<CompileError>,
}

impl BuildReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn failed_sources(&self) -> impl Iterator<Item = &Path> {
        self.failed.iter().map(|e| e.source.as_path())
    }
}
