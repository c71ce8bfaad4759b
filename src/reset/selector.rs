// src/reset/selector.rs

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::GlobSet;

use crate::fs::{walk_files, FileSystem};
use crate::watch::path_utils::relative_str;
use crate::watch::patterns::build_globset;

/// Selects files the way `find . -path P -name N -not -path X` does.
///
/// Path patterns are matched against the path relative to the working dir
/// with `*` spanning directory separators. `name` is matched against the
/// file name only.
#[derive(Clone)]
pub struct FileSelector {
    description: String,
    path: Option<GlobSet>,
    name: Option<GlobSet>,
    exclude: Option<GlobSet>,
}

impl fmt::Debug for FileSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSelector")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

impl FileSelector {
    pub fn new(
        path: Option<&str>,
        name: Option<&str>,
        exclude: &[String],
    ) -> Result<Self> {
        let mut description = Vec::new();
        if let Some(p) = path {
            description.push(format!("-path '{p}'"));
        }
        if let Some(n) = name {
            description.push(format!("-name '{n}'"));
        }
        for x in exclude {
            description.push(format!("-not -path '{x}'"));
        }

        let path_pats: Vec<String> = path.into_iter().map(str::to_string).collect();
        let name_pats: Vec<String> = name.into_iter().map(str::to_string).collect();

        Ok(Self {
            description: description.join(" "),
            path: compile_optional(&path_pats).context("compiling path pattern")?,
            name: compile_optional(&name_pats).context("compiling name pattern")?,
            exclude: compile_optional(exclude).context("compiling exclude patterns")?,
        })
    }

    /// Migration modules: `*.py` below any `*migrations*` path, minus the
    /// protected patterns (`__init__` files, virtualenvs by default).
    pub fn migrations(protected: &[String]) -> Result<Self> {
        Self::new(Some("*migrations*"), Some("*.py"), protected)
    }

    /// Local sqlite database files.
    pub fn sqlite_databases() -> Result<Self> {
        Self::new(Some("*.sqlite3"), None, &[])
    }

    pub fn matches(&self, rel_path: &str) -> bool {
        if let Some(path) = &self.path {
            if !path.is_match(rel_path) {
                return false;
            }
        }
        if let Some(name) = &self.name {
            let file_name = rel_path.rsplit('/').next().unwrap_or(rel_path);
            if !name.is_match(file_name) {
                return false;
            }
        }
        if let Some(exclude) = &self.exclude {
            if exclude.is_match(rel_path) {
                return false;
            }
        }
        true
    }

    /// Every file below `root` this selector matches, sorted.
    pub fn select(&self, fs: &dyn FileSystem, root: &Path) -> Result<Vec<PathBuf>> {
        let files = walk_files(fs, root)?
            .into_iter()
            .filter(|path| {
                relative_str(root, path)
                    .map(|rel| self.matches(&rel))
                    .unwrap_or(false)
            })
            .collect();
        Ok(files)
    }
}

fn compile_optional(patterns: &[String]) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        Ok(None)
    } else {
        build_globset(patterns, false).map(Some)
    }
}

impl fmt::Display for FileSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "find {}", self.description)
    }
}
