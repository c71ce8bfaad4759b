// src/watch/patterns.rs

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::fs::{walk_files, FileSystem};
use crate::watch::path_utils::relative_str;

/// Compiled stylesheet source glob, evaluated against paths relative to the
/// project root (e.g. `"static/styles/scss/pages/home.scss"`).
#[derive(Clone)]
pub struct SourcePattern {
    glob: String,
    /// Directory to walk/watch; the non-glob prefix of the pattern.
    base_dir: PathBuf,
    set: GlobSet,
}

impl fmt::Debug for SourcePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourcePattern")
            .field("glob", &self.glob)
            .field("base_dir", &self.base_dir)
            .finish_non_exhaustive()
    }
}

impl SourcePattern {
    /// Compile `glob`. `*` does not cross `/`; use `**` for that.
    pub fn new(glob: &str) -> Result<Self> {
        let set = build_globset(&[glob.to_string()], true)
            .with_context(|| format!("building source globset for {glob}"))?;
        Ok(Self {
            glob: glob.to_string(),
            base_dir: literal_prefix(glob),
            set,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.glob
    }

    /// Relative directory containing every possible match.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn matches(&self, rel_path: &str) -> bool {
        self.set.is_match(rel_path)
    }

    /// Collect all files under `root` matching this pattern, sorted.
    ///
    /// Only the pattern's base directory is walked. A missing base directory
    /// yields an error, since it almost always means `--root` is wrong.
    pub fn collect_matching_files(&self, fs: &dyn FileSystem, root: &Path) -> Result<Vec<PathBuf>> {
        let base = root.join(&self.base_dir);
        if !fs.is_dir(&base) {
            anyhow::bail!("source directory {:?} does not exist", base);
        }

        let files = walk_files(fs, &base)?
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

/// Leading path components that contain no glob metacharacters.
fn literal_prefix(glob: &str) -> PathBuf {
    let mut base = PathBuf::new();
    for component in glob.split('/') {
        if component.is_empty() || component == "." {
            continue;
        }
        if component.contains(['*', '?', '[', '{']) {
            break;
        }
        base.push(component);
    }
    base
}

/// Build a GlobSet from simple string patterns.
///
/// With `literal_separator = false` a `*` also matches `/`, which is how
/// `find -path` patterns behave.
pub fn build_globset(patterns: &[String], literal_separator: bool) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = GlobBuilder::new(pat)
            .literal_separator(literal_separator)
            .build()
            .with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}
