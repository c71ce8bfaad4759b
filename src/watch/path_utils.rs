// src/watch/path_utils.rs

//! Path helpers shared by the watcher and the pipelines.

use std::path::Path;

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// - First try a direct `strip_prefix(root)`.
/// - If that fails (symlinks, `/private/var` vs `/var` on macOS), canonicalize
///   both paths and try again.
///
/// Returns `None` if the path cannot be related to `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(to_slash(rel));
    }

    if let (Ok(root_canon), Ok(path_canon)) = (root.canonicalize(), path.canonicalize()) {
        if let Ok(rel) = path_canon.strip_prefix(&root_canon) {
            return Some(to_slash(rel));
        }
    }

    None
}

fn to_slash(rel: &Path) -> String {
    rel.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_root_prefix() {
        assert_eq!(
            relative_str(Path::new("/srv/app"), Path::new("/srv/app/static/a.scss")).as_deref(),
            Some("static/a.scss")
        );
    }

    #[test]
    fn unrelated_path_is_none() {
        assert_eq!(
            relative_str(Path::new("/srv/app-does-not-exist"), Path::new("/elsewhere/a.scss")),
            None
        );
    }
}
