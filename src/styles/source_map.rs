// src/styles/source_map.rs

//! Minimal source map v3 documents for compilers that do not emit their own.

use std::path::{Component, Path, PathBuf};

use serde::Serialize;

/// A v3 source map naming the original stylesheet.
///
/// `mappings` is empty: the map points browsers at the right source file but
/// carries no per-position data.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SourceMap {
    pub version: u8,
    pub file: String,
    pub sources: Vec<String>,
    pub names: Vec<String>,
    pub mappings: String,
}

impl SourceMap {
    /// Map for `css_path` compiled from `source_path`. Both paths must share
    /// a common base (e.g. both relative to the project root).
    pub fn for_file(css_path: &Path, source_path: &Path) -> Self {
        let file = css_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let css_dir = css_path.parent().unwrap_or_else(|| Path::new(""));
        let source = relative_path(css_dir, source_path);

        Self {
            version: 3,
            file,
            sources: vec![source.to_string_lossy().replace('\\', "/")],
            names: Vec::new(),
            mappings: String::new(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Append the `sourceMappingURL` comment browsers use to find the map.
pub fn with_mapping_url(css: &str, map_file_name: &str) -> String {
    let mut out = css.trim_end().to_string();
    if !out.is_empty() {
        out.push('\n');
    }
    out.push_str(&format!("\n/*# sourceMappingURL={map_file_name} */\n"));
    out
}

/// Path to `to`, relative to the directory `from_dir`.
fn relative_path(from_dir: &Path, to: &Path) -> PathBuf {
    let from: Vec<Component> = from_dir.components().filter(|c| *c != Component::CurDir).collect();
    let to_parts: Vec<Component> = to.components().filter(|c| *c != Component::CurDir).collect();

    let common = from
        .iter()
        .zip(to_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut rel = PathBuf::new();
    for _ in common..from.len() {
        rel.push("..");
    }
    for part in &to_parts[common..] {
        rel.push(part.as_os_str());
    }
    rel
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_points_from_output_dir_into_scss_dir() {
        let map = SourceMap::for_file(
            Path::new("static/styles/pages/home.css"),
            Path::new("static/styles/scss/pages/home.scss"),
        );
        assert_eq!(map.file, "home.css");
        assert_eq!(map.sources, vec!["../scss/pages/home.scss".to_string()]);
        assert_eq!(map.version, 3);
    }

    #[test]
    fn json_has_v3_fields() {
        let map = SourceMap::for_file(Path::new("out/a.css"), Path::new("out/scss/a.scss"));
        let json: serde_json::Value = serde_json::from_str(&map.to_json().unwrap()).unwrap();
        assert_eq!(json["version"], 3);
        assert_eq!(json["sources"][0], "scss/a.scss");
        assert_eq!(json["mappings"], "");
    }

    #[test]
    fn mapping_url_is_appended_once_at_the_end() {
        let css = with_mapping_url("a {\n  color: red;\n}\n", "a.css.map");
        assert_eq!(css, "a {\n  color: red;\n}\n\n/*# sourceMappingURL=a.css.map */\n");
    }
}
