use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Which backend compiles stylesheets.
///
/// - `Sass`: the external dart-sass binary (default). Writes the CSS and its
///   source map itself.
/// - `Rsass`: in-process compiler, no external tool required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CompilerKind {
    #[default]
    Sass,
    Rsass,
}

impl FromStr for CompilerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sass" => Ok(CompilerKind::Sass),
            "rsass" => Ok(CompilerKind::Rsass),
            other => Err(format!(
                "invalid compiler: {other} (expected \"sass\" or \"rsass\")"
            )),
        }
    }
}

/// CSS output formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputStyle {
    #[default]
    Expanded,
    Compressed,
}

impl OutputStyle {
    /// Value passed to `sass --style=`.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputStyle::Expanded => "expanded",
            OutputStyle::Compressed => "compressed",
        }
    }
}

impl fmt::Display for OutputStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
