//! Opaque code fragments supplied by the query compiler

use serde::Deserialize;

/// A unit of target-language source text
///
/// Fragments are never parsed or validated; the renderer only decides where
/// and in which order they are emitted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct Fragment(String);

impl Fragment {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for Fragment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Fragment {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Fragment {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Collect anything string-like into a fragment list
pub fn fragments<I, S>(items: I) -> Vec<Fragment>
where
    I: IntoIterator<Item = S>,
    S: Into<Fragment>,
{
    items.into_iter().map(Into::into).collect()
}

/// Builds a fragment list line by line, indenting by brace depth
///
/// A line that is exactly `{` increases the indent of the lines after it; a
/// line that is exactly `}` is itself emitted one level shallower.
#[derive(Debug, Clone, Default)]
pub struct SourceEmitter {
    lines: Vec<Fragment>,
    indent: usize,
}

impl SourceEmitter {
    const INDENT: &'static str = "  ";

    pub fn new() -> Self {
        Self::default()
    }

    /// Add a line of code, adjusting indentation for lone braces
    pub fn add_line(&mut self, line: impl AsRef<str>) -> &mut Self {
        let line = line.as_ref();
        if line == "}" {
            self.indent = self.indent.saturating_sub(1);
        }

        self.lines
            .push(Fragment::new(format!("{}{}", Self::INDENT.repeat(self.indent), line)));

        if line == "{" {
            self.indent += 1;
        }
        self
    }

    /// Current brace depth
    pub fn depth(&self) -> usize {
        self.indent
    }

    pub fn lines(&self) -> &[Fragment] {
        &self.lines
    }

    pub fn into_fragments(self) -> Vec<Fragment> {
        self.lines
    }
}
