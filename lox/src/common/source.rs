use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Owns the text of a single source file (or REPL line), along with a
/// display path used when rendering diagnostics. Every `Span` carries a
/// reference-counted handle to the `Source` it was cut from, so spans can
/// never be misinterpreted against the wrong file.
#[derive(Debug, PartialEq, Eq)]
pub struct Source {
    pub path: PathBuf,
    pub contents: String,
}

impl Source {
    /// Reads a file from disk into a `Source`.
    pub fn path(path: impl AsRef<Path>) -> io::Result<Source> {
        let path = path.as_ref().to_path_buf();
        let contents = fs::read_to_string(&path)?;
        Ok(Source { path, contents })
    }

    /// Wraps an in-memory string (used for the REPL and tests) as a
    /// `Source` with a placeholder display path.
    pub fn source(contents: impl Into<String>) -> Source {
        Source {
            path: PathBuf::from("<source>"),
            contents: contents.into(),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}
