//! Warnings reported against one file.
//!
//! A warning keeps only the byte range it refers to. Line numbers and the
//! surrounding source line are derived from the original text on demand.

use std::ops::Range;
use std::path::{Path, PathBuf};

use crate::position::{line_at, offset_to_one_based};

/// A finding a reviewer should look at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    path: PathBuf,
    span: Range<usize>,
    message: String,
}

impl Warning {
    /// Creates a warning for `span` of the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, span: Range<usize>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            span,
            message: message.into(),
        }
    }

    /// The file the warning belongs to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Byte range of the original text the warning points at.
    #[must_use]
    pub fn span(&self) -> Range<usize> {
        self.span.clone()
    }

    /// The message to show.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Locates the warning in `source`, which must be the original text of
    /// the file.
    #[must_use]
    pub fn locate<'s>(&self, source: &'s str) -> WarningLocation<'s> {
        let (line, column) = offset_to_one_based(source, self.span.start);
        WarningLocation {
            line,
            column,
            source_line: line_at(source, self.span.start),
        }
    }
}

/// Where a warning sits in its file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WarningLocation<'s> {
    /// One-based line.
    pub line: u32,
    /// One-based column, in bytes.
    pub column: u32,
    /// The whole line, without its terminator.
    pub source_line: &'s str,
}
