//! Error types for upgrade operations.
//!
//! Configuration errors are fatal and abort a run before any file is
//! touched. Parse and conflicting-edit errors are per-file: the upgrader turns
//! them into warnings and passes the affected file through unchanged.

use std::path::PathBuf;

use thiserror::Error;

use crate::source::EditSpan;

/// Errors from upgrade operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum UpgradeError {
    /// The rule selection or rule parameters are unusable.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the problem.
        message: String,
    },

    /// An API change signature could not be understood.
    #[error("invalid signature '{signature}': {reason}")]
    InvalidSignature {
        /// The signature as configured.
        signature: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Failed to initialise the Tree-sitter parser.
    #[error("failed to initialise parser: {message}")]
    ParserInit {
        /// Description of the failure.
        message: String,
    },

    /// A file could not be parsed.
    #[error("failed to parse {}:{line}:{column}: {message}", path.display())]
    Parse {
        /// The file that failed to parse.
        path: PathBuf,
        /// One-based line of the first error.
        line: u32,
        /// One-based column of the first error.
        column: u32,
        /// Description of the failure.
        message: String,
    },

    /// Two queued edits cover overlapping bytes of the original text.
    #[error("conflicting edits: {first} overlaps {second}")]
    ConflictingEdit {
        /// The earlier span, ordered by start offset.
        first: EditSpan,
        /// The span that overlaps it.
        second: EditSpan,
    },
}

impl UpgradeError {
    /// Creates a configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates an invalid signature error.
    #[must_use]
    pub fn invalid_signature(signature: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSignature {
            signature: signature.into(),
            reason: reason.into(),
        }
    }

    /// Creates a parser initialisation error.
    #[must_use]
    pub fn parser_init(message: impl Into<String>) -> Self {
        Self::ParserInit {
            message: message.into(),
        }
    }

    /// Creates a parse error located at a one-based line and column.
    #[must_use]
    pub fn parse(path: PathBuf, line: u32, column: u32, message: impl Into<String>) -> Self {
        Self::Parse {
            path,
            line,
            column,
            message: message.into(),
        }
    }

    /// Creates a conflicting edit error.
    #[must_use]
    pub const fn conflicting_edit(first: EditSpan, second: EditSpan) -> Self {
        Self::ConflictingEdit { first, second }
    }

    /// Returns true for errors that abort the whole run.
    ///
    /// Everything else is recovered per file.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Configuration { .. } | Self::InvalidSignature { .. } | Self::ParserInit { .. }
        )
    }
}
