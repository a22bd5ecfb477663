//! Errors raised while loading upgrade definitions.

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use upgrader_core::UpgradeError;

/// Errors from discovering, reading or merging definition files.
///
/// Every variant is fatal: a run never starts with a partial configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// No definition file exists under the root.
    #[error("no .upgrade.yml definitions found under {root}")]
    NoDefinitions {
        /// The directory that was searched.
        root: PathBuf,
    },

    /// The directory tree could not be walked.
    #[error("failed to search {root} for definitions: {source}")]
    Discover {
        /// The directory being searched.
        root: PathBuf,
        /// Underlying traversal error.
        source: walkdir::Error,
    },

    /// A definition file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// The definition file.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },

    /// A definition file is not valid YAML of the expected shape.
    #[error("invalid definition in {path}: {source}")]
    Parse {
        /// The definition file.
        path: PathBuf,
        /// Deserialiser diagnostic, with its location in the file.
        source: Box<serde_saphyr::Error>,
    },

    /// A definition file declares an unusable API change.
    #[error("invalid API change in {path}: {source}")]
    ApiChange {
        /// The definition file.
        path: PathBuf,
        /// Why the change was rejected.
        source: UpgradeError,
    },

    /// The requested rule selection is unusable.
    #[error(transparent)]
    Rules(#[from] UpgradeError),
}
