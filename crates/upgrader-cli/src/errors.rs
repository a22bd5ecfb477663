//! Errors surfaced by the command-line run.

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use upgrader_config::ConfigError;
use upgrader_core::UpgradeError;

use crate::collection::CollectionError;
use crate::telemetry::TelemetryError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to resolve {path}: {source}")]
    ResolvePath { path: PathBuf, source: io::Error },
    #[error("{path} must be inside the root directory {root}")]
    OutsideRoot { path: PathBuf, root: PathBuf },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Upgrade(#[from] UpgradeError),
    #[error(transparent)]
    Collection(#[from] CollectionError),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error("failed to write the report: {0}")]
    Report(#[source] io::Error),
}
