//! Files on disk as a [`CodeCollection`].
//!
//! Paths handed to the upgrader are relative to the project root, which is
//! also what exclusion patterns are matched against.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern, PatternError};
use tempfile::Builder;
use thiserror::Error;
use tracing::debug;
use upgrader_core::{ChangeSet, CodeCollection, CodeFile, SourceKind};
use walkdir::WalkDir;

/// Errors from reading or writing the collection.
#[derive(Debug, Error)]
pub(crate) enum CollectionError {
    #[error("invalid exclusion pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        source: PatternError,
    },
    #[error("failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// The upgradable files below one path of a project.
#[derive(Debug)]
pub(crate) struct DiskCollection {
    root: PathBuf,
    target: PathBuf,
    exclusions: Vec<Pattern>,
}

impl DiskCollection {
    /// `root` and `target` must already be canonical, with `target` inside
    /// `root`.
    pub(crate) fn new(
        root: PathBuf,
        target: PathBuf,
        excluded_paths: &[String],
    ) -> Result<Self, CollectionError> {
        let exclusions = excluded_paths
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|source| CollectionError::Pattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            root,
            target,
            exclusions,
        })
    }

    fn relative<'p>(&self, path: &'p Path) -> &'p Path {
        path.strip_prefix(&self.root).unwrap_or(path)
    }

    fn is_excluded(&self, path: &Path) -> bool {
        let relative = self.relative(path);
        self.exclusions
            .iter()
            .any(|pattern| pattern.matches_path_with(relative, MATCH_OPTIONS))
    }
}

impl CodeCollection for DiskCollection {
    type Error = CollectionError;

    fn files(&self) -> Result<Vec<CodeFile>, Self::Error> {
        let walker = WalkDir::new(&self.target)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !self.is_excluded(entry.path()));

        let mut files = Vec::new();
        for item in walker {
            let entry = item.map_err(|source| CollectionError::Walk {
                path: self.target.clone(),
                source,
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = self.relative(entry.path());
            if SourceKind::from_path(relative).is_none() {
                continue;
            }
            let contents =
                fs::read_to_string(entry.path()).map_err(|source| CollectionError::Read {
                    path: entry.path().to_path_buf(),
                    source,
                })?;
            files.push(CodeFile::new(relative, contents));
        }
        debug!(target = %self.target.display(), files = files.len(), "collected files");
        Ok(files)
    }

    fn apply(&mut self, changes: &ChangeSet) -> Result<usize, Self::Error> {
        let mut written = 0_usize;
        for change in changes.changed_files() {
            let path = self.root.join(change.path());
            atomic_write(&path, change.rewritten())
                .map_err(|source| CollectionError::Write { path, source })?;
            written = written.saturating_add(1);
        }
        Ok(written)
    }
}

/// Replaces `path` with `contents` through a synced temporary file in the
/// same directory, keeping the original file's permissions.
fn atomic_write(path: &Path, contents: &str) -> io::Result<()> {
    let directory = path.parent().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            "target path did not have a parent directory",
        )
    })?;
    let permissions = fs::metadata(path)?.permissions();

    let mut file = Builder::new()
        .prefix(".upgrade-")
        .suffix(".tmp")
        .tempfile_in(directory)?;
    file.write_all(contents.as_bytes())?;
    file.as_file().set_permissions(permissions)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|error| error.error)?;
    Ok(())
}
