//! Applying an upgrade spec across a collection of files.
//!
//! Every file goes through the same pipeline: detect its kind, parse or
//! validate it once, run each applicable rule against one shared
//! [`MutableSource`], then render once. Files share no mutable state, so
//! they are processed in parallel; results keep collection order.

use std::convert::Infallible;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::de::IgnoredAny;
use tracing::{debug, info, warn};

use crate::change_set::{ChangeSet, FileChange};
use crate::error::UpgradeError;
use crate::language::SourceKind;
use crate::parser::PhpParser;
use crate::position::one_based_to_offset;
use crate::rules::{ParsedPhp, RuleInput, UpgradeRule};
use crate::source::MutableSource;
use crate::spec::UpgradeSpec;
use crate::warning::Warning;

/// One file offered by a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeFile {
    path: PathBuf,
    contents: String,
}

impl CodeFile {
    /// Creates a file entry.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }

    /// Path of the file within its collection.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The file's text.
    #[must_use]
    pub fn contents(&self) -> &str {
        &self.contents
    }
}

/// A source of files to upgrade and a sink for the results.
pub trait CodeCollection {
    /// Error raised while listing or writing files.
    type Error;

    /// Lists the files to upgrade, in a deterministic order.
    ///
    /// # Errors
    ///
    /// Returns an error when the files cannot be enumerated or read.
    fn files(&self) -> Result<Vec<CodeFile>, Self::Error>;

    /// Writes every changed file of `changes` back, each file whole.
    ///
    /// Returns the number of files written.
    ///
    /// # Errors
    ///
    /// Returns an error when a file cannot be written.
    fn apply(&mut self, changes: &ChangeSet) -> Result<usize, Self::Error>;
}

/// A collection held in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InMemoryCollection {
    files: Vec<CodeFile>,
}

impl InMemoryCollection {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a file.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        self.insert(CodeFile::new(path, contents));
        self
    }

    /// Adds or replaces a file.
    pub fn insert(&mut self, file: CodeFile) {
        if let Some(existing) = self.files.iter_mut().find(|existing| existing.path == file.path) {
            *existing = file;
            return;
        }
        self.files.push(file);
    }

    /// Returns the current contents of `path`.
    #[must_use]
    pub fn get(&self, path: &Path) -> Option<&str> {
        self.files
            .iter()
            .find(|file| file.path == path)
            .map(CodeFile::contents)
    }
}

impl CodeCollection for InMemoryCollection {
    type Error = Infallible;

    fn files(&self) -> Result<Vec<CodeFile>, Self::Error> {
        Ok(self.files.clone())
    }

    fn apply(&mut self, changes: &ChangeSet) -> Result<usize, Self::Error> {
        let mut written = 0_usize;
        for change in changes.changed_files() {
            self.insert(CodeFile::new(change.path(), change.rewritten()));
            written = written.saturating_add(1);
        }
        Ok(written)
    }
}

/// Applies an [`UpgradeSpec`] to files.
#[derive(Debug, Clone)]
pub struct Upgrader {
    spec: UpgradeSpec,
}

impl Upgrader {
    /// Creates an upgrader for `spec`.
    ///
    /// # Errors
    ///
    /// Returns [`UpgradeError::Configuration`] when the spec has no rules.
    pub fn new(spec: UpgradeSpec) -> Result<Self, UpgradeError> {
        if spec.is_empty() {
            return Err(UpgradeError::configuration("no rules selected"));
        }
        Ok(Self { spec })
    }

    /// The spec being applied.
    #[must_use]
    pub const fn spec(&self) -> &UpgradeSpec {
        &self.spec
    }

    /// Upgrades `files`, returning one change set entry per touched file.
    ///
    /// Parse failures and conflicting edits are reported as warnings on the
    /// affected file, whose text is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error only for failures that affect every file, such as a
    /// parser that cannot be initialised.
    pub fn upgrade(&self, files: &[CodeFile]) -> Result<ChangeSet, UpgradeError> {
        let outcomes = files
            .par_iter()
            .map(|file| self.upgrade_file(file))
            .collect::<Result<Vec<_>, _>>()?;
        let changes: ChangeSet = outcomes.into_iter().flatten().collect();

        info!(
            files = files.len(),
            changed = changes.changed_files().count(),
            warnings = changes.warning_count(),
            "upgrade complete"
        );
        Ok(changes)
    }

    /// Upgrades one file. Returns `None` when no rule applies to it.
    ///
    /// # Errors
    ///
    /// Returns an error only for fatal failures; see [`UpgradeError::is_fatal`].
    pub fn upgrade_file(&self, file: &CodeFile) -> Result<Option<FileChange>, UpgradeError> {
        let Some(kind) = SourceKind::from_path(file.path()) else {
            return Ok(None);
        };
        let rules: Vec<&UpgradeRule> = self
            .spec
            .rules()
            .iter()
            .filter(|rule| rule.applies_to(kind))
            .collect();
        if rules.is_empty() {
            return Ok(None);
        }
        debug!(path = %file.path().display(), kind = %kind, rules = rules.len(), "upgrading file");

        let php = match prepare(kind, file) {
            Ok(php) => php,
            Err(error) if !error.is_fatal() => {
                warn!(path = %file.path().display(), %error, "skipping file");
                let warning = failure_warning(file, &error);
                return Ok(Some(unchanged(file, vec![warning])));
            }
            Err(error) => return Err(error),
        };

        let input = RuleInput {
            path: file.path(),
            kind,
            source: file.contents(),
            php: php.as_ref(),
        };
        let mut buffer = MutableSource::new(file.contents());
        let mut warnings = Vec::new();
        for rule in rules {
            let found = rule.apply(&input, &mut buffer);
            debug!(rule = rule.name(), warnings = found.len(), "rule applied");
            warnings.extend(found);
        }

        match buffer.render() {
            Ok(rewritten) => Ok(Some(FileChange::new(
                file.path(),
                file.contents(),
                rewritten,
                warnings,
            ))),
            Err(error) => {
                warn!(path = %file.path().display(), %error, "discarding edits");
                warnings.push(failure_warning(file, &error));
                Ok(Some(unchanged(file, warnings)))
            }
        }
    }
}

/// Parses PHP and validates YAML before any rule runs.
fn prepare(kind: SourceKind, file: &CodeFile) -> Result<Option<ParsedPhp>, UpgradeError> {
    match kind {
        SourceKind::Php => {
            let parsed = PhpParser::new()?.parse(file.contents())?;
            if let Some(first) = parsed.errors().into_iter().next() {
                return Err(UpgradeError::parse(
                    file.path().to_path_buf(),
                    first.line,
                    first.column,
                    first.message,
                ));
            }
            Ok(Some(ParsedPhp::new(parsed)))
        }
        SourceKind::ConfigYaml | SourceKind::LangYaml => {
            serde_saphyr::from_multiple::<IgnoredAny>(file.contents()).map_err(|e| {
                UpgradeError::parse(file.path().to_path_buf(), 1, 1, e.to_string())
            })?;
            Ok(None)
        }
        SourceKind::Template => Ok(None),
    }
}

fn failure_warning(file: &CodeFile, error: &UpgradeError) -> Warning {
    let span = match error {
        UpgradeError::Parse { line, column, .. } => {
            let offset = one_based_to_offset(file.contents(), *line, *column);
            offset..offset
        }
        UpgradeError::ConflictingEdit { first, second } => first.start()..second.end(),
        _ => 0..0,
    };
    Warning::new(file.path(), span, error.to_string())
}

fn unchanged(file: &CodeFile, warnings: Vec<Warning>) -> FileChange {
    FileChange::new(file.path(), file.contents(), file.contents(), warnings)
}
