//! Results of an upgrade run.
//!
//! A [`ChangeSet`] is built by the upgrader and never touched by the rules.
//! It is consumed by whatever displays the outcome or writes it back.

use std::path::{Path, PathBuf};

use similar::TextDiff;

use crate::warning::Warning;

/// The outcome for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    path: PathBuf,
    original: String,
    rewritten: String,
    warnings: Vec<Warning>,
}

impl FileChange {
    /// Records the outcome for one file.
    #[must_use]
    pub fn new(
        path: impl Into<PathBuf>,
        original: impl Into<String>,
        rewritten: impl Into<String>,
        warnings: Vec<Warning>,
    ) -> Self {
        Self {
            path: path.into(),
            original: original.into(),
            rewritten: rewritten.into(),
            warnings,
        }
    }

    /// The file's path within its collection.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Text before the upgrade.
    #[must_use]
    pub fn original(&self) -> &str {
        &self.original
    }

    /// Text after the upgrade. Equal to the original when nothing changed.
    #[must_use]
    pub fn rewritten(&self) -> &str {
        &self.rewritten
    }

    /// Warnings raised for the file, in rule order.
    #[must_use]
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Returns true when the rewritten text differs from the original.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.original != self.rewritten
    }

    /// Renders a unified diff of the original and rewritten text.
    ///
    /// Returns an empty string when nothing changed.
    #[must_use]
    pub fn diff(&self) -> String {
        if !self.has_changes() {
            return String::new();
        }
        let path = self.path.display().to_string();
        TextDiff::from_lines(&self.original, &self.rewritten)
            .unified_diff()
            .context_radius(3)
            .header(&format!("a/{path}"), &format!("b/{path}"))
            .to_string()
    }
}

/// Per-file outcomes of one run, in collection order.
///
/// Only files that were rewritten or carry warnings are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    changes: Vec<FileChange>,
}

impl ChangeSet {
    /// Creates an empty change set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the outcome for one file, dropping it if it is a no-op.
    pub fn push(&mut self, change: FileChange) {
        if change.has_changes() || !change.warnings.is_empty() {
            self.changes.push(change);
        }
    }

    /// Every recorded file.
    #[must_use]
    pub fn changes(&self) -> &[FileChange] {
        &self.changes
    }

    /// Files whose content changed.
    pub fn changed_files(&self) -> impl Iterator<Item = &FileChange> {
        self.changes.iter().filter(|change| change.has_changes())
    }

    /// The outcome for `path`, if it was recorded.
    #[must_use]
    pub fn file(&self, path: &Path) -> Option<&FileChange> {
        self.changes.iter().find(|change| change.path == path)
    }

    /// Total number of warnings across all files.
    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.changes.iter().map(|change| change.warnings.len()).sum()
    }

    /// Returns true when no file was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

impl FromIterator<FileChange> for ChangeSet {
    fn from_iter<I: IntoIterator<Item = FileChange>>(iter: I) -> Self {
        let mut set = Self::new();
        for change in iter {
            set.push(change);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_op_files_are_not_recorded() {
        let set: ChangeSet = [
            FileChange::new("same.php", "a", "a", Vec::new()),
            FileChange::new("edited.php", "a", "b", Vec::new()),
            FileChange::new(
                "flagged.php",
                "a",
                "a",
                vec![Warning::new("flagged.php", 0..1, "look")],
            ),
        ]
        .into_iter()
        .collect();

        let paths: Vec<&Path> = set.changes().iter().map(FileChange::path).collect();
        assert_eq!(paths, vec![Path::new("edited.php"), Path::new("flagged.php")]);
        assert_eq!(set.changed_files().count(), 1);
        assert_eq!(set.warning_count(), 1);
        assert!(set.file(Path::new("same.php")).is_none());
    }

    #[test]
    fn diff_shows_changed_lines_with_context() {
        let change = FileChange::new(
            "src/Page.php",
            "<?php\n$a = 1;\n$obj->old();\n",
            "<?php\n$a = 1;\n$obj->fresh();\n",
            Vec::new(),
        );

        insta::assert_snapshot!(change.diff(), @r"
        --- a/src/Page.php
        +++ b/src/Page.php
        @@ -1,3 +1,3 @@
         <?php
         $a = 1;
        -$obj->old();
        +$obj->fresh();
        ");
    }

    #[test]
    fn unchanged_file_has_empty_diff() {
        let change = FileChange::new("a.php", "same", "same", Vec::new());
        assert_eq!(change.diff(), "");
    }
}
