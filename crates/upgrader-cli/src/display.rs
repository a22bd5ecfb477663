//! Human-readable report of a change set.

use std::io::{self, Write};

use upgrader_core::{ChangeSet, FileChange};

/// Writes every recorded file followed by the run summary.
pub(crate) fn render_changes<W: Write>(changes: &ChangeSet, out: &mut W) -> io::Result<()> {
    for change in changes.changes() {
        render_file(change, out)?;
    }
    writeln!(
        out,
        "{} files changed, {} warnings",
        changes.changed_files().count(),
        changes.warning_count()
    )
}

fn render_file<W: Write>(change: &FileChange, out: &mut W) -> io::Result<()> {
    let path = change.path().display();
    writeln!(out, "modified: {path}")?;
    write!(out, "{}", change.diff())?;
    if change.warnings().is_empty() {
        return writeln!(out);
    }

    writeln!(out, "Warnings for {path}:")?;
    for warning in change.warnings() {
        let location = warning.locate(change.original());
        writeln!(out, "{path}:{}", location.line)?;
        writeln!(out, "  {}", warning.message())?;
        writeln!(out, "  > {}", location.source_line.trim())?;
    }
    writeln!(out)
}
