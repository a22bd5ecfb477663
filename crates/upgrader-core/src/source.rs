//! Offset-preserving text patching.
//!
//! [`MutableSource`] owns one file's original text and collects replacements
//! keyed by byte ranges of that original text. Rules never see shifted
//! offsets: every span is expressed against the unedited input, and
//! [`MutableSource::render`] stitches the result together in a single pass.

use std::fmt;
use std::ops::Range;

use crate::error::UpgradeError;

/// Replace original bytes `[start, end)` with `replacement`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSpan {
    start: usize,
    end: usize,
    replacement: String,
}

impl EditSpan {
    /// Builds an edit span.
    #[must_use]
    pub fn new(start: usize, end: usize, replacement: impl Into<String>) -> Self {
        Self {
            start,
            end,
            replacement: replacement.into(),
        }
    }

    /// Start offset (inclusive).
    #[must_use]
    pub const fn start(&self) -> usize {
        self.start
    }

    /// End offset (exclusive).
    #[must_use]
    pub const fn end(&self) -> usize {
        self.end
    }

    /// The replaced byte range.
    #[must_use]
    pub const fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Replacement text.
    #[must_use]
    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    /// Returns true when both spans claim at least one common byte, or when
    /// two insertions target the same offset.
    #[must_use]
    pub const fn overlaps(&self, other: &Self) -> bool {
        if self.start == self.end && other.start == other.end {
            return self.start == other.start;
        }
        self.start < other.end && other.start < self.end
    }
}

impl fmt::Display for EditSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}) -> {:?}", self.start, self.end, self.replacement)
    }
}

/// One file's original text plus the replacements queued against it.
#[derive(Debug, Clone)]
pub struct MutableSource {
    original: String,
    edits: Vec<EditSpan>,
}

impl MutableSource {
    /// Wraps the original text of one file.
    #[must_use]
    pub fn new(original: impl Into<String>) -> Self {
        Self {
            original: original.into(),
            edits: Vec::new(),
        }
    }

    /// Returns the unedited text.
    #[must_use]
    pub fn original(&self) -> &str {
        &self.original
    }

    /// Returns the queued edits in the order they were queued.
    #[must_use]
    pub fn edits(&self) -> &[EditSpan] {
        &self.edits
    }

    /// Returns true when no replacement has been queued.
    #[must_use]
    pub fn is_unchanged(&self) -> bool {
        self.edits.is_empty()
    }

    /// Queues replacement of original bytes `[start, end)`.
    ///
    /// Overlap is not checked here; it is reported by [`Self::render`] so the
    /// error can name both offending spans.
    pub fn queue_replacement(&mut self, start: usize, end: usize, text: impl Into<String>) {
        self.edits.push(EditSpan::new(start, end, text));
    }

    /// Queues a replacement for a byte range.
    pub fn replace_range(&mut self, range: Range<usize>, text: impl Into<String>) {
        self.queue_replacement(range.start, range.end, text);
    }

    /// Queues a batch of edits produced elsewhere.
    pub fn absorb(&mut self, edits: impl IntoIterator<Item = EditSpan>) {
        self.edits.extend(edits);
    }

    /// Produces the rewritten text.
    ///
    /// Spans are applied in start order. Calling this twice yields the same
    /// result.
    ///
    /// # Errors
    ///
    /// Returns [`UpgradeError::ConflictingEdit`] if two spans overlap, and
    /// [`UpgradeError::Configuration`] if a span falls outside the text or
    /// splits a UTF-8 character.
    pub fn render(&self) -> Result<String, UpgradeError> {
        let mut sorted: Vec<&EditSpan> = self.edits.iter().collect();
        sorted.sort_by_key(|edit| (edit.start, edit.end));

        for pair in sorted.windows(2) {
            let [first, second] = pair else {
                continue;
            };
            if first.overlaps(second) {
                return Err(UpgradeError::conflicting_edit(
                    (*first).clone(),
                    (*second).clone(),
                ));
            }
        }

        let mut out = String::with_capacity(self.original.len());
        let mut cursor = 0usize;
        for edit in sorted {
            let before = self.slice(cursor..edit.start)?;
            out.push_str(before);
            self.slice(edit.range())?;
            out.push_str(&edit.replacement);
            cursor = edit.end;
        }
        out.push_str(self.slice(cursor..self.original.len())?);

        Ok(out)
    }

    fn slice(&self, range: Range<usize>) -> Result<&str, UpgradeError> {
        self.original.get(range.clone()).ok_or_else(|| {
            UpgradeError::configuration(format!(
                "edit range {}..{} is outside the source or not on a UTF-8 boundary",
                range.start, range.end
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn adjacent_spans_concatenate_without_gaps() {
        let mut source = MutableSource::new("helloworld!");
        source.queue_replacement(5, 10, "B");
        source.queue_replacement(0, 5, "A");

        assert_eq!(source.render().expect("render"), "AB!");
    }

    #[test]
    fn overlapping_spans_fail_naming_both() {
        let mut source = MutableSource::new("0123456789");
        source.queue_replacement(0, 6, "x");
        source.queue_replacement(4, 10, "y");

        let error = source.render().expect_err("must conflict");
        assert_eq!(
            error,
            UpgradeError::conflicting_edit(EditSpan::new(0, 6, "x"), EditSpan::new(4, 10, "y"))
        );
    }

    #[test]
    fn identical_token_edits_conflict() {
        let mut source = MutableSource::new("Foo::bar();");
        source.queue_replacement(5, 8, "baz");
        source.queue_replacement(5, 8, "qux");

        assert!(matches!(
            source.render(),
            Err(UpgradeError::ConflictingEdit { .. })
        ));
    }

    #[test]
    fn render_without_edits_is_identity() {
        let text = "<?php\r\n  echo 1;\n\n";
        let source = MutableSource::new(text);

        assert!(source.is_unchanged());
        assert_eq!(source.render().expect("render"), text);
    }

    #[test]
    fn render_is_idempotent() {
        let mut source = MutableSource::new("a b c");
        source.queue_replacement(2, 3, "B");

        let first = source.render().expect("render");
        let second = source.render().expect("render");
        assert_eq!(first, second);
        assert_eq!(source.original(), "a b c");
    }

    #[rstest]
    #[case(0, 0, "<", "<abc")]
    #[case(3, 3, ">", "abc>")]
    #[case(1, 2, "", "ac")]
    fn insertions_and_deletions(
        #[case] start: usize,
        #[case] end: usize,
        #[case] text: &str,
        #[case] expected: &str,
    ) {
        let mut source = MutableSource::new("abc");
        source.queue_replacement(start, end, text);
        assert_eq!(source.render().expect("render"), expected);
    }

    #[test]
    fn out_of_bounds_span_is_rejected() {
        let mut source = MutableSource::new("abc");
        source.queue_replacement(2, 9, "x");

        assert!(source.render().is_err());
    }
}
