//! Shared position conversion helpers.
//!
//! Tree-sitter positions are zero-based. For user-facing messages, we prefer
//! one-based line and column numbers. Warnings only keep byte offsets, so the
//! line lookup for them works from the original text.

/// Converts a Tree-sitter position (0-based) to one-based display coordinates.
#[must_use]
pub(crate) fn point_to_one_based(pos: tree_sitter::Point) -> (u32, u32) {
    // Line/column numbers will realistically never exceed u32::MAX.
    let line = u32::try_from(pos.row.saturating_add(1)).unwrap_or(u32::MAX);
    let column = u32::try_from(pos.column.saturating_add(1)).unwrap_or(u32::MAX);
    (line, column)
}

/// Computes the one-based line and column of a byte offset.
///
/// Offsets past the end of `source` are clamped to its length.
#[must_use]
pub(crate) fn offset_to_one_based(source: &str, offset: usize) -> (u32, u32) {
    let clamped = offset.min(source.len());
    let before = source.as_bytes().get(..clamped).unwrap_or_default();
    let row = before.iter().filter(|byte| **byte == b'\n').count();
    let line_start = before
        .iter()
        .rposition(|byte| *byte == b'\n')
        .map_or(0, |index| index.saturating_add(1));
    pos_to_u32(row, clamped.saturating_sub(line_start))
}

/// Returns the full line of `source` containing `offset`, without its line
/// terminator.
#[must_use]
pub(crate) fn line_at(source: &str, offset: usize) -> &str {
    let clamped = offset.min(source.len());
    let bytes = source.as_bytes();
    let start = bytes
        .get(..clamped)
        .and_then(|before| before.iter().rposition(|byte| *byte == b'\n'))
        .map_or(0, |index| index.saturating_add(1));
    let end = bytes
        .get(clamped..)
        .and_then(|after| after.iter().position(|byte| *byte == b'\n'))
        .map_or(source.len(), |index| clamped.saturating_add(index));
    source
        .get(start..end)
        .map(|line| line.trim_end_matches('\r'))
        .unwrap_or_default()
}

/// Converts one-based display coordinates back to a byte offset.
///
/// Coordinates past the end of `source` are clamped to its length.
#[must_use]
pub(crate) fn one_based_to_offset(source: &str, line: u32, column: u32) -> usize {
    let row = usize::try_from(line.saturating_sub(1)).unwrap_or(usize::MAX);
    let line_start = row.checked_sub(1).map_or(0, |newline| {
        source
            .match_indices('\n')
            .nth(newline)
            .map_or(source.len(), |(index, _)| index.saturating_add(1))
    });
    let column_offset = usize::try_from(column.saturating_sub(1)).unwrap_or(0);
    line_start.saturating_add(column_offset).min(source.len())
}

fn pos_to_u32(row: usize, column: usize) -> (u32, u32) {
    point_to_one_based(tree_sitter::Point { row, column })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const SOURCE: &str = "first\nsecond line\r\nthird";

    #[rstest]
    #[case(0, (1, 1))]
    #[case(3, (1, 4))]
    #[case(6, (2, 1))]
    #[case(13, (2, 8))]
    #[case(19, (3, 1))]
    #[case(999, (3, 6))]
    fn offsets_map_to_lines_and_columns(#[case] offset: usize, #[case] expected: (u32, u32)) {
        assert_eq!(offset_to_one_based(SOURCE, offset), expected);
    }

    #[rstest]
    #[case(1, 1, 0)]
    #[case(2, 8, 13)]
    #[case(3, 1, 19)]
    #[case(9, 9, 24)]
    fn coordinates_map_back_to_offsets(
        #[case] line: u32,
        #[case] column: u32,
        #[case] expected: usize,
    ) {
        assert_eq!(one_based_to_offset(SOURCE, line, column), expected);
    }

    #[rstest]
    #[case(0, "first")]
    #[case(8, "second line")]
    #[case(22, "third")]
    fn line_at_returns_whole_line(#[case] offset: usize, #[case] expected: &str) {
        assert_eq!(line_at(SOURCE, offset), expected);
    }
}
