//! Located YAML scalars.
//!
//! The YAML rules need the byte range of each key and value in the original
//! text, which a deserialiser does not keep. Scalars are read from the
//! event stream of `saphyr-parser-bw`, whose spans map back to the source.
//! Only scalars whose text can be rewritten in place are reported: block
//! scalars (`|`, `>`) and quoted scalars that fold across lines or use
//! escapes other than `\\` and `\"` are skipped, never edited.

use std::ops::Range;

use saphyr_parser_bw::{Event, Marker, Parser, ScalarStyle as EventStyle, Span};
use tracing::debug;

/// How a scalar was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScalarStyle {
    Plain,
    SingleQuoted,
    DoubleQuoted,
}

impl ScalarStyle {
    const fn from_event(style: EventStyle) -> Option<Self> {
        match style {
            EventStyle::Plain => Some(Self::Plain),
            EventStyle::SingleQuoted => Some(Self::SingleQuoted),
            EventStyle::DoubleQuoted => Some(Self::DoubleQuoted),
            EventStyle::Literal | EventStyle::Folded => None,
        }
    }

    /// Bytes of quoting on each side of the content.
    const fn quote_width(self) -> usize {
        match self {
            Self::Plain => 0,
            Self::SingleQuoted | Self::DoubleQuoted => 1,
        }
    }
}

/// What a scalar is to its parent collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScalarRole {
    Key,
    Value,
    Item,
}

/// One scalar found in the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct YamlScalar {
    /// Byte range of the content, excluding quotes.
    pub span: Range<usize>,
    /// Unescaped value.
    pub value: String,
    pub style: ScalarStyle,
    pub role: ScalarRole,
    /// Number of mappings enclosing the scalar.
    pub depth: usize,
}

impl YamlScalar {
    /// Encodes `value` for this scalar's quoting style.
    pub(crate) fn encode(&self, value: &str) -> String {
        match self.style {
            ScalarStyle::Plain => value.to_owned(),
            ScalarStyle::SingleQuoted => value.replace('\'', "''"),
            ScalarStyle::DoubleQuoted => value.replace('\\', "\\\\").replace('"', "\\\""),
        }
    }
}

/// A collection that is still open in the event stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    Mapping { awaiting_key: bool },
    Sequence,
}

/// Tracks the role of the next node from the open collections.
#[derive(Debug, Default)]
struct Nesting {
    frames: Vec<Frame>,
}

impl Nesting {
    /// Role of the node starting now; moves a mapping on to its next slot.
    fn next_role(&mut self) -> ScalarRole {
        match self.frames.last_mut() {
            Some(Frame::Mapping { awaiting_key }) => {
                let role = if *awaiting_key {
                    ScalarRole::Key
                } else {
                    ScalarRole::Value
                };
                *awaiting_key = !*awaiting_key;
                role
            }
            Some(Frame::Sequence) => ScalarRole::Item,
            None => ScalarRole::Value,
        }
    }

    fn open(&mut self, frame: Frame) {
        self.next_role();
        self.frames.push(frame);
    }

    fn close(&mut self) {
        self.frames.pop();
    }

    fn mapping_depth(&self) -> usize {
        self.frames
            .iter()
            .filter(|frame| matches!(frame, Frame::Mapping { .. }))
            .count()
    }
}

/// Scans every document of `source` for editable scalars, in document order.
///
/// Text that fails to parse yields no scalars.
pub(crate) fn scan(source: &str) -> Vec<YamlScalar> {
    let mut scalars = Vec::new();
    let mut nesting = Nesting::default();

    for next in Parser::new_from_str(source) {
        let (event, span) = match next {
            Ok(pair) => pair,
            Err(error) => {
                debug!(%error, "yaml scan stopped");
                return Vec::new();
            }
        };
        match event {
            Event::MappingStart(..) => nesting.open(Frame::Mapping { awaiting_key: true }),
            Event::SequenceStart(..) => nesting.open(Frame::Sequence),
            Event::MappingEnd | Event::SequenceEnd => nesting.close(),
            Event::Alias(_) => {
                nesting.next_role();
            }
            Event::Scalar(value, style, ..) => {
                let role = nesting.next_role();
                let located = ScalarStyle::from_event(style).and_then(|scalar_style| {
                    locate(source, &span, scalar_style).map(|range| YamlScalar {
                        span: range,
                        value: value.into_owned(),
                        style: scalar_style,
                        role,
                        depth: nesting.mapping_depth(),
                    })
                });
                if let Some(scalar) = located.filter(|scalar| is_verbatim(source, scalar)) {
                    scalars.push(scalar);
                }
            }
            Event::Nothing
            | Event::StreamStart
            | Event::StreamEnd
            | Event::DocumentStart(_)
            | Event::DocumentEnd => {}
        }
    }
    scalars
}

/// Byte range of a scalar's content, quotes stripped.
fn locate(source: &str, span: &Span, style: ScalarStyle) -> Option<Range<usize>> {
    let start = byte_position(source, &span.start)?;
    let end = byte_position(source, &span.end)?;
    let width = style.quote_width();
    let content_start = start.checked_add(width)?;
    let content_end = end.checked_sub(width)?;
    (content_start <= content_end).then_some(content_start..content_end)
}

/// Byte offset of `marker`, derived from its character index when the
/// input did not record one.
fn byte_position(source: &str, marker: &Marker) -> Option<usize> {
    marker.byte_offset().or_else(|| {
        source
            .char_indices()
            .map(|(offset, _)| offset)
            .chain(std::iter::once(source.len()))
            .nth(marker.index())
    })
}

/// True when re-encoding the value reproduces the source text, so the span
/// can be replaced without touching folding or escapes.
fn is_verbatim(source: &str, scalar: &YamlScalar) -> bool {
    !scalar.value.is_empty()
        && source
            .get(scalar.span.clone())
            .is_some_and(|raw| raw == scalar.encode(&scalar.value))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn summary(source: &str) -> Vec<(ScalarRole, String, String)> {
        scan(source)
            .into_iter()
            .map(|scalar| {
                let raw = source.get(scalar.span.clone()).unwrap_or_default().to_owned();
                (scalar.role, scalar.value, raw)
            })
            .collect()
    }

    fn entry(role: ScalarRole, value: &str, raw: &str) -> (ScalarRole, String, String) {
        (role, value.to_owned(), raw.to_owned())
    }

    #[test]
    fn finds_keys_values_and_items() {
        let source = "---\nName: app\n---\nOld\\Thing:\n  class: 'Old\\Other'\n  extensions:\n    - Old\\Ext # note\n  list: [A\\B, \"C\\\\D\"]\n";

        let found = summary(source);

        assert_eq!(
            found,
            vec![
                entry(ScalarRole::Key, "Name", "Name"),
                entry(ScalarRole::Value, "app", "app"),
                entry(ScalarRole::Key, "Old\\Thing", "Old\\Thing"),
                entry(ScalarRole::Key, "class", "class"),
                entry(ScalarRole::Value, "Old\\Other", "Old\\Other"),
                entry(ScalarRole::Key, "extensions", "extensions"),
                entry(ScalarRole::Item, "Old\\Ext", "Old\\Ext"),
                entry(ScalarRole::Key, "list", "list"),
                entry(ScalarRole::Item, "A\\B", "A\\B"),
                entry(ScalarRole::Item, "C\\D", "C\\\\D"),
            ]
        );
    }

    #[test]
    fn skips_block_scalars_and_comments() {
        let source = "# Old\\Thing: x\nbody: |\n  Old\\Thing: not a key\nnext: value\n";

        let found = summary(source);

        assert_eq!(
            found,
            vec![
                entry(ScalarRole::Key, "body", "body"),
                entry(ScalarRole::Key, "next", "next"),
                entry(ScalarRole::Value, "value", "value"),
            ]
        );
    }

    #[test]
    fn records_mapping_depth_of_keys() {
        let source = "en:\n  Old\\Page:\n    TITLE: Title\n";

        let depths: Vec<(String, usize)> = scan(source)
            .into_iter()
            .filter(|scalar| scalar.role == ScalarRole::Key)
            .map(|scalar| (scalar.value, scalar.depth))
            .collect();

        assert_eq!(
            depths,
            vec![
                ("en".to_owned(), 1),
                ("Old\\Page".to_owned(), 2),
                ("TITLE".to_owned(), 3),
            ]
        );
    }

    #[test]
    fn sequence_items_may_hold_mappings() {
        let found = summary("- class: Old\\Thing\n");

        assert_eq!(
            found,
            vec![
                entry(ScalarRole::Key, "class", "class"),
                entry(ScalarRole::Value, "Old\\Thing", "Old\\Thing"),
            ]
        );
    }

    #[test]
    fn value_on_the_following_line_is_located() {
        let source = "Injector:\n  Logger:\n    class:\n      Old\\Thing\n";

        let found = summary(source);

        assert_eq!(
            found.last(),
            Some(&entry(ScalarRole::Value, "Old\\Thing", "Old\\Thing"))
        );
    }

    #[test]
    fn multi_line_flow_sequences_are_located() {
        let source = "list: [\n    Old\\Thing,\n    'Old\\Ext'\n  ]\n";

        let found = summary(source);

        assert_eq!(
            found,
            vec![
                entry(ScalarRole::Key, "list", "list"),
                entry(ScalarRole::Item, "Old\\Thing", "Old\\Thing"),
                entry(ScalarRole::Item, "Old\\Ext", "Old\\Ext"),
            ]
        );
    }

    #[test]
    fn offsets_survive_multibyte_text() {
        let source = "títle: 'Ünïcode'\nclass: Old\\Thing\n";

        let found = summary(source);

        assert_eq!(
            found.last(),
            Some(&entry(ScalarRole::Value, "Old\\Thing", "Old\\Thing"))
        );
    }

    #[rstest]
    #[case::folded_plain("key: Old\n  Thing\n")]
    #[case::escaped_newline("key: \"Old\\nThing\"\n")]
    #[case::folded_quotes("key: 'Old\n  Thing'\n")]
    fn rewritten_text_must_match_the_source(#[case] source: &str) {
        let values: Vec<String> = scan(source)
            .into_iter()
            .filter(|scalar| scalar.role == ScalarRole::Value)
            .map(|scalar| scalar.value)
            .collect();

        assert!(values.is_empty(), "unexpected values: {values:?}");
    }

    #[test]
    fn malformed_yaml_yields_nothing() {
        assert!(scan("key: [unclosed\nother: 'x\n").is_empty());
    }

    #[test]
    fn byte_positions_fall_back_to_character_indices() {
        let source = "é: Old\\Thing";
        let marker = Marker::new(3, 1, 3);

        assert_eq!(byte_position(source, &marker), Some(4));
    }
}
