//! PHP string literal decoding.
//!
//! Only literals whose value is fully known from the source text are
//! decoded: interpolated double-quoted strings, heredocs and escapes that
//! change the byte content (such as `\n`) are rejected.

use std::ops::Range;

/// Quoting style of a PHP string literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quote {
    /// `'...'`
    Single,
    /// `"..."`
    Double,
}

/// A decoded, non-interpolated string literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringLiteral {
    /// Byte range of the content between the quotes.
    pub content: Range<usize>,
    /// Decoded value.
    pub value: String,
    /// Quoting style.
    pub quote: Quote,
    /// True when the source spelled namespace separators as `\\`.
    pub doubled_separators: bool,
}

impl StringLiteral {
    /// Decodes a `string` or `encapsed_string` node.
    #[must_use]
    pub fn from_node(node: tree_sitter::Node<'_>, source: &str) -> Option<Self> {
        if !matches!(node.kind(), "string" | "encapsed_string") {
            return None;
        }
        let raw = source.get(node.byte_range())?;
        let quote = match raw.chars().next()? {
            '\'' => Quote::Single,
            '"' => Quote::Double,
            _ => return None,
        };
        if raw.len() < 2 || !raw.ends_with(raw.get(..1)?) {
            return None;
        }
        let inner = raw.get(1..raw.len().saturating_sub(1))?;
        let start = node.start_byte().saturating_add(1);
        let value = decode(inner, quote)?;

        Some(Self {
            content: start..start.saturating_add(inner.len()),
            value,
            quote,
            doubled_separators: inner.contains("\\\\"),
        })
    }

    /// Encodes `value` so it can replace part of this literal's content.
    #[must_use]
    pub fn encode(&self, value: &str) -> String {
        let separators = if self.doubled_separators {
            value.replace('\\', "\\\\")
        } else {
            value.to_owned()
        };
        match self.quote {
            Quote::Single => separators.replace('\'', "\\'"),
            Quote::Double => separators.replace('"', "\\\"").replace('$', "\\$"),
        }
    }
}

fn decode(inner: &str, quote: Quote) -> Option<String> {
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(ch) = chars.next() {
        match (ch, quote) {
            ('$', Quote::Double) => return None,
            ('\\', Quote::Single) => match chars.peek() {
                Some('\\' | '\'') => out.extend(chars.next()),
                _ => out.push('\\'),
            },
            ('\\', Quote::Double) => match chars.peek() {
                Some('\\') => out.extend(chars.next()),
                Some('"') => out.extend(chars.next()),
                Some('n' | 'r' | 't' | 'v' | 'e' | 'f' | '$' | 'x' | 'u' | '0'..='7') => {
                    return None;
                }
                _ => out.push('\\'),
            },
            _ => out.push(ch),
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ParsedSource;
    use rstest::rstest;

    fn literal(php_expression: &str) -> Option<StringLiteral> {
        let source = format!("<?php\n$x = {php_expression};\n");
        let parsed = ParsedSource::parse(&source).expect("parse");
        parsed
            .nodes()
            .into_iter()
            .find(|node| matches!(node.kind(), "string" | "encapsed_string"))
            .and_then(|node| StringLiteral::from_node(node, parsed.source()))
    }

    #[rstest]
    #[case("'Vendor\\Page'", "Vendor\\Page")]
    #[case("'Vendor\\\\Page'", "Vendor\\Page")]
    #[case("\"Vendor\\\\Page\"", "Vendor\\Page")]
    #[case("\"Vendor\\Page\"", "Vendor\\Page")]
    #[case("'it\\'s'", "it's")]
    fn decodes_static_literals(#[case] expression: &str, #[case] expected: &str) {
        let decoded = literal(expression).expect("decodes");
        assert_eq!(decoded.value, expected);
    }

    #[rstest]
    #[case("\"Hello $name\"")]
    #[case("\"line\\n\"")]
    fn rejects_dynamic_literals(#[case] expression: &str) {
        assert_eq!(literal(expression), None);
    }

    #[test]
    fn encode_preserves_separator_style() {
        let doubled = literal("'A\\\\B'").expect("decodes");
        assert_eq!(doubled.encode("C\\D"), "C\\\\D");

        let single = literal("'A\\B'").expect("decodes");
        assert_eq!(single.encode("C\\D"), "C\\D");
    }
}
