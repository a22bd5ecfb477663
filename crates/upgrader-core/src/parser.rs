//! PHP parsing.
//!
//! A [`ParsedSource`] owns the text it was built from, so every node of its
//! tree maps back to exact bytes of the original file. Rules only ever read
//! the tree; edits are queued against byte ranges of that text.

use std::ops::Range;

use tree_sitter::Node;

use crate::error::UpgradeError;
use crate::language::SourceKind;
use crate::position::point_to_one_based;

/// Longest excerpt quoted in a syntax error message.
const EXCERPT_CHARS: usize = 40;

/// One PHP file and its syntax tree.
///
/// Tree-sitter recovers from errors, so a tree may hold ERROR or MISSING
/// nodes. The upgrader leaves such files alone.
#[derive(Debug)]
pub struct ParsedSource {
    tree: tree_sitter::Tree,
    source: String,
}

impl ParsedSource {
    /// Parses `source` with a fresh [`PhpParser`].
    ///
    /// # Errors
    ///
    /// Returns [`UpgradeError::ParserInit`] when no tree can be produced.
    /// Syntax errors inside the tree are reported by [`Self::errors`].
    pub fn parse(source: &str) -> Result<Self, UpgradeError> {
        PhpParser::new()?.parse(source)
    }

    /// The text the tree was built from.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The `program` node.
    #[must_use]
    pub fn root_node(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// The text covered by `node`.
    #[must_use]
    pub fn text(&self, node: Node<'_>) -> &str {
        self.source.get(node.byte_range()).unwrap_or_default()
    }

    /// True when recovery inserted ERROR or MISSING nodes.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.root_node().has_error()
    }

    /// Outermost ERROR and MISSING nodes, in document order.
    #[must_use]
    pub fn errors(&self) -> Vec<SyntaxErrorInfo> {
        if !self.has_errors() {
            return Vec::new();
        }
        let mut found: Vec<SyntaxErrorInfo> = Vec::new();
        for node in self.nodes() {
            if !(node.is_error() || node.is_missing()) {
                continue;
            }
            let nested = found.last().is_some_and(|outer| {
                node.start_byte() >= outer.span.start && node.end_byte() <= outer.span.end
            });
            if !nested {
                found.push(SyntaxErrorInfo::at(node, &self.source));
            }
        }
        found
    }

    /// Every node of the tree in document (pre-)order.
    #[must_use]
    pub fn nodes(&self) -> Vec<Node<'_>> {
        let mut nodes = Vec::new();
        let mut cursor = self.tree.walk();
        loop {
            nodes.push(cursor.node());
            if cursor.goto_first_child() {
                continue;
            }
            loop {
                if cursor.goto_next_sibling() {
                    break;
                }
                if !cursor.goto_parent() {
                    return nodes;
                }
            }
        }
    }
}

/// Where and why a PHP file failed to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxErrorInfo {
    /// Bytes covered by the offending node.
    pub span: Range<usize>,
    /// One-based line of the node's start.
    pub line: u32,
    /// One-based column of the node's start.
    pub column: u32,
    /// What went wrong, quoting the source where possible.
    pub message: String,
}

impl SyntaxErrorInfo {
    fn at(node: Node<'_>, source: &str) -> Self {
        let (line, column) = point_to_one_based(node.start_position());
        let message = if node.is_missing() {
            format!("expected {}", node.kind())
        } else {
            let excerpt: String = source
                .get(node.byte_range())
                .unwrap_or_default()
                .chars()
                .take(EXCERPT_CHARS)
                .collect();
            format!("unexpected '{}'", excerpt.trim())
        };
        Self {
            span: node.byte_range(),
            line,
            column,
            message,
        }
    }
}

/// A reusable Tree-sitter parser for PHP.
pub struct PhpParser {
    parser: tree_sitter::Parser,
}

impl PhpParser {
    /// Loads the PHP grammar.
    ///
    /// # Errors
    ///
    /// Returns [`UpgradeError::ParserInit`] when the grammar does not match
    /// the linked Tree-sitter runtime.
    pub fn new() -> Result<Self, UpgradeError> {
        let language = SourceKind::Php
            .tree_sitter_language()
            .ok_or_else(|| UpgradeError::parser_init("no grammar for php"))?;
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&language)
            .map_err(|error| UpgradeError::parser_init(error.to_string()))?;
        Ok(Self { parser })
    }

    /// Parses one file.
    ///
    /// # Errors
    ///
    /// Returns [`UpgradeError::ParserInit`] when Tree-sitter yields no tree.
    pub fn parse(&mut self, source: &str) -> Result<ParsedSource, UpgradeError> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| UpgradeError::parser_init("parsing produced no tree"))?;
        Ok(ParsedSource {
            tree,
            source: source.to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("<?php\nclass A {}\n")]
    #[case("<?php\nnamespace App;\nuse Foo\\Bar;\n$x = Bar::make();\n")]
    #[case("<html><?php echo 1; ?></html>")]
    fn well_formed_php_has_no_errors(#[case] source: &str) {
        let parsed = ParsedSource::parse(source).expect("parse");

        assert!(parsed.errors().is_empty());
        assert_eq!(parsed.source(), source);
    }

    #[rstest]
    #[case("<?php\nclass A {\n")]
    #[case("<?php\nfunction broken( {\n")]
    fn malformed_php_reports_errors(#[case] source: &str) {
        let parsed = ParsedSource::parse(source).expect("parse");

        assert!(parsed.has_errors());
        assert!(!parsed.errors().is_empty());
    }

    #[test]
    fn errors_carry_a_position_past_the_open_tag() {
        let parsed = ParsedSource::parse("<?php\nfunction f() {\n    $x = ;\n}\n").expect("parse");

        let error = parsed.errors().into_iter().next().expect("has error");

        assert!(error.line >= 2);
        assert!(error.column >= 1);
        assert!(!error.message.is_empty());
    }

    #[test]
    fn nodes_are_in_document_order() {
        let parsed = ParsedSource::parse("<?php\nA::b();\nC::d();\n").expect("parse");

        let starts: Vec<usize> = parsed.nodes().iter().map(Node::start_byte).collect();
        let mut sorted = starts.clone();
        sorted.sort_unstable();
        assert_eq!(starts, sorted);
        assert_eq!(starts.first(), Some(&0));
    }

    #[test]
    fn text_returns_node_source() {
        let parsed = ParsedSource::parse("<?php\nA::b();\n").expect("parse");

        let scoped = parsed
            .nodes()
            .into_iter()
            .find(|node| node.kind() == "scoped_call_expression")
            .expect("call");

        assert_eq!(parsed.text(scoped), "A::b()");
    }
}
