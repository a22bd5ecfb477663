//! Class name occurrence matching.
//!
//! [`ClassNameMatcher`] recognises the syntactic positions in which a PHP
//! class name can appear and resolves the written name through the file's
//! [`NameContext`]. Partial names are never produced: an occurrence always
//! covers a complete `name`, `qualified_name` or `relative_name` node.

use std::ops::Range;

use crate::names::{NameContext, Resolution, normalise_name};
use crate::parser::ParsedSource;

const DECLARATION_KINDS: &[&str] = &[
    "class_declaration",
    "interface_declaration",
    "trait_declaration",
    "enum_declaration",
];

/// Parents under which a name node always denotes a class.
const REFERENCE_PARENTS: &[&str] = &[
    "base_clause",
    "class_interface_clause",
    "named_type",
    "object_creation_expression",
    "attribute",
    "use_declaration",
    "type_list",
];

/// Parents whose scope child denotes a class.
const SCOPE_PARENTS: &[&str] = &[
    "scoped_call_expression",
    "scoped_property_access_expression",
    "class_constant_access_expression",
];

/// One class name occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassOccurrence {
    /// The name token of a class-like declaration.
    Declaration {
        /// Byte range of the name token.
        range: Range<usize>,
        /// Fully qualified name of the declared class.
        fqn: String,
    },
    /// The imported name of a `use` clause.
    Import {
        /// Byte range of the imported name.
        range: Range<usize>,
        /// Index into [`NameContext::imports`].
        index: usize,
    },
    /// A reference to a class in code.
    Reference {
        /// Byte range of the written name.
        range: Range<usize>,
        /// How the written name resolved.
        resolution: Resolution,
    },
}

impl ClassOccurrence {
    /// Byte range of the occurrence.
    #[must_use]
    pub fn range(&self) -> Range<usize> {
        match self {
            Self::Declaration { range, .. }
            | Self::Import { range, .. }
            | Self::Reference { range, .. } => range.clone(),
        }
    }
}

/// Finds class name occurrences in a parsed PHP file.
#[derive(Debug, Clone, Copy)]
pub struct ClassNameMatcher<'a> {
    parsed: &'a ParsedSource,
    names: &'a NameContext,
}

impl<'a> ClassNameMatcher<'a> {
    /// Creates a matcher for one file.
    #[must_use]
    pub const fn new(parsed: &'a ParsedSource, names: &'a NameContext) -> Self {
        Self { parsed, names }
    }

    /// Returns the occurrence rooted at `node`, if it is one.
    #[must_use]
    pub fn match_node(&self, node: tree_sitter::Node<'_>) -> Option<ClassOccurrence> {
        let kind = node.kind();
        if DECLARATION_KINDS.contains(&kind) {
            return self.declaration(node);
        }
        if matches!(kind, "namespace_use_clause" | "namespace_use_group_clause") {
            return self.import(node);
        }
        if matches!(kind, "name" | "qualified_name" | "relative_name") && is_reference(node) {
            let written = self.parsed.text(node);
            let resolution = self.names.resolve_class(written, node.start_byte())?;
            return Some(ClassOccurrence::Reference {
                range: node.byte_range(),
                resolution,
            });
        }
        None
    }

    /// Resolves a name written outside the tree, such as in a doc comment.
    #[must_use]
    pub fn resolve_text(&self, written: &str, range: Range<usize>) -> Option<ClassOccurrence> {
        let resolution = self.names.resolve_class(written, range.start)?;
        Some(ClassOccurrence::Reference { range, resolution })
    }

    fn declaration(&self, node: tree_sitter::Node<'_>) -> Option<ClassOccurrence> {
        let name = node.child_by_field_name("name")?;
        let short = normalise_name(self.parsed.text(name));
        let namespace = self.names.namespace_at(node.start_byte());
        let fqn = if namespace.is_empty() {
            short
        } else {
            format!("{namespace}\\{short}")
        };
        Some(ClassOccurrence::Declaration {
            range: name.byte_range(),
            fqn,
        })
    }

    fn import(&self, clause: tree_sitter::Node<'_>) -> Option<ClassOccurrence> {
        let mut cursor = clause.walk();
        let name = clause
            .named_children(&mut cursor)
            .find(|child| matches!(child.kind(), "name" | "qualified_name" | "namespace_name"))?;
        let range = name.byte_range();
        let (index, _) = self.names.import_at(&range)?;
        Some(ClassOccurrence::Import { range, index })
    }
}

fn is_reference(node: tree_sitter::Node<'_>) -> bool {
    let Some(parent) = node.parent() else {
        return false;
    };
    let parent_kind = parent.kind();
    if REFERENCE_PARENTS.contains(&parent_kind) {
        return true;
    }
    if SCOPE_PARENTS.contains(&parent_kind) {
        let scope = parent
            .child_by_field_name("scope")
            .or_else(|| parent.named_child(0));
        return scope.is_some_and(|found| found.id() == node.id());
    }
    if parent_kind == "binary_expression" {
        let is_instanceof = parent
            .child_by_field_name("operator")
            .is_some_and(|operator| operator.kind() == "instanceof");
        let is_right = parent
            .child_by_field_name("right")
            .is_some_and(|right| right.id() == node.id());
        return is_instanceof && is_right;
    }
    false
}
