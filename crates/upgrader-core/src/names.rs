//! Lexical class-name resolution for one PHP file.
//!
//! [`NameContext`] records the namespace scopes of a file, the class imports
//! visible in each scope, and the class-like declarations with their parents.
//! It resolves names the way PHP does at compile time; it is not a type
//! checker and knows nothing about other files.

use std::ops::Range;

use crate::parser::ParsedSource;

/// How a class reference was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Written with a leading `\`.
    FullyQualified(String),
    /// The first segment names an import of the enclosing scope.
    Imported {
        /// Resolved fully qualified name.
        fqn: String,
        /// Index of the import in [`NameContext::imports`].
        import: usize,
        /// True when the reference had more segments than the alias.
        qualified: bool,
    },
    /// Resolved against the enclosing namespace.
    Relative(String),
}

impl Resolution {
    /// Returns the fully qualified name, without a leading `\`.
    #[must_use]
    pub fn fqn(&self) -> &str {
        match self {
            Self::FullyQualified(fqn) | Self::Relative(fqn) | Self::Imported { fqn, .. } => fqn,
        }
    }
}

/// A class import (`use A\B as C;`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    /// The local alias the import introduces.
    pub alias: String,
    /// Fully qualified imported name, without a leading `\`.
    pub target: String,
    /// True when written with `as`.
    pub explicit_alias: bool,
    /// Byte range of the imported name in the source.
    pub name_range: Range<usize>,
    /// Prefix of a group import (`use A\{B, C};`), if any.
    pub group_prefix: Option<String>,
}

/// A class-like declaration (class, interface, trait or enum).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassScope {
    /// Byte range of the whole declaration.
    pub range: Range<usize>,
    /// Fully qualified name of the declaration.
    pub name: String,
    /// Fully qualified name of the `extends` target, for classes.
    pub parent: Option<String>,
}

#[derive(Debug, Clone)]
struct NamespaceScope {
    range: Range<usize>,
    namespace: String,
    imports: Vec<usize>,
}

/// Namespace, import and class declaration tables for one file.
#[derive(Debug, Clone)]
pub struct NameContext {
    scopes: Vec<NamespaceScope>,
    imports: Vec<Import>,
    classes: Vec<ClassScope>,
}

const CLASS_DECLARATIONS: &[&str] = &[
    "class_declaration",
    "interface_declaration",
    "trait_declaration",
    "enum_declaration",
];

impl NameContext {
    /// Builds the name tables for a parsed file.
    #[must_use]
    pub fn build(parsed: &ParsedSource) -> Self {
        let root = parsed.root_node();
        let mut context = Self {
            scopes: vec![NamespaceScope {
                range: 0..parsed.source().len(),
                namespace: String::new(),
                imports: Vec::new(),
            }],
            imports: Vec::new(),
            classes: Vec::new(),
        };

        let mut open_statement_scope: Option<usize> = None;
        let mut cursor = root.walk();
        for child in root.named_children(&mut cursor) {
            match child.kind() {
                "namespace_definition" => {
                    let namespace = child
                        .child_by_field_name("name")
                        .map(|name| normalise_name(parsed.text(name)))
                        .unwrap_or_default();
                    let body = child
                        .child_by_field_name("body")
                        .or_else(|| named_child_of_kind(child, "compound_statement"));

                    if let Some(scope) = open_statement_scope
                        .take()
                        .and_then(|previous| context.scopes.get_mut(previous))
                    {
                        scope.range.end = child.start_byte();
                    }

                    let range = if body.is_some() {
                        child.byte_range()
                    } else {
                        child.start_byte()..parsed.source().len()
                    };
                    context.scopes.push(NamespaceScope {
                        range,
                        namespace,
                        imports: Vec::new(),
                    });
                    let scope_index = context.scopes.len().saturating_sub(1);

                    match body {
                        Some(block) => {
                            let mut body_cursor = block.walk();
                            for statement in block.named_children(&mut body_cursor) {
                                if statement.kind() == "namespace_use_declaration" {
                                    context.collect_imports(parsed, statement, scope_index);
                                }
                            }
                        }
                        None => open_statement_scope = Some(scope_index),
                    }
                }
                "namespace_use_declaration" => {
                    let scope_index = open_statement_scope.unwrap_or(0);
                    context.collect_imports(parsed, child, scope_index);
                }
                _ => {}
            }
        }

        context.collect_classes(parsed);
        context
    }

    /// Returns every import of the file, in source order.
    #[must_use]
    pub fn imports(&self) -> &[Import] {
        &self.imports
    }

    /// Returns the import declared at exactly `name_range`, if any.
    #[must_use]
    pub fn import_at(&self, name_range: &Range<usize>) -> Option<(usize, &Import)> {
        self.imports
            .iter()
            .enumerate()
            .find(|(_, import)| import.name_range == *name_range)
    }

    /// Returns the namespace in effect at `offset` (empty for global code).
    #[must_use]
    pub fn namespace_at(&self, offset: usize) -> &str {
        self.scope_at(offset)
            .map(|scope| scope.namespace.as_str())
            .unwrap_or_default()
    }

    /// Returns the innermost class-like declaration containing `offset`.
    #[must_use]
    pub fn enclosing_class(&self, offset: usize) -> Option<&ClassScope> {
        self.classes
            .iter()
            .filter(|class| class.range.contains(&offset))
            .max_by_key(|class| class.range.start)
    }

    /// Resolves a class name as written at `offset`.
    ///
    /// Returns `None` for empty names and for `self`, `static` and `parent`,
    /// which denote a class only relative to the enclosing declaration; see
    /// [`Self::resolve_scope`].
    #[must_use]
    pub fn resolve_class(&self, written: &str, offset: usize) -> Option<Resolution> {
        let name = normalise_name(written);
        if name.is_empty() || is_relative_keyword(&name) {
            return None;
        }
        if let Some(fqn) = written.trim().strip_prefix('\\') {
            return Some(Resolution::FullyQualified(normalise_name(fqn)));
        }

        let namespace = self.namespace_at(offset);
        if let Some(rest) = strip_prefix_ignore_case(&name, "namespace\\") {
            return Some(Resolution::Relative(join(namespace, rest)));
        }

        let (first, rest) = name
            .split_once('\\')
            .map_or((name.as_str(), None), |(head, tail)| (head, Some(tail)));
        if let Some((index, import)) = self.visible_import(first, offset) {
            let fqn = rest.map_or_else(|| import.target.clone(), |tail| join(&import.target, tail));
            return Some(Resolution::Imported {
                fqn,
                import: index,
                qualified: rest.is_some(),
            });
        }

        Some(Resolution::Relative(join(namespace, &name)))
    }

    /// Resolves the receiver class of a static call or constant access.
    ///
    /// Handles `self`, `static` and `parent` through the enclosing class
    /// declaration, and everything else through [`Self::resolve_class`].
    #[must_use]
    pub fn resolve_scope(&self, written: &str, offset: usize) -> Option<String> {
        let name = normalise_name(written);
        if name.eq_ignore_ascii_case("self") || name.eq_ignore_ascii_case("static") {
            return self.enclosing_class(offset).map(|class| class.name.clone());
        }
        if name.eq_ignore_ascii_case("parent") {
            return self
                .enclosing_class(offset)
                .and_then(|class| class.parent.clone());
        }
        self.resolve_class(written, offset)
            .map(|resolution| resolution.fqn().to_owned())
    }

    fn scope_at(&self, offset: usize) -> Option<&NamespaceScope> {
        self.scopes
            .iter()
            .rev()
            .find(|scope| scope.range.contains(&offset) || scope.range.end == offset)
    }

    fn visible_import(&self, alias: &str, offset: usize) -> Option<(usize, &Import)> {
        let scope = self.scope_at(offset)?;
        scope.imports.iter().find_map(|index| {
            self.imports
                .get(*index)
                .filter(|import| import.alias.eq_ignore_ascii_case(alias))
                .map(|import| (*index, import))
        })
    }

    fn collect_imports(
        &mut self,
        parsed: &ParsedSource,
        declaration: tree_sitter::Node<'_>,
        scope_index: usize,
    ) {
        if has_child_of_kind(declaration, &["function", "const"]) {
            return;
        }

        let group = named_child_of_kind(declaration, "namespace_use_group");
        let (clause_parent, group_prefix) = group.map_or((declaration, None), |members| {
            let prefix = named_child_of_kind(declaration, "namespace_name")
                .map(|prefix| normalise_name(parsed.text(prefix)));
            (members, prefix)
        });

        let mut cursor = clause_parent.walk();
        for clause in clause_parent.named_children(&mut cursor) {
            if !matches!(
                clause.kind(),
                "namespace_use_clause" | "namespace_use_group_clause"
            ) || has_child_of_kind(clause, &["function", "const"])
            {
                continue;
            }
            let Some(import) = import_from_clause(parsed, clause, group_prefix.as_deref()) else {
                continue;
            };

            self.imports.push(import);
            let index = self.imports.len().saturating_sub(1);
            if let Some(scope) = self.scopes.get_mut(scope_index) {
                scope.imports.push(index);
            }
        }
    }

    fn collect_classes(&mut self, parsed: &ParsedSource) {
        let mut classes = Vec::new();
        for node in parsed.nodes() {
            if !CLASS_DECLARATIONS.contains(&node.kind()) {
                continue;
            }
            let Some(name) = node.child_by_field_name("name") else {
                continue;
            };
            let offset = node.start_byte();
            let fqn = join(self.namespace_at(offset), parsed.text(name).trim());
            let parent = (node.kind() == "class_declaration")
                .then(|| named_child_of_kind(node, "base_clause"))
                .flatten()
                .and_then(first_class_name)
                .and_then(|parent| {
                    self.resolve_class(parsed.text(parent), parent.start_byte())
                        .map(|resolution| resolution.fqn().to_owned())
                });

            classes.push(ClassScope {
                range: node.byte_range(),
                name: fqn,
                parent,
            });
        }
        self.classes = classes;
    }
}

fn import_from_clause(
    parsed: &ParsedSource,
    clause: tree_sitter::Node<'_>,
    group_prefix: Option<&str>,
) -> Option<Import> {
    let mut cursor = clause.walk();
    let named: Vec<tree_sitter::Node<'_>> = clause.named_children(&mut cursor).collect();
    let name_node = named
        .iter()
        .copied()
        .find(|node| matches!(node.kind(), "name" | "qualified_name" | "namespace_name"))?;

    let alias_node = clause
        .child_by_field_name("alias")
        .filter(|alias| alias.id() != name_node.id())
        .or_else(|| {
            named_child_of_kind(clause, "namespace_aliasing_clause")
                .and_then(|aliasing| named_child_of_kind(aliasing, "name"))
        })
        .or_else(|| {
            named
                .iter()
                .copied()
                .filter(|node| node.kind() == "name" && node.id() != name_node.id())
                .last()
        });

    let written = normalise_name(parsed.text(name_node));
    let target = group_prefix.map_or_else(|| written.clone(), |prefix| join(prefix, &written));
    let explicit_alias = alias_node.is_some();
    let alias = alias_node.map_or_else(
        || short_name(&target).to_owned(),
        |alias| parsed.text(alias).trim().to_owned(),
    );

    Some(Import {
        alias,
        target,
        explicit_alias,
        name_range: name_node.byte_range(),
        group_prefix: group_prefix.map(str::to_owned),
    })
}

/// Returns the last segment of a qualified name.
#[must_use]
pub fn short_name(name: &str) -> &str {
    name.rsplit('\\').next().unwrap_or(name)
}

/// Strips whitespace and a leading `\` from a written name.
#[must_use]
pub fn normalise_name(written: &str) -> String {
    let compact: String = written.chars().filter(|ch| !ch.is_whitespace()).collect();
    compact
        .strip_prefix('\\')
        .map_or_else(|| compact.clone(), str::to_owned)
}

fn join(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_owned()
    } else {
        format!("{namespace}\\{name}")
    }
}

fn is_relative_keyword(name: &str) -> bool {
    ["self", "static", "parent"]
        .iter()
        .any(|keyword| name.eq_ignore_ascii_case(keyword))
}

fn strip_prefix_ignore_case<'a>(name: &'a str, prefix: &str) -> Option<&'a str> {
    let head = name.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| name.get(prefix.len()..))
        .flatten()
}

pub(crate) fn named_child_of_kind<'t>(
    node: tree_sitter::Node<'t>,
    kind: &str,
) -> Option<tree_sitter::Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .find(|child| child.kind() == kind)
}

pub(crate) fn has_child_of_kind(node: tree_sitter::Node<'_>, kinds: &[&str]) -> bool {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .any(|child| kinds.contains(&child.kind()))
}

/// First `name` or `qualified_name` child of a node.
pub(crate) fn first_class_name(node: tree_sitter::Node<'_>) -> Option<tree_sitter::Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .find(|child| is_class_name_node(*child))
}

pub(crate) fn is_class_name_node(node: tree_sitter::Node<'_>) -> bool {
    matches!(node.kind(), "name" | "qualified_name")
}
