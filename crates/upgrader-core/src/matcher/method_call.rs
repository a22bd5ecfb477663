//! Method call and declaration matching for API change specs.
//!
//! Only statically known targets match. A call whose member name is computed
//! (`$obj->$name()`), or a static call on a variable class (`$class::run()`),
//! never matches any spec.

use std::ops::Range;

use crate::matcher::signature::{ApiChangeSpec, SignatureTarget};
use crate::names::NameContext;
use crate::parser::ParsedSource;

/// A spec matched at one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodMatch<'s> {
    /// The spec that applies.
    pub spec: &'s ApiChangeSpec,
    /// Byte range of the method name token.
    pub name: Range<usize>,
}

/// The callable a node refers to, as far as the source text tells.
#[derive(Debug)]
enum Callee {
    /// `$this->name()` inside a class, or a method declared in that class.
    OwnMethod { class: Option<String> },
    /// `Class::name()` with a literal or relative scope.
    Static { class: Option<String> },
    /// Any other instance call (`$obj->name()`).
    Instance,
    /// A free function declaration.
    Function,
}

/// Matches nodes against a list of API change specs.
#[derive(Debug, Clone, Copy)]
pub struct MethodCallMatcher<'s> {
    specs: &'s [ApiChangeSpec],
}

impl<'s> MethodCallMatcher<'s> {
    /// Creates a matcher over `specs`.
    #[must_use]
    pub const fn new(specs: &'s [ApiChangeSpec]) -> Self {
        Self { specs }
    }

    /// Returns the spec matching `node`, if any.
    ///
    /// When both a class-qualified and a bare spec match, the qualified one
    /// wins. Among specs of equal rank the first configured applies.
    #[must_use]
    pub fn match_node(
        &self,
        node: tree_sitter::Node<'_>,
        parsed: &ParsedSource,
        names: &NameContext,
    ) -> Option<MethodMatch<'s>> {
        let (name_node, callee) = callee_of(node, parsed, names)?;
        let method = parsed.text(name_node);

        let mut candidates = self
            .specs
            .iter()
            .filter(|spec| spec.target().method().eq_ignore_ascii_case(method))
            .filter(|spec| target_matches(spec.target(), &callee));
        let first = candidates.next()?;
        let spec = if first.target().is_qualified() {
            first
        } else {
            candidates
                .find(|spec| spec.target().is_qualified())
                .unwrap_or(first)
        };

        Some(MethodMatch {
            spec,
            name: name_node.byte_range(),
        })
    }
}

fn callee_of<'t>(
    node: tree_sitter::Node<'t>,
    parsed: &ParsedSource,
    names: &NameContext,
) -> Option<(tree_sitter::Node<'t>, Callee)> {
    let name = node.child_by_field_name("name")?;
    if name.kind() != "name" {
        return None;
    }
    let offset = node.start_byte();

    let callee = match node.kind() {
        "member_call_expression" | "nullsafe_member_call_expression" => {
            let object = node.child_by_field_name("object")?;
            if object.kind() == "variable_name" && parsed.text(object).trim() == "$this" {
                Callee::OwnMethod {
                    class: names.enclosing_class(offset).map(|class| class.name.clone()),
                }
            } else {
                Callee::Instance
            }
        }
        "scoped_call_expression" => {
            let scope = node.child_by_field_name("scope")?;
            if !matches!(
                scope.kind(),
                "name" | "qualified_name" | "relative_name" | "relative_scope"
            ) {
                return None;
            }
            Callee::Static {
                class: names.resolve_scope(parsed.text(scope), offset),
            }
        }
        "method_declaration" => Callee::OwnMethod {
            class: names.enclosing_class(offset).map(|class| class.name.clone()),
        },
        "function_definition" => Callee::Function,
        _ => return None,
    };
    Some((name, callee))
}

fn target_matches(target: &SignatureTarget, callee: &Callee) -> bool {
    match (target, callee) {
        (SignatureTarget::Bare { .. }, _) => true,
        (SignatureTarget::Static { class, .. }, Callee::Static { class: Some(found) })
        | (
            SignatureTarget::Static { class, .. } | SignatureTarget::Instance { class, .. },
            Callee::OwnMethod { class: Some(found) },
        ) => class.eq_ignore_ascii_case(found),
        _ => false,
    }
}
