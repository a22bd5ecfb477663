//! Translation entity renames.
//!
//! Translation keys are written `Entity.KEY`, where the entity is usually a
//! class name. When a class is renamed its translation entity moves with it,
//! in PHP `_t()` calls, in language YAML files and in template tags alike.

use std::sync::Arc;

use regex::Regex;
use tracing::debug;

use super::yaml_text::{self, ScalarRole};
use super::{RuleInput, RuleParameters};
use crate::error::UpgradeError;
use crate::matcher::StringLiteral;
use crate::names::{named_child_of_kind, normalise_name, short_name};
use crate::parser::ParsedSource;
use crate::source::MutableSource;
use crate::warning::Warning;

/// Splits `Entity.KEY` at the last dot and renames the entity.
fn renamed_key(parameters: &RuleParameters, key: &str) -> Option<String> {
    let (entity, rest) = key.rsplit_once('.')?;
    let new = parameters.renamed(entity)?;
    Some(format!("{new}.{rest}"))
}

/// Renames the entity of `_t()` and `i18n::_t()` keys in PHP code.
#[derive(Debug, Clone)]
pub struct RenameTranslateKeys {
    parameters: Arc<RuleParameters>,
}

impl RenameTranslateKeys {
    /// Creates the rule.
    #[must_use]
    pub const fn new(parameters: Arc<RuleParameters>) -> Self {
        Self { parameters }
    }

    pub(super) fn apply(&self, input: &RuleInput<'_>, buffer: &mut MutableSource) -> Vec<Warning> {
        let Some(php) = input.php else {
            return Vec::new();
        };
        let parsed = php.parsed();
        for node in parsed.nodes() {
            if !is_translate_call(node, parsed) {
                continue;
            }
            let Some(literal) = first_string_argument(node, parsed) else {
                continue;
            };
            if let Some(key) = renamed_key(&self.parameters, &literal.value) {
                buffer.replace_range(literal.content.clone(), literal.encode(&key));
            }
        }
        Vec::new()
    }
}

fn is_translate_call(node: tree_sitter::Node<'_>, parsed: &ParsedSource) -> bool {
    match node.kind() {
        "function_call_expression" => node
            .child_by_field_name("function")
            .is_some_and(|function| normalise_name(parsed.text(function)) == "_t"),
        "scoped_call_expression" => {
            let is_t = node
                .child_by_field_name("name")
                .is_some_and(|name| parsed.text(name) == "_t");
            let is_i18n = node.child_by_field_name("scope").is_some_and(|scope| {
                short_name(&normalise_name(parsed.text(scope))).eq_ignore_ascii_case("i18n")
            });
            is_t && is_i18n
        }
        _ => false,
    }
}

fn first_string_argument(
    node: tree_sitter::Node<'_>,
    parsed: &ParsedSource,
) -> Option<StringLiteral> {
    let arguments = node.child_by_field_name("arguments")?;
    let argument = named_child_of_kind(arguments, "argument")?;
    let mut cursor = argument.walk();
    let value = argument.named_children(&mut cursor).last()?;
    StringLiteral::from_node(value, parsed.source())
}

/// Renames entity keys of language YAML files.
///
/// Entities sit one level below the locale key:
///
/// ```yaml
/// en:
///   Vendor\Page:
///     TITLE: Title
/// ```
#[derive(Debug, Clone)]
pub struct RenameLangYamlKeys {
    parameters: Arc<RuleParameters>,
}

impl RenameLangYamlKeys {
    /// Creates the rule.
    #[must_use]
    pub const fn new(parameters: Arc<RuleParameters>) -> Self {
        Self { parameters }
    }

    pub(super) fn apply(&self, input: &RuleInput<'_>, buffer: &mut MutableSource) -> Vec<Warning> {
        let keys: Vec<_> = yaml_text::scan(input.source)
            .into_iter()
            .filter(|scalar| scalar.role == ScalarRole::Key)
            .collect();
        let Some(entity_depth) = keys
            .iter()
            .map(|scalar| scalar.depth)
            .filter(|depth| *depth > 1)
            .min()
        else {
            return Vec::new();
        };

        for key in keys.iter().filter(|key| key.depth == entity_depth) {
            if let Some(new) = self.parameters.renamed(&key.value) {
                buffer.replace_range(key.span.clone(), key.encode(new));
            }
        }
        Vec::new()
    }
}

/// Renames entities in template translation tags: `<%t Entity.KEY ... %>`
/// and `<% _t('Entity.KEY' ... %>`.
#[derive(Debug, Clone)]
pub struct RenameTemplateLangKeys {
    parameters: Arc<RuleParameters>,
    tags: Regex,
}

const TEMPLATE_TAG_PATTERN: &str = r#"<%(?:t[ \t]+|[ \t]*_t\([ \t]*['"])([A-Za-z_][A-Za-z0-9_\\]*\.[A-Za-z0-9_.]+)"#;

impl RenameTemplateLangKeys {
    /// Creates the rule.
    ///
    /// # Errors
    ///
    /// Returns [`UpgradeError::Configuration`] if the tag pattern fails to
    /// compile.
    pub fn new(parameters: Arc<RuleParameters>) -> Result<Self, UpgradeError> {
        let tags = Regex::new(TEMPLATE_TAG_PATTERN).map_err(|e| {
            UpgradeError::configuration(format!("invalid template tag pattern: {e}"))
        })?;
        Ok(Self { parameters, tags })
    }

    pub(super) fn apply(&self, input: &RuleInput<'_>, buffer: &mut MutableSource) -> Vec<Warning> {
        let mut renamed = 0_usize;
        for captures in self.tags.captures_iter(input.source) {
            let Some(key) = captures.get(1) else {
                continue;
            };
            let doubled = key.as_str().contains("\\\\");
            let written = if doubled {
                key.as_str().replace("\\\\", "\\")
            } else {
                key.as_str().to_owned()
            };
            let Some(new) = renamed_key(&self.parameters, &written) else {
                continue;
            };
            let encoded = if doubled { new.replace('\\', "\\\\") } else { new };
            buffer.replace_range(key.range(), encoded);
            renamed = renamed.saturating_add(1);
        }
        debug!(path = %input.path.display(), renamed, "renamed template keys");
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use rstest::rstest;

    use super::*;
    use crate::language::SourceKind;
    use crate::rules::{ParsedPhp, UpgradeRule};

    fn parameters() -> Arc<RuleParameters> {
        Arc::new(RuleParameters::new().with_mapping("Old\\Page", "New\\Page"))
    }

    fn run(rule: &UpgradeRule, path: &str, source: &str) -> String {
        let kind = SourceKind::from_path(Path::new(path)).expect("known kind");
        let php = (kind == SourceKind::Php)
            .then(|| ParsedPhp::new(ParsedSource::parse(source).expect("parse")));
        let input = RuleInput {
            path: Path::new(path),
            kind,
            source,
            php: php.as_ref(),
        };
        let mut buffer = MutableSource::new(source);
        assert!(rule.apply(&input, &mut buffer).is_empty());
        buffer.render().expect("render")
    }

    #[rstest]
    #[case("_t('Old\\Page.TITLE', 'Title')", "_t('New\\Page.TITLE', 'Title')")]
    #[case("_t(\"Old\\\\Page.TITLE\")", "_t(\"New\\\\Page.TITLE\")")]
    #[case("i18n::_t('Old\\Page.TITLE')", "i18n::_t('New\\Page.TITLE')")]
    #[case("_t('Old\\PageHolder.TITLE')", "_t('Old\\PageHolder.TITLE')")]
    #[case("translate('Old\\Page.TITLE')", "translate('Old\\Page.TITLE')")]
    fn renames_php_translation_entities(#[case] call: &str, #[case] expected: &str) {
        let rule = UpgradeRule::RenameTranslateKeys(RenameTranslateKeys::new(parameters()));
        let source = format!("<?php\n$x = {call};\n");

        let output = run(&rule, "src/Page.php", &source);

        assert_eq!(output, format!("<?php\n$x = {expected};\n"));
    }

    #[test]
    fn renames_entities_under_the_locale_key() {
        let rule = UpgradeRule::RenameLangYamlKeys(RenameLangYamlKeys::new(parameters()));
        let source = "en:\n  Old\\Page:\n    TITLE: Old\\Page\n  'Old\\Page':\n    PLURAL: Pages\n";

        let output = run(&rule, "app/lang/en.yml", source);

        assert_eq!(
            output,
            "en:\n  New\\Page:\n    TITLE: Old\\Page\n  'New\\Page':\n    PLURAL: Pages\n"
        );
    }

    #[test]
    fn renames_template_tags() {
        let rule = UpgradeRule::RenameTemplateLangKeys(
            RenameTemplateLangKeys::new(parameters()).expect("rule"),
        );
        let source = "<h1><%t Old\\Page.TITLE 'Title' %></h1>\n<p><% _t('Old\\Page.INTRO', 'Hi') %></p>\n<p><%t Other.TITLE %></p>\n";

        let output = run(&rule, "templates/Page.ss", source);

        assert_eq!(
            output,
            "<h1><%t New\\Page.TITLE 'Title' %></h1>\n<p><% _t('New\\Page.INTRO', 'Hi') %></p>\n<p><%t Other.TITLE %></p>\n"
        );
    }
}
