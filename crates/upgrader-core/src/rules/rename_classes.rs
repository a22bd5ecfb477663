//! Class renames in PHP code.

use std::collections::BTreeMap;
use std::ops::Range;
use std::sync::Arc;

use regex::Regex;
use tracing::debug;

use super::{RuleInput, RuleParameters};
use crate::error::UpgradeError;
use crate::matcher::{ClassNameMatcher, ClassOccurrence, StringLiteral};
use crate::names::{Import, NameContext, Resolution, short_name};
use crate::source::MutableSource;
use crate::warning::Warning;

const DOC_TAG_PATTERN: &str = r"@(?:param|var|return|throws|property-read|property-write|property|method|see|mixin)[ \t]+([^\s]+)";
const DOC_NAME_PATTERN: &str = r"\\?[A-Za-z_\x{80}-\x{10FFFF}][A-Za-z0-9_\x{80}-\x{10FFFF}]*(?:\\[A-Za-z_\x{80}-\x{10FFFF}][A-Za-z0-9_\x{80}-\x{10FFFF}]*)*";

/// Renames every occurrence of a mapped class: declarations, imports,
/// references in code, static string literals and doc-comment types.
#[derive(Debug, Clone)]
pub struct RenameClasses {
    parameters: Arc<RuleParameters>,
    doc_tag: Regex,
    doc_name: Regex,
}

/// What an unaliased or aliased import becomes after the rename.
#[derive(Debug, Clone)]
enum ImportPlan {
    /// The import is rewritten; references through it use `alias`.
    Rewritten { alias: String },
    /// The import cannot be rewritten in place, so references through it
    /// are fully qualified.
    Qualify { fqn: String },
}

impl RenameClasses {
    /// Creates the rule.
    ///
    /// # Errors
    ///
    /// Returns [`UpgradeError::Configuration`] if the doc-comment patterns
    /// fail to compile.
    pub fn new(parameters: Arc<RuleParameters>) -> Result<Self, UpgradeError> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| {
                UpgradeError::configuration(format!("invalid doc comment pattern: {e}"))
            })
        };
        Ok(Self {
            parameters,
            doc_tag: compile(DOC_TAG_PATTERN)?,
            doc_name: compile(DOC_NAME_PATTERN)?,
        })
    }

    pub(super) fn apply(&self, input: &RuleInput<'_>, buffer: &mut MutableSource) -> Vec<Warning> {
        let Some(php) = input.php else {
            return Vec::new();
        };
        if self.parameters.mappings().is_empty() {
            return Vec::new();
        }

        let parsed = php.parsed();
        let names = php.names();
        let matcher = ClassNameMatcher::new(parsed, names);
        let plans = self.import_plans(names);
        let mut edits: BTreeMap<(usize, usize), String> = BTreeMap::new();

        for node in parsed.nodes() {
            if let Some(occurrence) = matcher.match_node(node) {
                if let Some(text) = self.replacement(&occurrence, names, &plans) {
                    let range = occurrence.range();
                    edits.insert((range.start, range.end), text);
                }
                continue;
            }
            match node.kind() {
                "string" | "encapsed_string" => {
                    if let Some((range, text)) = self.literal_edit(node, input.source) {
                        edits.insert((range.start, range.end), text);
                    }
                }
                "comment" => {
                    let found = self.doc_comment_edits(node, input.source, &matcher, names, &plans);
                    for (range, text) in found {
                        edits.insert((range.start, range.end), text);
                    }
                }
                _ => {}
            }
        }

        debug!(path = %input.path.display(), edits = edits.len(), "renamed classes");
        for ((start, end), text) in edits {
            if input.source.get(start..end) != Some(text.as_str()) {
                buffer.queue_replacement(start, end, text);
            }
        }
        Vec::new()
    }

    fn import_plans(&self, names: &NameContext) -> Vec<Option<ImportPlan>> {
        names
            .imports()
            .iter()
            .map(|import| {
                let new = self.parameters.renamed(&import.target)?;
                Some(plan_for(import, new))
            })
            .collect()
    }

    fn replacement(
        &self,
        occurrence: &ClassOccurrence,
        names: &NameContext,
        plans: &[Option<ImportPlan>],
    ) -> Option<String> {
        match occurrence {
            ClassOccurrence::Declaration { fqn, .. } => self
                .parameters
                .renamed(fqn)
                .map(|new| short_name(new).to_owned()),
            ClassOccurrence::Import { index, .. } => {
                let import = names.imports().get(*index)?;
                let new = self.parameters.renamed(&import.target)?;
                import.group_prefix.as_deref().map_or_else(
                    || Some(new.to_owned()),
                    |prefix| group_member(prefix, new).map(str::to_owned),
                )
            }
            ClassOccurrence::Reference { range, resolution } => {
                self.reference_replacement(resolution, range, names, plans)
            }
        }
    }

    fn reference_replacement(
        &self,
        resolution: &Resolution,
        range: &Range<usize>,
        names: &NameContext,
        plans: &[Option<ImportPlan>],
    ) -> Option<String> {
        match resolution {
            Resolution::Imported {
                import,
                qualified: false,
                ..
            } => match plans.get(*import)?.as_ref()? {
                ImportPlan::Rewritten { alias } => Some(alias.clone()),
                ImportPlan::Qualify { fqn } => Some(format!("\\{fqn}")),
            },
            Resolution::Relative(fqn) => {
                let new = self.parameters.renamed(fqn)?;
                let global = names.namespace_at(range.start).is_empty() && !new.contains('\\');
                Some(if global {
                    new.to_owned()
                } else {
                    format!("\\{new}")
                })
            }
            Resolution::FullyQualified(fqn) | Resolution::Imported { fqn, .. } => self
                .parameters
                .renamed(fqn)
                .map(|new| format!("\\{new}")),
        }
    }

    fn literal_edit(
        &self,
        node: tree_sitter::Node<'_>,
        source: &str,
    ) -> Option<(Range<usize>, String)> {
        let literal = StringLiteral::from_node(node, source)?;
        let (lead, name) = literal
            .value
            .strip_prefix('\\')
            .map_or(("", literal.value.as_str()), |rest| ("\\", rest));
        let new = self.parameters.renamed(name)?;
        Some((
            literal.content.clone(),
            literal.encode(&format!("{lead}{new}")),
        ))
    }

    fn doc_comment_edits(
        &self,
        node: tree_sitter::Node<'_>,
        source: &str,
        matcher: &ClassNameMatcher<'_>,
        names: &NameContext,
        plans: &[Option<ImportPlan>],
    ) -> Vec<(Range<usize>, String)> {
        let Some(comment) = source.get(node.byte_range()) else {
            return Vec::new();
        };
        if !comment.starts_with("/**") {
            return Vec::new();
        }

        let base = node.start_byte();
        let mut edits = Vec::new();
        for tag in self.doc_tag.captures_iter(comment) {
            let Some(token) = tag.get(1) else {
                continue;
            };
            let type_text = type_prefix(token.as_str());
            for name in self.doc_name.find_iter(type_text) {
                let start = base.saturating_add(token.start()).saturating_add(name.start());
                let range = start..start.saturating_add(name.len());
                let Some(occurrence) = matcher.resolve_text(name.as_str(), range.clone()) else {
                    continue;
                };
                if let ClassOccurrence::Reference { resolution, .. } = &occurrence
                    && let Some(text) = self.reference_replacement(resolution, &range, names, plans)
                {
                    edits.push((range, text));
                }
            }
        }
        edits
    }
}

fn plan_for(import: &Import, new: &str) -> ImportPlan {
    let rewritable = import
        .group_prefix
        .as_deref()
        .is_none_or(|prefix| group_member(prefix, new).is_some());
    if !rewritable {
        return ImportPlan::Qualify {
            fqn: new.to_owned(),
        };
    }
    let alias = if import.explicit_alias {
        import.alias.clone()
    } else {
        short_name(new).to_owned()
    };
    ImportPlan::Rewritten { alias }
}

/// Returns the part of `new` below a group import prefix.
fn group_member<'n>(prefix: &str, new: &'n str) -> Option<&'n str> {
    new.strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('\\'))
        .filter(|rest| !rest.is_empty())
}

/// The leading part of a doc-comment token that can hold type names.
fn type_prefix(token: &str) -> &str {
    let end = token
        .char_indices()
        .find(|(_, ch)| {
            !(ch.is_alphanumeric() || matches!(ch, '_' | '\\' | '|' | '?' | '[' | ']' | '<' | '>'))
        })
        .map_or(token.len(), |(index, _)| index);
    token.get(..end).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use rstest::rstest;

    use super::*;
    use crate::language::SourceKind;
    use crate::parser::ParsedSource;
    use crate::rules::ParsedPhp;

    fn rename(source: &str, mappings: &[(&str, &str)]) -> String {
        let parameters = mappings
            .iter()
            .fold(RuleParameters::new(), |parameters, (old, new)| {
                parameters.with_mapping(old, new)
            });
        let rule = RenameClasses::new(Arc::new(parameters)).expect("rule");
        let php = ParsedPhp::new(ParsedSource::parse(source).expect("parse"));
        let input = RuleInput {
            path: Path::new("src/Page.php"),
            kind: SourceKind::Php,
            source,
            php: Some(&php),
        };
        let mut buffer = MutableSource::new(source);
        let warnings = rule.apply(&input, &mut buffer);
        assert!(warnings.is_empty());
        buffer.render().expect("render")
    }

    #[test]
    fn renames_imports_and_their_unqualified_references() {
        let source = "<?php\nnamespace App;\n\nuse Old\\Model\\Record;\n\nclass Page extends Record\n{\n    public function make(): Record\n    {\n        return new Record();\n    }\n}\n";

        let output = rename(source, &[("Old\\Model\\Record", "New\\ORM\\DataRecord")]);

        insta::assert_snapshot!(output, @r"
        <?php
        namespace App;

        use New\ORM\DataRecord;

        class Page extends DataRecord
        {
            public function make(): DataRecord
            {
                return new DataRecord();
            }
        }
        ");
    }

    #[test]
    fn aliased_imports_keep_their_alias() {
        let source = "<?php\nuse Old\\Record as Base;\nclass Page extends Base {}\n";

        let output = rename(source, &[("Old\\Record", "New\\Record")]);

        assert_eq!(
            output,
            "<?php\nuse New\\Record as Base;\nclass Page extends Base {}\n"
        );
    }

    #[test]
    fn renames_fully_qualified_references_and_declarations() {
        let source = "<?php\nnamespace Old;\nclass Record {}\n$x = \\Old\\Record::class;\n$y = Record::create();\n";

        let output = rename(source, &[("Old\\Record", "Old\\Entry")]);

        assert_eq!(
            output,
            "<?php\nnamespace Old;\nclass Entry {}\n$x = \\Old\\Entry::class;\n$y = \\Old\\Entry::create();\n"
        );
    }

    #[test]
    fn global_code_keeps_bare_names() {
        let source = "<?php\n$x = new Legacy();\n";

        let output = rename(source, &[("Legacy", "Modern")]);

        assert_eq!(output, "<?php\n$x = new Modern();\n");
    }

    #[test]
    fn renames_static_string_literals_only() {
        let source = "<?php\n$a = 'Old\\Record';\n$b = \"Old\\\\Record\";\n$c = 'Old\\Record.TITLE';\n$d = \"$Old\\Record\";\n";

        let output = rename(source, &[("Old\\Record", "New\\Record")]);

        assert_eq!(
            output,
            "<?php\n$a = 'New\\Record';\n$b = \"New\\\\Record\";\n$c = 'Old\\Record.TITLE';\n$d = \"$Old\\Record\";\n"
        );
    }

    #[test]
    fn renames_doc_comment_types() {
        let source = "<?php\nnamespace App;\nuse Old\\Record;\n/**\n * @param Record|null $record\n * @return \\Old\\Record[]\n * @see Record::make()\n */\nfunction f($record) {}\n";

        let output = rename(source, &[("Old\\Record", "New\\Entry")]);

        assert_eq!(
            output,
            "<?php\nnamespace App;\nuse New\\Entry;\n/**\n * @param Entry|null $record\n * @return \\New\\Entry[]\n * @see Entry::make()\n */\nfunction f($record) {}\n"
        );
    }

    #[rstest]
    #[case::catch_type("try {} catch (Record $e) {}\n", "try {} catch (Entry $e) {}\n")]
    #[case::multi_catch(
        "try {} catch (\\Exception | Record $e) {}\n",
        "try {} catch (\\Exception | Entry $e) {}\n"
    )]
    #[case::attribute("#[Record]\nfunction f() {}\n", "#[Entry]\nfunction f() {}\n")]
    #[case::trait_use("class Page { use Record; }\n", "class Page { use Entry; }\n")]
    #[case::interface_extends(
        "interface Page extends Record {}\n",
        "interface Page extends Entry {}\n"
    )]
    #[case::enum_implements(
        "enum Suit: string implements Record { case A = 'a'; }\n",
        "enum Suit: string implements Entry { case A = 'a'; }\n"
    )]
    #[case::throws_tag("/** @throws Record */\nfunction f() {}\n", "/** @throws Entry */\nfunction f() {}\n")]
    #[case::mixin_tag("/** @mixin Record */\nclass Page {}\n", "/** @mixin Entry */\nclass Page {}\n")]
    #[case::property_tag(
        "/** @property Record $record */\nclass Page {}\n",
        "/** @property Entry $record */\nclass Page {}\n"
    )]
    #[case::property_read_tag(
        "/** @property-read Record $record */\nclass Page {}\n",
        "/** @property-read Entry $record */\nclass Page {}\n"
    )]
    #[case::property_write_tag(
        "/** @property-write Record $record */\nclass Page {}\n",
        "/** @property-write Entry $record */\nclass Page {}\n"
    )]
    #[case::method_tag(
        "/** @method Record make() */\nclass Page {}\n",
        "/** @method Entry make() */\nclass Page {}\n"
    )]
    fn renames_imported_references_in_every_position(#[case] body: &str, #[case] expected: &str) {
        let source = format!("<?php\nnamespace App;\nuse Old\\Record;\n{body}");

        let output = rename(&source, &[("Old\\Record", "New\\Entry")]);

        assert_eq!(output, format!("<?php\nnamespace App;\nuse New\\Entry;\n{expected}"));
    }

    #[rstest]
    #[case::class("class Record {}\n", "class Entry {}\n")]
    #[case::interface("interface Record {}\n", "interface Entry {}\n")]
    #[case::trait_declaration("trait Record {}\n", "trait Entry {}\n")]
    #[case::enum_declaration("enum Record {}\n", "enum Entry {}\n")]
    fn renames_every_kind_of_declaration(#[case] body: &str, #[case] expected: &str) {
        let source = format!("<?php\nnamespace Old;\n{body}");

        let output = rename(&source, &[("Old\\Record", "Old\\Entry")]);

        assert_eq!(output, format!("<?php\nnamespace Old;\n{expected}"));
    }

    #[test]
    fn group_imports_leaving_their_prefix_are_qualified_instead() {
        let source = "<?php\nnamespace App;\nuse Old\\{Record, Other};\nnew Record();\nnew Other();\n";

        let output = rename(source, &[("Old\\Record", "New\\Record")]);

        assert_eq!(
            output,
            "<?php\nnamespace App;\nuse Old\\{Record, Other};\nnew \\New\\Record();\nnew Other();\n"
        );
    }

    #[test]
    fn untouched_source_renders_identically() {
        let source = "<?php\n// nothing to see\nclass Keep {}\n";

        assert_eq!(rename(source, &[("Old\\Record", "New\\Record")]), source);
    }
}
