//! Upgrade rules.
//!
//! Each rule is one upgrade concern configured with the shared
//! [`RuleParameters`]. Rules never write text directly: they queue edits on
//! the file's [`MutableSource`] and return the warnings they raise. Every
//! span they queue is expressed against the original text.

mod api_warnings;
mod config_classes;
mod lang_keys;
mod rename_classes;
mod yaml_text;

use std::collections::BTreeMap;
use std::ops::Range;
use std::path::Path;

pub use api_warnings::ApiChangeWarnings;
pub use config_classes::UpdateConfigClasses;
pub use lang_keys::{RenameLangYamlKeys, RenameTemplateLangKeys, RenameTranslateKeys};
pub use rename_classes::RenameClasses;

use crate::language::SourceKind;
use crate::matcher::ApiChangeSpec;
use crate::names::{NameContext, normalise_name};
use crate::parser::ParsedSource;
use crate::source::MutableSource;
use crate::warning::Warning;

/// Parameters shared read-only by every rule of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleParameters {
    mappings: BTreeMap<String, String>,
    api_changes: Vec<ApiChangeSpec>,
}

impl RuleParameters {
    /// Creates empty parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a class rename. Leading `\` are stripped from both names.
    #[must_use]
    pub fn with_mapping(mut self, old: &str, new: &str) -> Self {
        self.insert_mapping(old, new);
        self
    }

    /// Adds an API change spec.
    #[must_use]
    pub fn with_api_change(mut self, spec: ApiChangeSpec) -> Self {
        self.api_changes.push(spec);
        self
    }

    /// Adds or replaces a class rename.
    pub fn insert_mapping(&mut self, old: &str, new: &str) {
        self.mappings
            .insert(normalise_name(old), normalise_name(new));
    }

    /// Appends an API change spec.
    pub fn push_api_change(&mut self, spec: ApiChangeSpec) {
        self.api_changes.push(spec);
    }

    /// Class renames, keyed by old fully qualified name.
    #[must_use]
    pub const fn mappings(&self) -> &BTreeMap<String, String> {
        &self.mappings
    }

    /// API change specs in configuration order.
    #[must_use]
    pub fn api_changes(&self) -> &[ApiChangeSpec] {
        &self.api_changes
    }

    /// Returns the new name for `old`, comparing exactly after stripping a
    /// leading `\`.
    #[must_use]
    pub fn renamed(&self, old: &str) -> Option<&str> {
        let key = old.strip_prefix('\\').unwrap_or(old);
        self.mappings.get(key).map(String::as_str)
    }
}

/// A PHP file parsed once and shared by every PHP rule.
#[derive(Debug)]
pub struct ParsedPhp {
    parsed: ParsedSource,
    names: NameContext,
}

impl ParsedPhp {
    /// Builds name tables for a parsed file.
    #[must_use]
    pub fn new(parsed: ParsedSource) -> Self {
        let names = NameContext::build(&parsed);
        Self { parsed, names }
    }

    /// The parse result.
    #[must_use]
    pub const fn parsed(&self) -> &ParsedSource {
        &self.parsed
    }

    /// The file's namespace and import tables.
    #[must_use]
    pub const fn names(&self) -> &NameContext {
        &self.names
    }
}

/// What a rule sees of one file.
#[derive(Debug, Clone, Copy)]
pub struct RuleInput<'a> {
    /// Path of the file, used for warnings.
    pub path: &'a Path,
    /// Detected kind of the file.
    pub kind: SourceKind,
    /// Original text.
    pub source: &'a str,
    /// The syntax tree, for PHP files.
    pub php: Option<&'a ParsedPhp>,
}

impl RuleInput<'_> {
    fn warning(&self, span: Range<usize>, message: impl Into<String>) -> Warning {
        Warning::new(self.path, span, message)
    }
}

/// One configured upgrade rule.
#[derive(Debug, Clone)]
pub enum UpgradeRule {
    /// Renames class references in PHP code.
    RenameClasses(RenameClasses),
    /// Flags, and optionally renames, changed API calls.
    ApiChangeWarnings(ApiChangeWarnings),
    /// Renames classes in YAML configuration.
    UpdateConfigClasses(UpdateConfigClasses),
    /// Renames translation entities in PHP `_t()` calls.
    RenameTranslateKeys(RenameTranslateKeys),
    /// Renames translation entities in language YAML files.
    RenameLangYamlKeys(RenameLangYamlKeys),
    /// Renames translation entities in templates.
    RenameTemplateLangKeys(RenameTemplateLangKeys),
}

impl UpgradeRule {
    /// Stable identifier used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::RenameClasses(_) => "rename-classes",
            Self::ApiChangeWarnings(_) => "api-change-warnings",
            Self::UpdateConfigClasses(_) => "update-config-classes",
            Self::RenameTranslateKeys(_) => "rename-translate-keys",
            Self::RenameLangYamlKeys(_) => "rename-lang-yaml-keys",
            Self::RenameTemplateLangKeys(_) => "rename-template-lang-keys",
        }
    }

    /// Returns true when the rule handles files of `kind`.
    #[must_use]
    pub const fn applies_to(&self, kind: SourceKind) -> bool {
        matches!(
            (self, kind),
            (
                Self::RenameClasses(_) | Self::ApiChangeWarnings(_) | Self::RenameTranslateKeys(_),
                SourceKind::Php
            ) | (Self::UpdateConfigClasses(_), SourceKind::ConfigYaml)
                | (Self::RenameLangYamlKeys(_), SourceKind::LangYaml)
                | (Self::RenameTemplateLangKeys(_), SourceKind::Template)
        )
    }

    /// Applies the rule to one file, queuing edits on `buffer`.
    ///
    /// Returns the warnings raised, ordered by position.
    pub fn apply(&self, input: &RuleInput<'_>, buffer: &mut MutableSource) -> Vec<Warning> {
        if !self.applies_to(input.kind) {
            return Vec::new();
        }
        let mut warnings = match self {
            Self::RenameClasses(rule) => rule.apply(input, buffer),
            Self::ApiChangeWarnings(rule) => rule.apply(input, buffer),
            Self::UpdateConfigClasses(rule) => rule.apply(input, buffer),
            Self::RenameTranslateKeys(rule) => rule.apply(input, buffer),
            Self::RenameLangYamlKeys(rule) => rule.apply(input, buffer),
            Self::RenameTemplateLangKeys(rule) => rule.apply(input, buffer),
        };
        warnings.sort_by_key(|warning| warning.span().start);
        warnings
    }
}
