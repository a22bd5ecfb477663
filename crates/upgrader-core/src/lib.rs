//! Rule-driven rewriting engine for upgrading framework module sources.
//!
//! The engine parses each file once, runs the configured upgrade rules over
//! it and stitches the queued edits into the original text, leaving every
//! byte outside the edited spans untouched:
//!
//! - **Parsing** via [`ParsedSource`], a Tree-sitter PHP tree kept next to
//!   its source text, and [`NameContext`] for namespace and import lookups
//! - **Matching** via [`ClassNameMatcher`] and [`MethodCallMatcher`], which
//!   only accept statically known names
//! - **Rewriting** via [`MutableSource`], which refuses overlapping edits
//! - **Orchestration** via [`Upgrader`], which applies an [`UpgradeSpec`] to
//!   a set of files and returns a [`ChangeSet`]
//!
//! # Rules
//!
//! | Group | Rules | Files |
//! | --- | --- | --- |
//! | `code` | class renames, API change warnings | `.php` |
//! | `config` | class renames | `_config/*.yml` |
//! | `lang` | translation entity renames | `.php`, `lang/*.yml`, `.ss` |
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use upgrader_core::{ApiChangeSpec, CodeFile, RuleParameters, UpgradeSpec, Upgrader};
//!
//! let parameters = RuleParameters::new().with_api_change(ApiChangeSpec::new(
//!     "removedMethod()",
//!     "removedMethod() is gone; use newMethod()",
//!     Some("newMethod".to_owned()),
//! )?);
//! let spec = UpgradeSpec::from_rule_names(["code"], &Arc::new(parameters))?;
//! let upgrader = Upgrader::new(spec)?;
//!
//! let files = [CodeFile::new("src/Page.php", "<?php\n$obj->removedMethod();\n")];
//! let changes = upgrader.upgrade(&files)?;
//!
//! assert_eq!(changes.warning_count(), 1);
//! # Ok::<(), upgrader_core::UpgradeError>(())
//! ```

mod change_set;
mod error;
mod language;
mod matcher;
mod names;
mod parser;
mod position;
mod rules;
mod source;
mod spec;
mod upgrader;
mod warning;

pub use change_set::{ChangeSet, FileChange};
pub use error::UpgradeError;
pub use language::SourceKind;
pub use matcher::{
    ApiChangeSpec, ClassNameMatcher, ClassOccurrence, MethodCallMatcher, MethodMatch, Quote,
    SignatureTarget, StringLiteral,
};
pub use names::{ClassScope, Import, NameContext, Resolution, normalise_name, short_name};
pub use parser::{ParsedSource, PhpParser, SyntaxErrorInfo};
pub use rules::{
    ApiChangeWarnings, ParsedPhp, RenameClasses, RenameLangYamlKeys, RenameTemplateLangKeys,
    RenameTranslateKeys, RuleInput, RuleParameters, UpdateConfigClasses, UpgradeRule,
};
pub use source::{EditSpan, MutableSource};
pub use spec::{RuleName, UpgradeSpec};
pub use upgrader::{CodeCollection, CodeFile, InMemoryCollection, Upgrader};
pub use warning::{Warning, WarningLocation};

#[cfg(test)]
mod tests;
