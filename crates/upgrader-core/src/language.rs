//! File kind detection and Tree-sitter grammar selection.
//!
//! This module provides the [`SourceKind`] enum for deciding which upgrade
//! rules apply to a file. Only PHP sources are parsed into a syntax tree; the
//! YAML and template kinds are scanned as text.

use std::fmt;
use std::path::{Component, Path};

/// Kinds of file the upgrade rules understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// PHP source files (`.php`).
    Php,
    /// YAML configuration fragments under a `_config` directory.
    ConfigYaml,
    /// Translation dictionaries under a `lang` directory.
    LangYaml,
    /// Templates (`.ss`).
    Template,
}

impl SourceKind {
    /// Detects the kind of a file from its path.
    ///
    /// Returns `None` for files no rule is interested in.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::Path;
    /// use upgrader_core::SourceKind;
    ///
    /// assert_eq!(
    ///     SourceKind::from_path(Path::new("app/src/Page.php")),
    ///     Some(SourceKind::Php)
    /// );
    /// assert_eq!(
    ///     SourceKind::from_path(Path::new("app/_config/routes.yml")),
    ///     Some(SourceKind::ConfigYaml)
    /// );
    /// assert_eq!(SourceKind::from_path(Path::new("README.md")), None);
    /// ```
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "php" => Some(Self::Php),
            "ss" => Some(Self::Template),
            "yml" | "yaml" => Self::yaml_kind(path),
            _ => None,
        }
    }

    fn yaml_kind(path: &Path) -> Option<Self> {
        if path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .is_some_and(|stem| stem == "_config")
        {
            return Some(Self::ConfigYaml);
        }

        let parent = path.parent()?;
        parent.components().rev().find_map(|component| match component {
            Component::Normal(name) if name == "_config" => Some(Self::ConfigYaml),
            Component::Normal(name) if name == "lang" => Some(Self::LangYaml),
            _ => None,
        })
    }

    /// Returns the Tree-sitter grammar for kinds that are parsed as trees.
    #[must_use]
    pub fn tree_sitter_language(self) -> Option<tree_sitter::Language> {
        match self {
            Self::Php => Some(tree_sitter_php::LANGUAGE_PHP.into()),
            Self::ConfigYaml | Self::LangYaml | Self::Template => None,
        }
    }

    /// Returns the lower-case identifier for this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Php => "php",
            Self::ConfigYaml => "config-yaml",
            Self::LangYaml => "lang-yaml",
            Self::Template => "template",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
