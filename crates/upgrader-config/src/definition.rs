//! The shape of one `.upgrade.yml` file.

use std::collections::BTreeMap;

use serde::Deserialize;

/// One definition file as written by a module author.
///
/// ```yaml
/// mappings:
///   Old\Namespace\Page: New\Namespace\Page
/// apiChanges:
///   - signature: 'Old\Namespace\Page::legacy()'
///     message: 'legacy() was removed'
///     replacement: modern
/// warnings:
///   methods:
///     'removedMethod()':
///       message: 'removedMethod() is gone'
/// excludedPaths:
///   - 'thirdparty/*'
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Definition {
    /// Class renames, old fully qualified name to new.
    pub mappings: BTreeMap<String, String>,
    /// API changes in list form.
    pub api_changes: Vec<RawApiChange>,
    /// API changes keyed by signature.
    pub warnings: RawWarnings,
    /// Glob patterns of paths to leave alone, relative to the root.
    pub excluded_paths: Vec<String>,
}

impl Definition {
    /// Parses one definition file. Blank or comment-only files are empty
    /// definitions.
    ///
    /// # Errors
    ///
    /// Returns the deserialiser's error, with its source location, when the
    /// text is not a valid definition.
    pub fn parse(text: &str) -> Result<Self, Box<serde_saphyr::Error>> {
        if is_blank(text) {
            return Ok(Self::default());
        }
        serde_saphyr::from_str(text).map_err(Box::new)
    }

    /// Every API change the file declares, list form first.
    #[must_use]
    pub fn api_changes(&self) -> Vec<RawApiChange> {
        let keyed = self
            .warnings
            .methods
            .iter()
            .map(|(signature, warning)| RawApiChange {
                signature: signature.clone(),
                message: warning.message.clone(),
                replacement: warning.replacement.clone(),
            });
        self.api_changes.iter().cloned().chain(keyed).collect()
    }
}

/// An API change in list form.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawApiChange {
    /// `name()`, `Class::name()` or `Class->name()`.
    pub signature: String,
    /// Message shown at every match.
    pub message: String,
    /// New method name, when the change can be applied automatically.
    #[serde(default)]
    pub replacement: Option<String>,
}

/// The `warnings` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RawWarnings {
    /// Method warnings keyed by signature.
    pub methods: BTreeMap<String, RawMethodWarning>,
}

/// One keyed method warning.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawMethodWarning {
    /// Message shown at every match.
    pub message: String,
    /// New method name.
    #[serde(default)]
    pub replacement: Option<String>,
}

fn is_blank(text: &str) -> bool {
    text.lines().map(str::trim).all(|line| {
        line.is_empty() || line.starts_with('#') || line == "---" || line == "..."
    })
}
