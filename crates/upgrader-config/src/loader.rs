//! Discovering and merging definition files.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};
use upgrader_core::{ApiChangeSpec, RuleParameters, UpgradeSpec};
use walkdir::WalkDir;

use crate::definition::Definition;
use crate::error::ConfigError;

/// Name of a module's definition file.
pub const DEFINITION_FILE: &str = ".upgrade.yml";

/// How many directory levels below the root are searched.
///
/// Three levels reach `vendor/<org>/<module>/.upgrade.yml`.
pub const MAX_DISCOVERY_DEPTH: usize = 3;

/// Lists every definition file under `root`, in sorted path order.
///
/// # Errors
///
/// Returns [`ConfigError::Discover`] when the tree cannot be walked.
pub fn discover(root: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let mut found = Vec::new();
    // Depth counts the file itself, so a file directly in the root is depth 1.
    let walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(MAX_DISCOVERY_DEPTH.saturating_add(1))
        .follow_links(false);
    for item in walker {
        let entry = item.map_err(|source| ConfigError::Discover {
            root: root.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file() && entry.file_name() == DEFINITION_FILE {
            found.push(entry.into_path());
        }
    }
    found.sort();
    Ok(found)
}

/// Upgrade definitions merged from every module under a root.
#[derive(Debug, Clone, Default)]
pub struct UpgradeConfig {
    parameters: Arc<RuleParameters>,
    excluded_paths: Vec<String>,
    sources: Vec<PathBuf>,
}

impl UpgradeConfig {
    /// Discovers and merges every definition under `root`.
    ///
    /// Mappings from later files replace earlier ones with the same key; API
    /// changes and excluded paths accumulate in discovery order.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoDefinitions`] when nothing is found, or the
    /// first read, parse or validation failure.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let sources = discover(root)?;
        if sources.is_empty() {
            return Err(ConfigError::NoDefinitions {
                root: root.to_path_buf(),
            });
        }

        let mut merged = Self::default();
        for path in sources {
            let text = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
                path: path.clone(),
                source,
            })?;
            let definition = Definition::parse(&text).map_err(|source| ConfigError::Parse {
                path: path.clone(),
                source,
            })?;
            merged.merge(path, &definition)?;
        }

        info!(
            definitions = merged.sources.len(),
            mappings = merged.parameters.mappings().len(),
            api_changes = merged.parameters.api_changes().len(),
            "loaded upgrade definitions"
        );
        Ok(merged)
    }

    /// Folds one parsed definition into the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ApiChange`] for an invalid API change.
    pub fn merge(&mut self, path: PathBuf, definition: &Definition) -> Result<(), ConfigError> {
        debug!(path = %path.display(), "merging definition");
        let parameters = Arc::make_mut(&mut self.parameters);
        for (old, new) in &definition.mappings {
            parameters.insert_mapping(old, new);
        }
        for change in definition.api_changes() {
            let spec = ApiChangeSpec::new(change.signature, change.message, change.replacement)
                .map_err(|source| ConfigError::ApiChange {
                    path: path.clone(),
                    source,
                })?;
            parameters.push_api_change(spec);
        }
        self.excluded_paths
            .extend(definition.excluded_paths.iter().cloned());
        self.sources.push(path);
        Ok(())
    }

    /// The merged rule parameters.
    #[must_use]
    pub const fn parameters(&self) -> &Arc<RuleParameters> {
        &self.parameters
    }

    /// Glob patterns of paths to exclude, relative to the root.
    #[must_use]
    pub fn excluded_paths(&self) -> &[String] {
        &self.excluded_paths
    }

    /// The definition files that were merged, in merge order.
    #[must_use]
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    /// Builds the spec for the selected rule groups.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Rules`] for an unknown group name or an empty
    /// selection.
    pub fn spec<I, S>(&self, rules: I) -> Result<UpgradeSpec, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(UpgradeSpec::from_rule_names(rules, &self.parameters)?)
    }
}
