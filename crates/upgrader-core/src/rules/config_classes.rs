//! Class renames in YAML configuration.

use std::sync::Arc;

use tracing::debug;

use super::yaml_text;
use super::{RuleInput, RuleParameters};
use crate::source::MutableSource;
use crate::warning::Warning;

/// Injector service references are written `%$Class` or `%$Class.name`.
const SERVICE_PREFIX: &str = "%$";

/// Renames mapped classes used as YAML keys, values or sequence items.
///
/// Matching is exact and case-sensitive on the whole scalar; a scalar that
/// merely contains a mapped name is left alone.
#[derive(Debug, Clone)]
pub struct UpdateConfigClasses {
    parameters: Arc<RuleParameters>,
}

impl UpdateConfigClasses {
    /// Creates the rule.
    #[must_use]
    pub const fn new(parameters: Arc<RuleParameters>) -> Self {
        Self { parameters }
    }

    pub(super) fn apply(&self, input: &RuleInput<'_>, buffer: &mut MutableSource) -> Vec<Warning> {
        if self.parameters.mappings().is_empty() {
            return Vec::new();
        }
        let mut renamed = 0_usize;
        for scalar in yaml_text::scan(input.source) {
            if let Some(value) = self.renamed_value(&scalar.value) {
                buffer.replace_range(scalar.span.clone(), scalar.encode(&value));
                renamed = renamed.saturating_add(1);
            }
        }
        debug!(path = %input.path.display(), renamed, "updated config classes");
        Vec::new()
    }

    fn renamed_value(&self, value: &str) -> Option<String> {
        if let Some(reference) = value.strip_prefix(SERVICE_PREFIX) {
            let (class, suffix) = reference
                .find('.')
                .map_or((reference, ""), |dot| reference.split_at(dot));
            let new = self.parameters.renamed(class)?;
            return Some(format!("{SERVICE_PREFIX}{new}{suffix}"));
        }
        let lead = if value.starts_with('\\') { "\\" } else { "" };
        let new = self.parameters.renamed(value)?;
        Some(format!("{lead}{new}"))
    }
}
