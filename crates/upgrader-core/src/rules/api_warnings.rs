//! Warnings, and optional renames, for changed APIs.

use std::sync::Arc;

use tracing::debug;

use super::{RuleInput, RuleParameters};
use crate::matcher::MethodCallMatcher;
use crate::source::MutableSource;
use crate::warning::Warning;

/// Reports every statically matched call or declaration of a changed API.
///
/// A spec with a replacement also renames the method name token. The
/// warning is raised either way, so mechanically fixed call sites still get
/// reviewed.
#[derive(Debug, Clone)]
pub struct ApiChangeWarnings {
    parameters: Arc<RuleParameters>,
}

impl ApiChangeWarnings {
    /// Creates the rule.
    #[must_use]
    pub const fn new(parameters: Arc<RuleParameters>) -> Self {
        Self { parameters }
    }

    pub(super) fn apply(&self, input: &RuleInput<'_>, buffer: &mut MutableSource) -> Vec<Warning> {
        let Some(php) = input.php else {
            return Vec::new();
        };
        let matcher = MethodCallMatcher::new(self.parameters.api_changes());
        let parsed = php.parsed();

        let mut warnings = Vec::new();
        for node in parsed.nodes() {
            let Some(found) = matcher.match_node(node, parsed, php.names()) else {
                continue;
            };
            if let Some(replacement) = found.spec.replacement()
                && input.source.get(found.name.clone()) != Some(replacement)
            {
                buffer.replace_range(found.name.clone(), replacement);
            }
            warnings.push(input.warning(found.name, found.spec.message()));
        }

        debug!(
            path = %input.path.display(),
            warnings = warnings.len(),
            "checked api changes"
        );
        warnings
    }
}
