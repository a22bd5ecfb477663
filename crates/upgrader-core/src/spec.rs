//! Upgrade specs: the ordered rules of one run.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::UpgradeError;
use crate::rules::{
    ApiChangeWarnings, RenameClasses, RenameLangYamlKeys, RenameTemplateLangKeys,
    RenameTranslateKeys, RuleParameters, UpdateConfigClasses, UpgradeRule,
};

/// Rule groups that can be selected for a run.
///
/// Ordering follows the order in which the groups run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RuleName {
    /// Class renames and API change warnings in PHP code.
    Code,
    /// Class renames in YAML configuration.
    Config,
    /// Translation entity renames.
    Lang,
}

impl RuleName {
    /// Every selectable rule group.
    pub const ALL: [Self; 3] = [Self::Code, Self::Config, Self::Lang];

    /// Returns the name used on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Config => "config",
            Self::Lang => "lang",
        }
    }

    fn rules(self, parameters: &Arc<RuleParameters>) -> Result<Vec<UpgradeRule>, UpgradeError> {
        let shared = Arc::clone(parameters);
        Ok(match self {
            Self::Code => vec![
                UpgradeRule::RenameClasses(RenameClasses::new(Arc::clone(&shared))?),
                UpgradeRule::ApiChangeWarnings(ApiChangeWarnings::new(shared)),
            ],
            Self::Config => vec![UpgradeRule::UpdateConfigClasses(UpdateConfigClasses::new(
                shared,
            ))],
            Self::Lang => vec![
                UpgradeRule::RenameTranslateKeys(RenameTranslateKeys::new(Arc::clone(&shared))),
                UpgradeRule::RenameLangYamlKeys(RenameLangYamlKeys::new(Arc::clone(&shared))),
                UpgradeRule::RenameTemplateLangKeys(RenameTemplateLangKeys::new(shared)?),
            ],
        })
    }
}

impl fmt::Display for RuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleName {
    type Err = UpgradeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                let allowed: Vec<&str> = Self::ALL.iter().map(|name| name.as_str()).collect();
                UpgradeError::configuration(format!(
                    "unknown rule '{s}'; expected one of: {}",
                    allowed.join(", ")
                ))
            })
    }
}

/// An ordered collection of configured rules.
#[derive(Debug, Clone, Default)]
pub struct UpgradeSpec {
    rules: Vec<UpgradeRule>,
}

impl UpgradeSpec {
    /// Creates an empty spec.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a rule; rules run in the order they were added.
    pub fn add_rule(&mut self, rule: UpgradeRule) {
        self.rules.push(rule);
    }

    /// Builder form of [`Self::add_rule`].
    #[must_use]
    pub fn with_rule(mut self, rule: UpgradeRule) -> Self {
        self.add_rule(rule);
        self
    }

    /// The configured rules, in run order.
    #[must_use]
    pub fn rules(&self) -> &[UpgradeRule] {
        &self.rules
    }

    /// Returns true when no rule is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Builds a spec from rule group names.
    ///
    /// Duplicates are ignored and groups always run in the order of
    /// [`RuleName`].
    ///
    /// # Errors
    ///
    /// Returns [`UpgradeError::Configuration`] for an unknown name or an
    /// empty selection.
    pub fn from_rule_names<I, S>(
        names: I,
        parameters: &Arc<RuleParameters>,
    ) -> Result<Self, UpgradeError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let selected = names
            .into_iter()
            .map(|name| name.as_ref().parse::<RuleName>())
            .collect::<Result<BTreeSet<_>, _>>()?;
        if selected.is_empty() {
            return Err(UpgradeError::configuration("no rules selected"));
        }

        let mut spec = Self::new();
        for name in selected {
            for rule in name.rules(parameters)? {
                spec.add_rule(rule);
            }
        }
        Ok(spec)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn rule_names(spec: &UpgradeSpec) -> Vec<&'static str> {
        spec.rules().iter().map(UpgradeRule::name).collect()
    }

    #[test]
    fn groups_expand_in_fixed_order() {
        let parameters = Arc::new(RuleParameters::new());

        let spec = UpgradeSpec::from_rule_names(["config", "code", "code"], &parameters)
            .expect("valid selection");

        assert_eq!(
            rule_names(&spec),
            vec![
                "rename-classes",
                "api-change-warnings",
                "update-config-classes"
            ]
        );
    }

    #[rstest]
    #[case(&["bogus"])]
    #[case(&[])]
    fn rejects_unusable_selections(#[case] names: &[&str]) {
        let parameters = Arc::new(RuleParameters::new());

        let result = UpgradeSpec::from_rule_names(names.iter(), &parameters);

        assert!(matches!(
            result,
            Err(UpgradeError::Configuration { .. })
        ));
    }

    #[test]
    fn rule_names_round_trip() {
        for name in RuleName::ALL {
            assert_eq!(name.as_str().parse::<RuleName>(), Ok(name));
        }
    }
}
