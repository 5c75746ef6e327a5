//! Override rule resolution for operations and groups.
//!
//! Rules are attached to an operation or to its enclosing group at
//! registration time. An operation that declared any rule silences its group
//! entirely; a group rule only applies when the operation is silent. The
//! static bypass list outranks both.

use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracing::warn;

use super::tiers::TierRegistry;

/// Replacement limit and window for one tier within an override scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierOverride {
    /// Replacement call quota
    pub limit: u64,
    /// Replacement window length
    pub window: Duration,
}

/// Per-tier directive inside an override rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TierRule {
    /// Skip this tier entirely (true) or keep it explicitly (false)
    Skip(bool),
    /// Replace the tier's limit and window for this scope
    Limit(TierOverride),
}

/// An override rule attached to an operation or group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverrideRule {
    /// Blanket skip of all tiers (true) or an explicit opt-in to throttling (false)
    Skip(bool),
    /// Per-tier directives keyed by tier name
    PerTier(HashMap<String, TierRule>),
}

/// Outcome of rule resolution for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Evaluate every tier
    Proceed,
    /// Admit without consulting any tier
    SkipAll,
    /// Evaluate all tiers except the named ones
    SkipTiers(HashSet<String>),
}

/// Resolves which bypass and override rules apply to a call.
#[derive(Debug, Clone, Default)]
pub struct RuleResolver {
    bypass: HashSet<String>,
    operations: HashMap<String, OverrideRule>,
    groups: HashMap<String, OverrideRule>,
}

impl RuleResolver {
    /// Create a resolver from the static bypass list and the override maps
    /// collected during operation registration.
    pub fn new(
        bypass: HashSet<String>,
        operations: HashMap<String, OverrideRule>,
        groups: HashMap<String, OverrideRule>,
    ) -> Self {
        Self {
            bypass,
            operations,
            groups,
        }
    }

    /// Decide whether the call should bypass some or all tiers.
    pub fn resolve(&self, operation: &str, group: &str) -> Decision {
        // Bypass-by-name wins over every declared rule.
        if self.bypass.contains(operation) {
            return Decision::SkipAll;
        }

        match self.winning_rule(operation, group) {
            Some(rule) => Self::decision_for(rule),
            None => Decision::Proceed,
        }
    }

    /// Effective limit override for a tier under the winning rule, if any.
    pub fn limit_override(&self, operation: &str, group: &str, tier: &str) -> Option<TierOverride> {
        match self.winning_rule(operation, group)? {
            OverrideRule::PerTier(rules) => match rules.get(tier) {
                Some(TierRule::Limit(replacement)) => Some(*replacement),
                _ => None,
            },
            OverrideRule::Skip(_) => None,
        }
    }

    /// Warn about per-tier rules referencing tiers absent from the registry.
    /// Such rules are ignored at evaluation time.
    pub fn check_tiers(&self, tiers: &TierRegistry) {
        for (scope, rule) in self.operations.iter().chain(self.groups.iter()) {
            if let OverrideRule::PerTier(per_tier) = rule {
                for name in per_tier.keys() {
                    if tiers.get(name).is_none() {
                        warn!(
                            scope = %scope,
                            tier = %name,
                            "Override rule references an unknown tier"
                        );
                    }
                }
            }
        }
    }

    // An operation that declared any rule silences its group entirely.
    fn winning_rule(&self, operation: &str, group: &str) -> Option<&OverrideRule> {
        self.operations
            .get(operation)
            .or_else(|| self.groups.get(group))
    }

    fn decision_for(rule: &OverrideRule) -> Decision {
        match rule {
            OverrideRule::Skip(true) => Decision::SkipAll,
            OverrideRule::Skip(false) => Decision::Proceed,
            OverrideRule::PerTier(per_tier) => {
                let skipped: HashSet<String> = per_tier
                    .iter()
                    .filter(|(_, r)| matches!(r, TierRule::Skip(true)))
                    .map(|(name, _)| name.clone())
                    .collect();

                if skipped.is_empty() {
                    Decision::Proceed
                } else {
                    Decision::SkipTiers(skipped)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(
        bypass: &[&str],
        operations: Vec<(&str, OverrideRule)>,
        groups: Vec<(&str, OverrideRule)>,
    ) -> RuleResolver {
        RuleResolver::new(
            bypass.iter().map(|s| s.to_string()).collect(),
            operations
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            groups
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }

    fn per_tier(entries: Vec<(&str, TierRule)>) -> OverrideRule {
        OverrideRule::PerTier(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }

    #[test]
    fn test_no_rules_proceeds() {
        let resolver = resolver(&[], vec![], vec![]);
        assert_eq!(resolver.resolve("users", "Users"), Decision::Proceed);
    }

    #[test]
    fn test_bypass_list_wins() {
        // Even an explicit opt-in to throttling loses to the bypass list.
        let resolver = resolver(
            &["publicUserStats"],
            vec![("publicUserStats", OverrideRule::Skip(false))],
            vec![],
        );
        assert_eq!(
            resolver.resolve("publicUserStats", "Users"),
            Decision::SkipAll
        );
    }

    #[test]
    fn test_operation_blanket_skip() {
        let resolver = resolver(&[], vec![("healthCheck", OverrideRule::Skip(true))], vec![]);
        assert_eq!(resolver.resolve("healthCheck", "Health"), Decision::SkipAll);
    }

    #[test]
    fn test_operation_per_tier_skip() {
        let resolver = resolver(
            &[],
            vec![(
                "export",
                per_tier(vec![("burst", TierRule::Skip(true)), ("long", TierRule::Skip(false))]),
            )],
            vec![],
        );

        let decision = resolver.resolve("export", "Reports");
        let expected: HashSet<String> = ["burst".to_string()].into_iter().collect();
        assert_eq!(decision, Decision::SkipTiers(expected));
    }

    #[test]
    fn test_operation_overrides_group() {
        // Explicit skip=false on the operation beats skip=true on its group.
        let resolver = resolver(
            &[],
            vec![("login", OverrideRule::Skip(false))],
            vec![("Users", OverrideRule::Skip(true))],
        );
        assert_eq!(resolver.resolve("login", "Users"), Decision::Proceed);
    }

    #[test]
    fn test_group_applies_when_operation_silent() {
        let resolver = resolver(&[], vec![], vec![("Users", OverrideRule::Skip(true))]);
        assert_eq!(resolver.resolve("users", "Users"), Decision::SkipAll);
    }

    #[test]
    fn test_limit_override_without_skip_proceeds() {
        let resolver = resolver(
            &[],
            vec![(
                "login",
                per_tier(vec![(
                    "default",
                    TierRule::Limit(TierOverride {
                        limit: 5,
                        window: Duration::from_secs(60),
                    }),
                )]),
            )],
            vec![("Users", OverrideRule::Skip(true))],
        );

        // A declared limit override is still a declared rule: the group's
        // blanket skip never applies to this operation.
        assert_eq!(resolver.resolve("login", "Users"), Decision::Proceed);

        let replacement = resolver.limit_override("login", "Users", "default").unwrap();
        assert_eq!(replacement.limit, 5);
        assert_eq!(replacement.window, Duration::from_secs(60));
        assert!(resolver.limit_override("login", "Users", "burst").is_none());
    }

    #[test]
    fn test_group_limit_override_applies_when_operation_silent() {
        let resolver = resolver(
            &[],
            vec![],
            vec![(
                "Users",
                per_tier(vec![(
                    "default",
                    TierRule::Limit(TierOverride {
                        limit: 50,
                        window: Duration::from_secs(60),
                    }),
                )]),
            )],
        );

        let replacement = resolver.limit_override("users", "Users", "default").unwrap();
        assert_eq!(replacement.limit, 50);
    }

    #[test]
    fn test_operation_rule_silences_group_overrides() {
        let resolver = resolver(
            &[],
            vec![("users", OverrideRule::Skip(false))],
            vec![(
                "Users",
                per_tier(vec![(
                    "default",
                    TierRule::Limit(TierOverride {
                        limit: 50,
                        window: Duration::from_secs(60),
                    }),
                )]),
            )],
        );

        assert!(resolver.limit_override("users", "Users", "default").is_none());
    }
}
