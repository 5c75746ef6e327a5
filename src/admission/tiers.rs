//! Rate limit tier registry.

use std::collections::HashSet;
use std::time::Duration;

use crate::config::TierConfig;
use crate::error::{Result, TurnstileError};

/// One rate limit tier: a named window length and call quota.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tier {
    /// Unique tier name
    pub name: String,
    /// Window length
    pub window: Duration,
    /// Calls admitted per window
    pub limit: u64,
}

/// The ordered list of configured tiers.
///
/// Loaded once at startup and read-only thereafter. A call is admitted only
/// if every tier (in registration order) has remaining quota.
#[derive(Debug, Clone)]
pub struct TierRegistry {
    tiers: Vec<Tier>,
}

impl TierRegistry {
    /// Build and validate the registry from configuration.
    ///
    /// Duplicate tier names and non-positive limits or windows are fatal.
    pub fn new(configs: &[TierConfig]) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut tiers = Vec::with_capacity(configs.len());

        for config in configs {
            if config.limit == 0 {
                return Err(TurnstileError::Config(format!(
                    "tier '{}' has a zero limit",
                    config.name
                )));
            }
            if config.window_ms == 0 {
                return Err(TurnstileError::Config(format!(
                    "tier '{}' has a zero window",
                    config.name
                )));
            }
            if !seen.insert(config.name.clone()) {
                return Err(TurnstileError::Config(format!(
                    "duplicate tier name '{}'",
                    config.name
                )));
            }

            tiers.push(Tier {
                name: config.name.clone(),
                window: Duration::from_millis(config.window_ms),
                limit: config.limit,
            });
        }

        Ok(Self { tiers })
    }

    /// Iterate tiers in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Tier> {
        self.tiers.iter()
    }

    /// Look up a tier by name.
    pub fn get(&self, name: &str) -> Option<&Tier> {
        self.tiers.iter().find(|t| t.name == name)
    }

    /// Number of configured tiers.
    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    /// Whether no tiers are configured.
    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tier_config(name: &str, window_ms: u64, limit: u64) -> TierConfig {
        TierConfig {
            name: name.to_string(),
            window_ms,
            limit,
        }
    }

    #[test]
    fn test_registry_preserves_order() {
        let registry = TierRegistry::new(&[
            tier_config("short", 1_000, 3),
            tier_config("medium", 10_000, 20),
            tier_config("long", 60_000, 100),
        ])
        .unwrap();

        let names: Vec<&str> = registry.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["short", "medium", "long"]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_registry_lookup() {
        let registry = TierRegistry::new(&[tier_config("short", 1_000, 3)]).unwrap();

        let tier = registry.get("short").unwrap();
        assert_eq!(tier.window, Duration::from_secs(1));
        assert_eq!(tier.limit, 3);
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_zero_limit_rejected() {
        let err = TierRegistry::new(&[tier_config("bad", 1_000, 0)]).unwrap_err();
        assert!(matches!(err, TurnstileError::Config(_)));
    }

    #[test]
    fn test_zero_window_rejected() {
        let err = TierRegistry::new(&[tier_config("bad", 0, 5)]).unwrap_err();
        assert!(matches!(err, TurnstileError::Config(_)));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let err = TierRegistry::new(&[
            tier_config("default", 1_000, 5),
            tier_config("default", 60_000, 100),
        ])
        .unwrap_err();
        assert!(matches!(err, TurnstileError::Config(_)));
    }

    #[test]
    fn test_identical_configs_load_identically() {
        let configs = vec![
            tier_config("short", 1_000, 3),
            tier_config("long", 60_000, 100),
        ];

        let first = TierRegistry::new(&configs).unwrap();
        let second = TierRegistry::new(&configs).unwrap();

        let a: Vec<&Tier> = first.iter().collect();
        let b: Vec<&Tier> = second.iter().collect();
        assert_eq!(a, b);
    }
}
