//! Built-in operation handlers.
//!
//! These return mock payloads; real data sources slot in behind the same
//! handler signatures without touching admission control.

use serde_json::json;
use std::time::Duration;

use super::registry::{Operation, OperationRegistry};
use crate::admission::{OverrideRule, TierOverride, TierRule};
use crate::error::Result;

/// Build the registry of operations the gateway ships with.
///
/// `publicUserStats` carries no rule here: it is exempted through the static
/// bypass list instead, which wins regardless of declared metadata.
pub fn builtin_registry() -> Result<OperationRegistry> {
    let mut registry = OperationRegistry::new();

    registry.register(Operation::new("users", "Users", &[], |_args| async {
        Ok(json!([
            { "id": "1", "email": "ada@example.com" },
            { "id": "2", "email": "grace@example.com" },
        ]))
    }))?;

    registry.register(Operation::new(
        "publicUserStats",
        "Users",
        &[],
        |_args| async {
            Ok(json!({
                "totalUsers": 100,
                "activeUsers": 50,
            }))
        },
    ))?;

    // Login keeps the default tier but with a far tighter quota.
    registry.register_with_rule(
        Operation::new("login", "Users", &["email", "password"], |args| async move {
            let email = args.get("email").cloned().unwrap_or_default();
            Ok(json!({
                "token": "mock-token",
                "email": email,
            }))
        }),
        OverrideRule::PerTier(
            [(
                "default".to_string(),
                TierRule::Limit(TierOverride {
                    limit: 5,
                    window: Duration::from_secs(60),
                }),
            )]
            .into_iter()
            .collect(),
        ),
    )?;

    registry.register_with_rule(
        Operation::new("healthCheck", "Health", &[], |_args| async {
            Ok(json!({
                "status": "ok",
                "info": {
                    "api": { "status": "up" },
                    "counters": { "status": "up" },
                },
            }))
        }),
        OverrideRule::Skip(true),
    )?;

    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_builtin_operations_present() {
        let registry = builtin_registry().unwrap();

        for name in ["users", "publicUserStats", "login", "healthCheck"] {
            assert!(registry.get(name).is_some(), "missing operation {name}");
        }
    }

    #[test]
    fn test_login_declares_tighter_default_quota() {
        let registry = builtin_registry().unwrap();
        let (operation_rules, _) = registry.rules();

        match operation_rules.get("login") {
            Some(OverrideRule::PerTier(per_tier)) => match per_tier.get("default") {
                Some(TierRule::Limit(replacement)) => {
                    assert_eq!(replacement.limit, 5);
                    assert_eq!(replacement.window, Duration::from_secs(60));
                }
                other => panic!("expected a limit override, got {other:?}"),
            },
            other => panic!("expected a per-tier rule, got {other:?}"),
        }
    }

    #[test]
    fn test_health_check_skips_throttling() {
        let registry = builtin_registry().unwrap();
        let (operation_rules, _) = registry.rules();
        assert_eq!(
            operation_rules.get("healthCheck"),
            Some(&OverrideRule::Skip(true))
        );
    }

    #[tokio::test]
    async fn test_health_check_payload() {
        let registry = builtin_registry().unwrap();
        let operation = registry.get("healthCheck").unwrap();

        let payload = (operation.handler)(HashMap::new()).await.unwrap();
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["info"]["api"]["status"], "up");
    }

    #[tokio::test]
    async fn test_login_echoes_email() {
        let registry = builtin_registry().unwrap();
        let operation = registry.get("login").unwrap();

        let mut args = HashMap::new();
        args.insert("email".to_string(), "ada@example.com".to_string());
        args.insert("password".to_string(), "hunter2".to_string());

        let payload = (operation.handler)(args).await.unwrap();
        assert_eq!(payload["token"], "mock-token");
        assert_eq!(payload["email"], "ada@example.com");
    }
}
