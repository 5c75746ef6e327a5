//! Operation registry: routing metadata and override rules.
//!
//! Override rules are attached here, at registration time, rather than
//! discovered by inspecting handlers at runtime. The registry is built once
//! at startup and read-only thereafter.

use futures::future::BoxFuture;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use crate::admission::OverrideRule;
use crate::error::{Result, TurnstileError};

/// Handler invoked once a call has been admitted. Receives the call's
/// arguments unchanged and returns a JSON payload.
pub type Handler =
    Arc<dyn Fn(HashMap<String, String>) -> BoxFuture<'static, Result<Value>> + Send + Sync>;

/// A named operation exposed through the gateway.
#[derive(Clone)]
pub struct Operation {
    /// Unique operation name
    pub name: String,
    /// Name of the enclosing group
    pub group: String,
    /// Argument names, in declaration order
    pub arguments: Vec<String>,
    /// The wrapped handler
    pub handler: Handler,
}

impl Operation {
    /// Create an operation from an async handler function.
    pub fn new<F, Fut>(name: &str, group: &str, arguments: &[&str], handler: F) -> Self
    where
        F: Fn(HashMap<String, String>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        Self {
            name: name.to_string(),
            group: group.to_string(),
            arguments: arguments.iter().map(|a| a.to_string()).collect(),
            handler: Arc::new(move |args| -> BoxFuture<'static, Result<Value>> {
                Box::pin(handler(args))
            }),
        }
    }
}

/// Registry of every operation the gateway exposes, plus the override rules
/// declared alongside them.
#[derive(Clone, Default)]
pub struct OperationRegistry {
    operations: HashMap<String, Operation>,
    order: Vec<String>,
    operation_rules: HashMap<String, OverrideRule>,
    group_rules: HashMap<String, OverrideRule>,
}

impl OperationRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an operation with no override rule of its own.
    pub fn register(&mut self, operation: Operation) -> Result<()> {
        if self.operations.contains_key(&operation.name) {
            return Err(TurnstileError::Config(format!(
                "duplicate operation name '{}'",
                operation.name
            )));
        }
        self.order.push(operation.name.clone());
        self.operations.insert(operation.name.clone(), operation);
        Ok(())
    }

    /// Register an operation together with its override rule.
    pub fn register_with_rule(&mut self, operation: Operation, rule: OverrideRule) -> Result<()> {
        self.operation_rules.insert(operation.name.clone(), rule);
        self.register(operation)
    }

    /// Declare an override rule for a whole group.
    pub fn set_group_rule(&mut self, group: &str, rule: OverrideRule) {
        self.group_rules.insert(group.to_string(), rule);
    }

    /// Look up an operation by name.
    pub fn get(&self, name: &str) -> Option<&Operation> {
        self.operations.get(name)
    }

    /// Iterate operations in registration order.
    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        self.order.iter().filter_map(|name| self.operations.get(name))
    }

    /// Group names, sorted and deduplicated.
    pub fn groups(&self) -> Vec<String> {
        self.operations()
            .map(|op| op.group.clone())
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// The override rule maps collected during registration, for the resolver.
    pub fn rules(&self) -> (HashMap<String, OverrideRule>, HashMap<String, OverrideRule>) {
        (self.operation_rules.clone(), self.group_rules.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn noop(name: &str, group: &str) -> Operation {
        Operation::new(name, group, &[], |_args| async { Ok(json!(null)) })
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = OperationRegistry::new();
        registry.register(noop("users", "Users")).unwrap();

        let operation = registry.get("users").unwrap();
        assert_eq!(operation.group, "Users");
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut registry = OperationRegistry::new();
        registry.register(noop("users", "Users")).unwrap();

        let err = registry.register(noop("users", "Other")).unwrap_err();
        assert!(matches!(err, TurnstileError::Config(_)));
    }

    #[test]
    fn test_registration_order_preserved() {
        let mut registry = OperationRegistry::new();
        registry.register(noop("b", "Users")).unwrap();
        registry.register(noop("a", "Users")).unwrap();

        let names: Vec<&str> = registry.operations().map(|op| op.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn test_rules_collected_per_scope() {
        let mut registry = OperationRegistry::new();
        registry
            .register_with_rule(noop("healthCheck", "Health"), OverrideRule::Skip(true))
            .unwrap();
        registry.set_group_rule("Users", OverrideRule::Skip(false));

        let (operation_rules, group_rules) = registry.rules();
        assert_eq!(
            operation_rules.get("healthCheck"),
            Some(&OverrideRule::Skip(true))
        );
        assert_eq!(group_rules.get("Users"), Some(&OverrideRule::Skip(false)));
    }

    #[test]
    fn test_groups_sorted_and_deduplicated() {
        let mut registry = OperationRegistry::new();
        registry.register(noop("users", "Users")).unwrap();
        registry.register(noop("login", "Users")).unwrap();
        registry.register(noop("healthCheck", "Health")).unwrap();

        assert_eq!(registry.groups(), vec!["Health", "Users"]);
    }

    #[tokio::test]
    async fn test_handler_receives_arguments() {
        let operation = Operation::new("echo", "Debug", &["value"], |args| async move {
            Ok(json!({ "value": args.get("value").cloned().unwrap_or_default() }))
        });

        let mut args = HashMap::new();
        args.insert("value".to_string(), "hello".to_string());

        let payload = (operation.handler)(args).await.unwrap();
        assert_eq!(payload, json!({ "value": "hello" }));
    }
}
