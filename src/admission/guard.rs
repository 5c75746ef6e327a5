//! Core admission guard implementation.

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, trace};

use super::context::CallContext;
use super::counter::CounterStore;
use super::rules::{Decision, RuleResolver};
use super::tiers::TierRegistry;
use crate::error::{Result, TurnstileError};

/// Decides, per inbound call, whether it may proceed to its handler.
///
/// The guard holds no lock of its own; the counter store is the only shared
/// mutable state it touches. It can be shared across tasks behind an `Arc`.
pub struct AdmissionGuard<S: CounterStore> {
    tiers: TierRegistry,
    rules: RuleResolver,
    store: Arc<S>,
}

impl<S: CounterStore> AdmissionGuard<S> {
    /// Create a guard over the given tiers, rules, and counter store.
    pub fn new(tiers: TierRegistry, rules: RuleResolver, store: Arc<S>) -> Self {
        rules.check_tiers(&tiers);
        Self {
            tiers,
            rules,
            store,
        }
    }

    /// Admit or reject one call.
    ///
    /// Tiers are evaluated in registration order and all must have remaining
    /// quota. Evaluation stops at the first rejecting tier: earlier tiers
    /// have already been counted, later tiers are not touched.
    pub async fn admit(&self, call: &CallContext) -> Result<()> {
        let client = call.client_key()?;

        trace!(
            operation = %call.operation,
            group = %call.group,
            client = %client,
            "Checking admission"
        );

        match self.rules.resolve(&call.operation, &call.group) {
            Decision::SkipAll => {
                debug!(operation = %call.operation, "Skipping all tiers");
                Ok(())
            }
            Decision::SkipTiers(skipped) => self.evaluate(call, &client, Some(&skipped)).await,
            Decision::Proceed => self.evaluate(call, &client, None).await,
        }
    }

    async fn evaluate(
        &self,
        call: &CallContext,
        client: &str,
        skipped: Option<&HashSet<String>>,
    ) -> Result<()> {
        for tier in self.tiers.iter() {
            if skipped.is_some_and(|s| s.contains(&tier.name)) {
                trace!(operation = %call.operation, tier = %tier.name, "Tier skipped by rule");
                continue;
            }

            let (limit, window) =
                match self
                    .rules
                    .limit_override(&call.operation, &call.group, &tier.name)
                {
                    Some(replacement) => (replacement.limit, replacement.window),
                    None => (tier.limit, tier.window),
                };

            let decision = self
                .store
                .check_and_increment(&tier.name, client, window, limit)
                .await?;

            if !decision.admitted {
                debug!(
                    operation = %call.operation,
                    tier = %tier.name,
                    client = %client,
                    "Rate limit exceeded"
                );
                return Err(TurnstileError::Throttled {
                    tier: tier.name.clone(),
                    retry_after: decision.retry_after,
                });
            }
        }

        Ok(())
    }
}
