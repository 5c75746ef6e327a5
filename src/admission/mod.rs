//! Admission control: tiers, counters, override rules, and the guard.

mod context;
mod counter;
mod guard;
mod rules;
mod tiers;

pub use context::{CallContext, Channel};
pub use counter::{CounterDecision, CounterKey, CounterStore, MemoryCounterStore};
pub use guard::AdmissionGuard;
pub use rules::{Decision, OverrideRule, RuleResolver, TierOverride, TierRule};
pub use tiers::{Tier, TierRegistry};
