//! # Rule Administration
//!
//! Validated writes over any [`RuleStore`]. Nothing reaches the store
//! unless the action is in the action table and the names are in bounds.

use crate::observability::{log_event_with_fields, Event};

use super::errors::{StoreError, StoreResult};
use super::rule::{Action, Rule, RuleRow};
use super::store::RuleStore;

/// Administrative surface over a rule store
pub struct RuleAdmin<'a> {
    store: &'a dyn RuleStore,
}

impl<'a> RuleAdmin<'a> {
    pub fn new(store: &'a dyn RuleStore) -> Self {
        Self { store }
    }

    /// Add a rule, or replace action and magnitude of the existing rule for
    /// the same operation
    pub fn add_rule(&self, operation: &str, action: &str, magnitude: i64) -> StoreResult<Rule> {
        let action: Action = action.parse()?;
        let magnitude = u32::try_from(magnitude).map_err(|_| StoreError::InvalidRule {
            field: "magnitude",
            reason: format!("{} is outside 0..={}", magnitude, u32::MAX),
        })?;
        let rule = Rule::new(operation, action, magnitude)?;

        self.store.upsert(&rule.to_row())?;

        log_event_with_fields(
            Event::RuleUpserted,
            &[
                ("action", rule.action().as_str()),
                ("magnitude", &rule.magnitude().to_string()),
                ("operation", rule.operation()),
            ],
        );
        Ok(rule)
    }

    /// Remove every rule
    pub fn clear_all(&self) -> StoreResult<()> {
        self.store.clear_all()?;
        log_event_with_fields(Event::RulesCleared, &[]);
        Ok(())
    }

    /// Every stored row, in store order
    pub fn list(&self) -> StoreResult<Vec<RuleRow>> {
        self.store.list_all()
    }
}
