//! # Rule Registry
//!
//! In-memory snapshot of the rule set. Never patched: every reload clears it
//! and rebuilds it from a full scan, in store order.

use super::errors::StoreError;
use super::rule::{Rule, RuleRow};

/// A stored row that could not become a rule
#[derive(Debug, Clone)]
pub struct SkippedRow {
    pub row: RuleRow,
    pub reason: StoreError,
}

/// Ordered rule snapshot
#[derive(Debug, Default, Clone)]
pub struct RuleRegistry {
    rules: Vec<Rule>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every rule
    pub fn clear(&mut self) {
        self.rules.clear();
    }

    /// Replace the snapshot with `rows`, skipping rows that do not validate
    pub fn rebuild(&mut self, rows: &[RuleRow]) -> Vec<SkippedRow> {
        self.rules.clear();
        let mut skipped = Vec::new();

        for row in rows {
            match Rule::try_from(row) {
                Ok(rule) => self.rules.push(rule),
                Err(reason) => skipped.push(SkippedRow {
                    row: row.clone(),
                    reason,
                }),
            }
        }

        skipped
    }

    /// First rule whose operation equals `tag`, ignoring case
    ///
    /// Stores keep operations unique; if one does not, the earliest row wins.
    pub fn find(&self, tag: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.matches(tag))
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
