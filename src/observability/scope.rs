//! ObservationScope for paired begin/complete logging
//!
//! - Logs `{name}_BEGIN` on creation (TRACE)
//! - Logs `{name}_COMPLETE` on `complete` (INFO)
//! - Logs `{name}_FAILED` on `fail` (ERROR)
//! - Logs `{name}_INCOMPLETE` on drop if neither was called (WARN)

use std::cell::Cell;
use std::time::Instant;

use super::logger::Logger;

/// A scope that logs the begin and the outcome of a unit of work
///
/// ```ignore
/// let scope = ObservationScope::with_fields("RULE_RELOAD", &[("session", &id)]);
/// let rules = load()?; // early return logs RULE_RELOAD_INCOMPLETE
/// scope.complete_with_fields(&[("rules", &rules.len().to_string())]);
/// ```
pub struct ObservationScope {
    name: &'static str,
    completed: Cell<bool>,
    fields: Vec<(&'static str, String)>,
    started_at: Instant,
}

impl ObservationScope {
    /// Create a new observation scope
    pub fn new(name: &'static str) -> Self {
        Self::with_fields(name, &[])
    }

    /// Create a new observation scope carrying fields on every line it logs
    pub fn with_fields(name: &'static str, fields: &[(&'static str, &str)]) -> Self {
        let scope = Self {
            name,
            completed: Cell::new(false),
            fields: fields.iter().map(|(k, v)| (*k, v.to_string())).collect(),
            started_at: Instant::now(),
        };
        Logger::trace(&format!("{}_BEGIN", name), &scope.field_refs());
        scope
    }

    fn field_refs(&self) -> Vec<(&str, &str)> {
        self.fields.iter().map(|(k, v)| (*k, v.as_str())).collect()
    }

    /// Mark the scope as successfully completed
    pub fn complete(self) {
        self.complete_with_fields(&[]);
    }

    /// Mark the scope as successfully completed with additional fields
    pub fn complete_with_fields(self, extra_fields: &[(&str, &str)]) {
        self.completed.set(true);
        let elapsed = self.started_at.elapsed().as_millis().to_string();

        let mut all_fields = self.field_refs();
        all_fields.extend(extra_fields.iter().copied());
        all_fields.push(("elapsed_ms", &elapsed));

        Logger::info(&format!("{}_COMPLETE", self.name), &all_fields);
    }

    /// Mark the scope as failed with a reason
    pub fn fail(self, reason: &str) {
        self.completed.set(true);
        let mut all_fields = self.field_refs();
        all_fields.push(("reason", reason));
        Logger::error(&format!("{}_FAILED", self.name), &all_fields);
    }

    /// Check if the scope has been completed
    pub fn is_completed(&self) -> bool {
        self.completed.get()
    }
}

impl Drop for ObservationScope {
    fn drop(&mut self) {
        if !self.completed.get() {
            let mut all_fields = self.field_refs();
            all_fields.push(("reason", "scope dropped without completion"));
            Logger::warn(&format!("{}_INCOMPLETE", self.name), &all_fields);
        }
    }
}
