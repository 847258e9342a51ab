//! Counters for the engine, the gate and the reference host
//!
//! Counters only, monotonic except for `rules_loaded`, which tracks the
//! size of the last reload.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::rules::Action;

/// Registry of operational counters
///
/// Shared by every session of a host through an `Arc`. Relaxed ordering is
/// enough; nothing synchronises on these values.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    operations_observed: AtomicU64,
    operations_failed: AtomicU64,
    operations_intercepted: AtomicU64,
    rule_reloads: AtomicU64,
    rules_loaded: AtomicU64,
    faults_fail: AtomicU64,
    faults_crash: AtomicU64,
    faults_delay: AtomicU64,
    faults_terminate: AtomicU64,
    guard_resets: AtomicU64,
    store_errors: AtomicU64,
    connections_refused: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Statement reached the end of the pipeline or failed in it
    pub fn increment_operations_observed(&self) {
        self.operations_observed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_operations_failed(&self) {
        self.operations_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Guard allowed the engine to evaluate rules for an operation
    pub fn increment_operations_intercepted(&self) {
        self.operations_intercepted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a completed reload and the number of rules it produced
    pub fn record_reload(&self, rules: usize) {
        self.rule_reloads.fetch_add(1, Ordering::Relaxed);
        self.rules_loaded.store(rules as u64, Ordering::Relaxed);
    }

    /// Count one injected fault of the given action
    pub fn increment_fault(&self, action: Action) {
        let counter = match action {
            Action::Fail => &self.faults_fail,
            Action::Crash => &self.faults_crash,
            Action::Delay => &self.faults_delay,
            Action::Terminate => &self.faults_terminate,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_guard_resets(&self) {
        self.guard_resets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_store_errors(&self) {
        self.store_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_connections_refused(&self) {
        self.connections_refused.fetch_add(1, Ordering::Relaxed);
    }

    /// Total faults injected across all actions
    pub fn faults_injected(&self) -> u64 {
        self.faults_fail.load(Ordering::Relaxed)
            + self.faults_crash.load(Ordering::Relaxed)
            + self.faults_delay.load(Ordering::Relaxed)
            + self.faults_terminate.load(Ordering::Relaxed)
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            operations_observed: self.operations_observed.load(Ordering::Relaxed),
            operations_failed: self.operations_failed.load(Ordering::Relaxed),
            operations_intercepted: self.operations_intercepted.load(Ordering::Relaxed),
            rule_reloads: self.rule_reloads.load(Ordering::Relaxed),
            rules_loaded: self.rules_loaded.load(Ordering::Relaxed),
            faults_fail: self.faults_fail.load(Ordering::Relaxed),
            faults_crash: self.faults_crash.load(Ordering::Relaxed),
            faults_delay: self.faults_delay.load(Ordering::Relaxed),
            faults_terminate: self.faults_terminate.load(Ordering::Relaxed),
            guard_resets: self.guard_resets.load(Ordering::Relaxed),
            store_errors: self.store_errors.load(Ordering::Relaxed),
            connections_refused: self.connections_refused.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub operations_observed: u64,
    pub operations_failed: u64,
    pub operations_intercepted: u64,
    pub rule_reloads: u64,
    pub rules_loaded: u64,
    pub faults_fail: u64,
    pub faults_crash: u64,
    pub faults_delay: u64,
    pub faults_terminate: u64,
    pub guard_resets: u64,
    pub store_errors: u64,
    pub connections_refused: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_registry_has_zero_values() {
        let snapshot = MetricsRegistry::new().snapshot();
        assert_eq!(snapshot.operations_intercepted, 0);
        assert_eq!(snapshot.rule_reloads, 0);
        assert_eq!(snapshot.faults_fail, 0);
    }

    #[test]
    fn test_fault_counters_by_action() {
        let registry = MetricsRegistry::new();
        registry.increment_fault(Action::Fail);
        registry.increment_fault(Action::Fail);
        registry.increment_fault(Action::Delay);

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.faults_fail, 2);
        assert_eq!(snapshot.faults_delay, 1);
        assert_eq!(snapshot.faults_crash, 0);
        assert_eq!(registry.faults_injected(), 3);
    }

    #[test]
    fn test_rules_loaded_tracks_last_reload() {
        let registry = MetricsRegistry::new();
        registry.record_reload(4);
        registry.record_reload(1);

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.rule_reloads, 2);
        assert_eq!(snapshot.rules_loaded, 1);
    }

    #[test]
    fn test_snapshot_serializes() {
        let registry = MetricsRegistry::new();
        registry.increment_connections_refused();
        let json = serde_json::to_value(registry.snapshot()).unwrap();
        assert_eq!(json["connections_refused"], 1);
    }
}
