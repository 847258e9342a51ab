//! # Interception Guard
//!
//! Decides whether an intercepted operation is consulted against the rules
//! and keeps the engine from intercepting its own bookkeeping.
//!
//! State machine:
//!
//! ```text
//!   Idle --enter--> Evaluating --begin_dispatch--> Dispatching
//!    ^                  |                              |
//!    +---- release -----+------------ release ---------+
//!    +---- reset (any lifecycle event, from any state) +
//! ```

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use crate::core::Operation;

/// Guard state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum GuardState {
    /// Not inside the engine
    Idle = 0,
    /// Reloading rules and looking up the operation
    Evaluating = 1,
    /// Running a matched action
    Dispatching = 2,
}

impl GuardState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => GuardState::Evaluating,
            2 => GuardState::Dispatching,
            _ => GuardState::Idle,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GuardState::Idle => "idle",
            GuardState::Evaluating => "evaluating",
            GuardState::Dispatching => "dispatching",
        }
    }
}

/// Reentrancy guard of one engine
#[derive(Debug)]
pub struct Guard {
    state: AtomicU8,
    observer_registered: AtomicBool,
}

impl Default for Guard {
    fn default() -> Self {
        Self::new()
    }
}

impl Guard {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(GuardState::Idle as u8),
            observer_registered: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> GuardState {
        GuardState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// True while evaluating or dispatching
    pub fn in_progress(&self) -> bool {
        self.state() != GuardState::Idle
    }

    /// Whether `op` should be checked against the rules
    ///
    /// Pure: only reads the guard.
    pub fn should_activate(&self, enabled: bool, op: &Operation, in_transaction: bool) -> bool {
        enabled && !self.in_progress() && in_transaction && !op.is_transaction_start()
    }

    /// Idle -> Evaluating; false if the guard was already held
    pub fn enter(&self) -> bool {
        self.state
            .compare_exchange(
                GuardState::Idle as u8,
                GuardState::Evaluating as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
    }

    /// Evaluating -> Dispatching
    pub fn begin_dispatch(&self) {
        let _ = self.state.compare_exchange(
            GuardState::Evaluating as u8,
            GuardState::Dispatching as u8,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
    }

    /// Back to Idle after an action returned normally
    pub fn release(&self) {
        self.state.store(GuardState::Idle as u8, Ordering::SeqCst);
    }

    /// Forced back to Idle by a lifecycle event
    pub fn reset(&self) -> GuardState {
        GuardState::from_u8(self.state.swap(GuardState::Idle as u8, Ordering::SeqCst))
    }

    /// Record that the lifecycle observer is attached; true on the first call only
    pub fn mark_observer_registered(&self) -> bool {
        !self.observer_registered.swap(true, Ordering::SeqCst)
    }

    /// Allow a later call to attach the observer again
    pub fn clear_observer_registered(&self) {
        self.observer_registered.store(false, Ordering::SeqCst);
    }

    pub fn observer_registered(&self) -> bool {
        self.observer_registered.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(sql: &str) -> Operation {
        Operation::parse(sql).unwrap()
    }

    #[test]
    fn test_should_activate_requires_every_condition() {
        let guard = Guard::new();
        let drop_table = op("DROP TABLE x");

        assert!(guard.should_activate(true, &drop_table, true));
        assert!(!guard.should_activate(false, &drop_table, true));
        assert!(!guard.should_activate(true, &drop_table, false));

        assert!(guard.enter());
        assert!(!guard.should_activate(true, &drop_table, true));
    }

    #[test]
    fn test_transaction_start_never_activates() {
        let guard = Guard::new();
        assert!(!guard.should_activate(true, &op("BEGIN"), true));
        assert!(!guard.should_activate(true, &op("start transaction"), true));
        assert!(guard.should_activate(true, &op("COMMIT"), true));
    }

    #[test]
    fn test_state_transitions() {
        let guard = Guard::new();
        assert_eq!(guard.state(), GuardState::Idle);

        assert!(guard.enter());
        assert!(!guard.enter());
        assert_eq!(guard.state(), GuardState::Evaluating);

        guard.begin_dispatch();
        assert_eq!(guard.state(), GuardState::Dispatching);

        guard.release();
        assert!(!guard.in_progress());
    }

    #[test]
    fn test_reset_from_any_state() {
        let guard = Guard::new();
        guard.enter();
        guard.begin_dispatch();

        assert_eq!(guard.reset(), GuardState::Dispatching);
        assert_eq!(guard.state(), GuardState::Idle);
        assert_eq!(guard.reset(), GuardState::Idle);
    }

    #[test]
    fn test_begin_dispatch_requires_evaluating() {
        let guard = Guard::new();
        guard.begin_dispatch();
        assert_eq!(guard.state(), GuardState::Idle);
    }

    #[test]
    fn test_observer_registered_once() {
        let guard = Guard::new();
        assert!(!guard.observer_registered());
        assert!(guard.mark_observer_registered());
        assert!(!guard.mark_observer_registered());
        assert!(guard.observer_registered());
    }
}
