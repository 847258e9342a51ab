//! Observable events
//!
//! Every line the engine, the gate and the reference host log is named by
//! one of these variants.

use std::fmt;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Configuration file loaded
    ConfigLoaded,

    // Engine lifecycle
    /// Lifecycle observer attached to a session's hub
    ObserverRegistered,
    /// Engine removed from a session's pipeline
    EngineDetached,
    /// Rule feature not installed, registry left empty
    RulesUnavailable,
    /// Stored row skipped during reload
    RuleSkipped,
    /// Guard forced back to idle by a lifecycle event
    GuardReset,
    /// Reload or lookup failed against the rule store
    StoreReadFailed,

    // Dispatch
    /// A rule matched and its action is about to run
    FaultInjected,
    /// A delay action finished sleeping
    DelayComplete,

    // Administration
    /// Rule inserted or replaced
    RuleUpserted,
    /// All rules removed
    RulesCleared,

    // Host
    /// Session opened
    SessionOpened,
    /// Session closed normally
    SessionClosed,
    /// Session ended by a FATAL-level error
    SessionTerminated,
    /// Process ended by a PANIC-level error
    ProcessPanic,
    /// Statement completed
    OperationComplete,
    /// Statement failed
    OperationFailed,
    /// Connection refused by the gate
    ConnectionRefused,
    /// Connection closed before authentication
    ConnectionDropped,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",

            Event::ObserverRegistered => "SIMULA_OBSERVER_REGISTERED",
            Event::EngineDetached => "SIMULA_DETACHED",
            Event::RulesUnavailable => "SIMULA_NOT_INSTALLED",
            Event::RuleSkipped => "RULE_SKIPPED",
            Event::GuardReset => "GUARD_RESET",
            Event::StoreReadFailed => "RULE_STORE_READ_FAILED",

            Event::FaultInjected => "FAULT_INJECTED",
            Event::DelayComplete => "DELAY_COMPLETE",

            Event::RuleUpserted => "RULE_UPSERTED",
            Event::RulesCleared => "RULES_CLEARED",

            Event::SessionOpened => "SESSION_OPENED",
            Event::SessionClosed => "SESSION_CLOSED",
            Event::SessionTerminated => "SESSION_TERMINATED",
            Event::ProcessPanic => "PROCESS_PANIC",
            Event::OperationComplete => "OPERATION_COMPLETE",
            Event::OperationFailed => "OPERATION_FAILED",
            Event::ConnectionRefused => "CONNECTION_REFUSED",
            Event::ConnectionDropped => "CONNECTION_DROPPED",
        }
    }

    /// Returns true if this event indicates a fatal condition
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::SessionTerminated | Event::ProcessPanic)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names_are_upper_snake() {
        let events = [
            Event::ConfigLoaded,
            Event::ObserverRegistered,
            Event::EngineDetached,
            Event::RulesUnavailable,
            Event::RuleSkipped,
            Event::GuardReset,
            Event::StoreReadFailed,
            Event::FaultInjected,
            Event::DelayComplete,
            Event::RuleUpserted,
            Event::RulesCleared,
            Event::SessionOpened,
            Event::SessionClosed,
            Event::SessionTerminated,
            Event::ProcessPanic,
            Event::OperationComplete,
            Event::OperationFailed,
            Event::ConnectionRefused,
            Event::ConnectionDropped,
        ];

        for event in events {
            let s = event.as_str();
            assert!(!s.is_empty());
            assert!(s.chars().all(|c| c.is_ascii_uppercase() || c == '_'));
        }
    }

    #[test]
    fn test_fatal_events() {
        assert!(Event::ProcessPanic.is_fatal());
        assert!(Event::SessionTerminated.is_fatal());
        assert!(!Event::FaultInjected.is_fatal());
    }

    #[test]
    fn test_event_display() {
        assert_eq!(format!("{}", Event::GuardReset), "GUARD_RESET");
    }
}
