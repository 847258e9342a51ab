//! Observability subsystem
//!
//! - Structured logging (JSON lines on stderr)
//! - Typed events
//! - Counters
//!
//! Observability is read-only: nothing here can change what the engine
//! decides, and a failed log write is never surfaced.
//!
//! ```ignore
//! use simula::observability::{Event, Logger, MetricsRegistry};
//!
//! Logger::info("FAULT_INJECTED", &[("action", "fail")]);
//! log_event_with_fields(Event::RulesCleared, &[("store", "rules.json")]);
//! ```

mod events;
mod logger;
mod metrics;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};
pub use scope::ObservationScope;

fn severity_of(event: Event) -> Severity {
    if event.is_fatal() {
        Severity::Fatal
    } else {
        Severity::Info
    }
}

/// Log a lifecycle event
pub fn log_event(event: Event) {
    Logger::log(severity_of(event), event.as_str(), &[]);
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(severity_of(event), event.as_str(), fields);
}
