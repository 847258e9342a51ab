//! Lifecycle observer that puts the guard back to idle on every
//! transaction boundary, however the transaction ended.

use std::sync::Arc;

use crate::core::{TransactionEvent, TransactionObserver};
use crate::observability::{Event, Logger, MetricsRegistry};

use super::guard::{Guard, GuardState};

pub struct GuardResetObserver {
    guard: Arc<Guard>,
    metrics: Arc<MetricsRegistry>,
}

impl GuardResetObserver {
    pub fn new(guard: Arc<Guard>, metrics: Arc<MetricsRegistry>) -> Self {
        Self { guard, metrics }
    }
}

impl TransactionObserver for GuardResetObserver {
    fn on_event(&self, event: TransactionEvent) {
        let previous = self.guard.reset();
        // Only count resets that actually released a held guard
        if previous != GuardState::Idle {
            self.metrics.increment_guard_resets();
            Logger::trace(
                Event::GuardReset.as_str(),
                &[("event", event.as_str()), ("previous", previous.as_str())],
            );
        }
    }
}
