//! # Action Table
//!
//! One function per [`Action`]. `fail`, `crash` and `terminate` never
//! return normally: they produce the error the host escalates. `delay`
//! suspends the calling task and then lets the operation run.

use std::time::Duration;

use crate::observability::{Event, Logger};
use crate::rules::{Action, Rule};

use super::errors::{SimulaError, SimulaResult};

/// A matched rule bound to the operation it fired on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    pub operation: String,
    pub action: Action,
    pub magnitude: u32,
}

impl Fault {
    pub fn new(rule: &Rule, tag: &str) -> Self {
        Self {
            operation: tag.to_string(),
            action: rule.action(),
            magnitude: rule.magnitude(),
        }
    }

    /// Sleep a `delay` fault imposes
    pub fn delay(&self) -> Duration {
        Duration::from_secs(u64::from(self.magnitude))
    }
}

/// Run the fault's action
pub async fn perform(fault: &Fault) -> SimulaResult<()> {
    let operation = fault.operation.clone();
    match fault.action {
        Action::Fail => Err(SimulaError::InjectedFailure { operation }),
        Action::Crash => Err(SimulaError::InjectedCrash { operation }),
        Action::Terminate => Err(SimulaError::InjectedTermination { operation }),
        Action::Delay => {
            tokio::time::sleep(fault.delay()).await;
            Logger::info(
                Event::DelayComplete.as_str(),
                &[
                    ("operation", &fault.operation),
                    ("seconds", &fault.magnitude.to_string()),
                ],
            );
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fault(action: Action, magnitude: u32) -> Fault {
        Fault {
            operation: "COMMIT".into(),
            action,
            magnitude,
        }
    }

    #[tokio::test]
    async fn test_fail_crash_terminate_produce_errors() {
        let err = perform(&fault(Action::Fail, 0)).await.unwrap_err();
        assert!(matches!(err, SimulaError::InjectedFailure { .. }));

        let err = perform(&fault(Action::Crash, 0)).await.unwrap_err();
        assert!(matches!(err, SimulaError::InjectedCrash { .. }));

        let err = perform(&fault(Action::Terminate, 0)).await.unwrap_err();
        assert!(matches!(err, SimulaError::InjectedTermination { .. }));
        assert_eq!(err.operation(), Some("COMMIT"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_sleeps_magnitude_seconds() {
        let started = tokio::time::Instant::now();
        perform(&fault(Action::Delay, 3)).await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_zero_delay_returns_immediately() {
        perform(&fault(Action::Delay, 0)).await.unwrap();
    }

    #[test]
    fn test_fault_from_rule() {
        let rule = Rule::new("commit", Action::Delay, 2).unwrap();
        let fault = Fault::new(&rule, "COMMIT");
        assert_eq!(fault.operation, "COMMIT");
        assert_eq!(fault.delay(), Duration::from_secs(2));
    }
}
