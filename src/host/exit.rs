//! Process exit hook
//!
//! A PANIC-level error ends the process. The host goes through this hook so
//! that an embedding (or a test) can decide what "end the process" means.

use crate::core::CoreError;
use crate::observability::{Event, Logger};

/// What the host does with a PANIC-level error
pub trait ProcessExit: Send + Sync {
    fn exit(&self, err: &CoreError);
}

/// Terminate immediately via `std::process::abort()`
///
/// No cleanup, no unwinding, no catching.
#[derive(Debug, Clone, Copy, Default)]
pub struct AbortProcess;

impl ProcessExit for AbortProcess {
    fn exit(&self, err: &CoreError) {
        Logger::fatal(
            Event::ProcessPanic.as_str(),
            &[("code", err.code()), ("error", &err.to_string())],
        );
        std::process::abort();
    }
}
