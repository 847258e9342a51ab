//! # Fault-Injection Engine
//!
//! Interception guard, rule reload, lookup and the action table.
//!
//! Per intercepted operation:
//!
//! 1. Attach the guard-reset observer to the session's lifecycle hub (once)
//! 2. Ask the guard whether to act; if not, the operation runs untouched
//! 3. Take the guard, reload the registry from the rule store, look the
//!    operation up
//! 4. Perform the matched action, then release the guard if the action
//!    returned normally

mod actions;
mod dispatch;
mod errors;
mod guard;
mod middleware;
mod observer;

pub use actions::{perform, Fault};
pub use dispatch::FaultEngine;
pub use errors::{SimulaError, SimulaResult};
pub use guard::{Guard, GuardState};
pub use middleware::{SimulaMiddleware, MIDDLEWARE_NAME};
pub use observer::GuardResetObserver;
