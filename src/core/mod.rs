//! # Host Core
//!
//! The hook points a host offers to the fault-injection engine: the
//! statement model, the session context, the interceptor pipeline and the
//! transaction lifecycle hub.
//!
//! ## Design Principles
//!
//! - Every statement is reduced to an operation tag before it is executed
//! - Interception is an ordered middleware chain, outermost first
//! - Errors carry the level they reach: transaction, session or process

pub mod context;
pub mod error;
pub mod lifecycle;
pub mod middleware;
pub mod operation;
pub mod pipeline;

pub use context::{SessionContext, TxnState};
pub use error::{CoreError, CoreResult, ErrorLevel};
pub use lifecycle::{LifecycleHub, ObserverId, TransactionEvent, TransactionObserver};
pub use middleware::observe::ObserveMiddleware;
pub use middleware::Middleware;
pub use operation::{Operation, TransactionControl};
pub use pipeline::{Next, OperationExecutor, OperationResult, Pipeline};
