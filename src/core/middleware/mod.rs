//! Middleware Trait
//!
//! Stages of the execution pipeline.

use std::future::Future;
use std::pin::Pin;

use super::context::SessionContext;
use super::operation::Operation;
use super::pipeline::{Next, OperationResult};

/// Middleware trait for pipeline stages
pub trait Middleware: Send + Sync {
    /// Registration name, used to remove the stage again
    fn name(&self) -> &'static str;

    /// Process the operation, optionally short-circuiting the rest of the chain
    fn process<'a>(
        &'a self,
        op: &'a Operation,
        ctx: &'a mut SessionContext,
        next: Next<'a>,
    ) -> Pin<Box<dyn Future<Output = OperationResult> + Send + 'a>>;
}

pub mod observe;
