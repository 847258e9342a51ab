//! Pipeline stage that runs the engine in front of every statement.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::core::{Middleware, Next, Operation, OperationResult, SessionContext};

use super::dispatch::FaultEngine;

/// Name the engine stage is registered under
pub const MIDDLEWARE_NAME: &str = "simula";

pub struct SimulaMiddleware {
    engine: Arc<FaultEngine>,
}

impl SimulaMiddleware {
    pub fn new(engine: Arc<FaultEngine>) -> Self {
        Self { engine }
    }
}

impl Middleware for SimulaMiddleware {
    fn name(&self) -> &'static str {
        MIDDLEWARE_NAME
    }

    fn process<'a>(
        &'a self,
        op: &'a Operation,
        ctx: &'a mut SessionContext,
        next: Next<'a>,
    ) -> Pin<Box<dyn Future<Output = OperationResult> + Send + 'a>> {
        Box::pin(async move {
            self.engine.on_operation(op, ctx).await?;
            next.run(op, ctx).await
        })
    }
}
