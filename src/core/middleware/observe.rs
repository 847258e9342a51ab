//! Observability Middleware
//!
//! Logs and counts every statement that passes through the stages inside
//! it. Sits innermost-but-one in the reference host so injected faults from
//! the outer engine stage are reported by the session instead.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use crate::core::context::SessionContext;
use crate::core::operation::Operation;
use crate::core::pipeline::{Next, OperationResult};
use crate::observability::{Event, Logger, MetricsRegistry};

use super::Middleware;

/// Observability middleware
pub struct ObserveMiddleware {
    metrics: Arc<MetricsRegistry>,
}

impl ObserveMiddleware {
    pub fn new(metrics: Arc<MetricsRegistry>) -> Self {
        Self { metrics }
    }
}

impl Middleware for ObserveMiddleware {
    fn name(&self) -> &'static str {
        "observe"
    }

    fn process<'a>(
        &'a self,
        op: &'a Operation,
        ctx: &'a mut SessionContext,
        next: Next<'a>,
    ) -> Pin<Box<dyn Future<Output = OperationResult> + Send + 'a>> {
        Box::pin(async move {
            let session = ctx.session_id.to_string();
            let started = Instant::now();

            let result = next.run(op, ctx).await;

            self.metrics.increment_operations_observed();
            let duration_ms = started.elapsed().as_millis().to_string();

            match &result {
                Ok(_) => Logger::trace(
                    Event::OperationComplete.as_str(),
                    &[
                        ("duration_ms", &duration_ms),
                        ("session", &session),
                        ("tag", op.tag()),
                    ],
                ),
                Err(err) => {
                    self.metrics.increment_operations_failed();
                    Logger::warn(
                        Event::OperationFailed.as_str(),
                        &[
                            ("code", err.code()),
                            ("duration_ms", &duration_ms),
                            ("error", &err.to_string()),
                            ("session", &session),
                            ("tag", op.tag()),
                        ],
                    );
                }
            }

            result
        })
    }
}
