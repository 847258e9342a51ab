//! Final pipeline stage of the reference host.

use std::future::Future;
use std::pin::Pin;

use serde_json::json;

use crate::core::{Operation, OperationExecutor, OperationResult, SessionContext};

/// Executor that performs nothing and reports the command tag
///
/// The reference host has no execution semantics of its own; a statement
/// that reaches this stage simply completes.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoExecutor;

impl OperationExecutor for EchoExecutor {
    fn execute(
        &self,
        op: &Operation,
        _ctx: &SessionContext,
    ) -> Pin<Box<dyn Future<Output = OperationResult> + Send + '_>> {
        let result = json!({ "status": "ok", "tag": op.tag() });
        Box::pin(async move { Ok(result) })
    }
}
