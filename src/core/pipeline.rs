//! Execution Pipeline
//!
//! Ordered interceptor chain in front of the host's executor. The first
//! middleware is the outermost: it sees every statement before anything
//! else does and sees every result last.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;

use super::context::SessionContext;
use super::error::CoreResult;
use super::middleware::Middleware;
use super::operation::Operation;

/// Result of an operation
pub type OperationResult = CoreResult<Value>;

/// Next middleware in chain
pub struct Next<'a> {
    middleware: &'a [Arc<dyn Middleware>],
    executor: &'a dyn OperationExecutor,
}

impl<'a> Next<'a> {
    /// Run the next middleware or executor
    pub fn run(
        self,
        op: &'a Operation,
        ctx: &'a mut SessionContext,
    ) -> Pin<Box<dyn Future<Output = OperationResult> + Send + 'a>> {
        Box::pin(async move {
            if let Some((first, rest)) = self.middleware.split_first() {
                let next = Next {
                    middleware: rest,
                    executor: self.executor,
                };
                first.process(op, ctx, next).await
            } else {
                self.executor.execute(op, ctx).await
            }
        })
    }
}

/// Operation executor (final stage of pipeline)
pub trait OperationExecutor: Send + Sync {
    /// Execute the operation
    fn execute(
        &self,
        op: &Operation,
        ctx: &SessionContext,
    ) -> Pin<Box<dyn Future<Output = OperationResult> + Send + '_>>;
}

/// The interceptor chain of one session
pub struct Pipeline {
    middleware: Vec<Arc<dyn Middleware>>,
    executor: Arc<dyn OperationExecutor>,
}

impl Pipeline {
    /// Create a new pipeline with the given executor
    pub fn new(executor: impl OperationExecutor + 'static) -> Self {
        Self::from_shared(Arc::new(executor))
    }

    /// Create a pipeline around an executor shared with other sessions
    pub fn from_shared(executor: Arc<dyn OperationExecutor>) -> Self {
        Self {
            middleware: Vec::new(),
            executor,
        }
    }

    /// Append middleware, innermost so far
    pub fn with_middleware(mut self, m: impl Middleware + 'static) -> Self {
        self.middleware.push(Arc::new(m));
        self
    }

    /// Register middleware in front of every other stage
    pub fn register_outermost(&mut self, m: Arc<dyn Middleware>) {
        self.middleware.insert(0, m);
    }

    /// Remove every stage registered under `name`
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.middleware.len();
        self.middleware.retain(|m| m.name() != name);
        self.middleware.len() != before
    }

    /// Execute an operation through the pipeline
    pub async fn execute(&self, op: &Operation, ctx: &mut SessionContext) -> OperationResult {
        let next = Next {
            middleware: &self.middleware,
            executor: self.executor.as_ref(),
        };
        next.run(op, ctx).await
    }

    /// Stage names, outermost first
    pub fn middleware_names(&self) -> Vec<&'static str> {
        self.middleware.iter().map(|m| m.name()).collect()
    }

    /// Get the number of middleware stages
    pub fn middleware_count(&self) -> usize {
        self.middleware.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::CoreError;

    struct TagExecutor;

    impl OperationExecutor for TagExecutor {
        fn execute(
            &self,
            op: &Operation,
            _ctx: &SessionContext,
        ) -> Pin<Box<dyn Future<Output = OperationResult> + Send + '_>> {
            let tag = op.tag().to_string();
            Box::pin(async move { Ok(serde_json::json!({ "tag": tag })) })
        }
    }

    struct Reject(&'static str);

    impl Middleware for Reject {
        fn name(&self) -> &'static str {
            self.0
        }

        fn process<'a>(
            &'a self,
            _op: &'a Operation,
            _ctx: &'a mut SessionContext,
            _next: Next<'a>,
        ) -> Pin<Box<dyn Future<Output = OperationResult> + Send + 'a>> {
            let name = self.0;
            Box::pin(async move { Err(CoreError::validation(name)) })
        }
    }

    struct Pass(&'static str);

    impl Middleware for Pass {
        fn name(&self) -> &'static str {
            self.0
        }

        fn process<'a>(
            &'a self,
            op: &'a Operation,
            ctx: &'a mut SessionContext,
            next: Next<'a>,
        ) -> Pin<Box<dyn Future<Output = OperationResult> + Send + 'a>> {
            next.run(op, ctx)
        }
    }

    #[tokio::test]
    async fn test_pipeline_with_no_middleware() {
        let pipeline = Pipeline::new(TagExecutor);
        let mut ctx = SessionContext::detached("alice");
        let op = Operation::parse("SELECT 1").unwrap();

        let result = pipeline.execute(&op, &mut ctx).await.unwrap();
        assert_eq!(result["tag"], "SELECT");
    }

    #[tokio::test]
    async fn test_outermost_runs_first() {
        let mut pipeline = Pipeline::new(TagExecutor).with_middleware(Reject("inner"));
        pipeline.register_outermost(Arc::new(Reject("outer")));
        assert_eq!(pipeline.middleware_names(), vec!["outer", "inner"]);

        let mut ctx = SessionContext::detached("alice");
        let op = Operation::parse("SELECT 1").unwrap();
        let err = pipeline.execute(&op, &mut ctx).await.unwrap_err();
        assert_eq!(err.to_string(), "Validation error: outer");
    }

    #[tokio::test]
    async fn test_remove_by_name() {
        let mut pipeline = Pipeline::new(TagExecutor)
            .with_middleware(Pass("observe"))
            .with_middleware(Reject("blocker"));

        assert!(pipeline.remove("blocker"));
        assert!(!pipeline.remove("blocker"));
        assert_eq!(pipeline.middleware_count(), 1);

        let mut ctx = SessionContext::detached("alice");
        let op = Operation::parse("SELECT 1").unwrap();
        assert!(pipeline.execute(&op, &mut ctx).await.is_ok());
    }
}
