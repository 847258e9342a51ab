//! # Reference Host
//!
//! Minimal host the engine can be driven through end to end: it accepts
//! connections through the gate, opens sessions and builds each session's
//! pipeline with the engine registered outermost.

mod executor;
mod exit;
mod session;

pub use executor::EchoExecutor;
pub use exit::{AbortProcess, ProcessExit};
pub use session::Session;

use std::sync::Arc;

use serde_json::Value;

use crate::config::{GlobalSettings, SimulaConfig};
use crate::core::{CoreError, CoreResult, ObserveMiddleware, OperationExecutor, Pipeline, SessionContext};
use crate::engine::{FaultEngine, SimulaMiddleware};
use crate::gate::{AuthStatus, ConnectionGate, ConnectionInfo};
use crate::observability::MetricsRegistry;
use crate::rules::{FileRuleStore, RuleStore};

/// Shared state of every session a host opens
pub struct Host {
    store: Arc<dyn RuleStore>,
    settings: Arc<GlobalSettings>,
    metrics: Arc<MetricsRegistry>,
    executor: Arc<dyn OperationExecutor>,
    exit: Arc<dyn ProcessExit>,
    gate: ConnectionGate,
}

impl Host {
    pub fn builder(store: Arc<dyn RuleStore>) -> HostBuilder {
        HostBuilder::new(store)
    }

    /// Host backed by the rule file named in `config`
    pub fn from_config(config: &SimulaConfig) -> Self {
        HostBuilder::new(Arc::new(FileRuleStore::new(&config.rules_path)))
            .settings(Arc::new(GlobalSettings::from_config(config)))
            .build()
    }

    pub fn settings(&self) -> &Arc<GlobalSettings> {
        &self.settings
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    pub fn store(&self) -> &Arc<dyn RuleStore> {
        &self.store
    }

    /// Authentication hook, then a fresh session with its own engine
    pub fn connect(&self, info: ConnectionInfo, status: AuthStatus) -> CoreResult<Session> {
        self.gate.check(&info, status)?;
        match status {
            AuthStatus::Ok => {}
            AuthStatus::Failed => return Err(CoreError::AuthenticationFailed(info.user)),
            AuthStatus::Eof => return Err(CoreError::ConnectionClosed),
        }

        let mut ctx = SessionContext::new(info.user, self.settings.clone());
        if let Some(addr) = info.remote_addr {
            ctx = ctx.with_metadata("remote_addr", Value::String(addr));
        }

        let engine = Arc::new(FaultEngine::new(self.store.clone(), self.metrics.clone()));
        let mut pipeline = Pipeline::from_shared(self.executor.clone())
            .with_middleware(ObserveMiddleware::new(self.metrics.clone()));
        pipeline.register_outermost(Arc::new(SimulaMiddleware::new(engine.clone())));

        Ok(Session::open(ctx, pipeline, engine, self.exit.clone()))
    }
}

/// Builder for [`Host`]
pub struct HostBuilder {
    store: Arc<dyn RuleStore>,
    settings: Arc<GlobalSettings>,
    metrics: Arc<MetricsRegistry>,
    executor: Arc<dyn OperationExecutor>,
    exit: Arc<dyn ProcessExit>,
}

impl HostBuilder {
    pub fn new(store: Arc<dyn RuleStore>) -> Self {
        Self {
            store,
            settings: Arc::new(GlobalSettings::new()),
            metrics: Arc::new(MetricsRegistry::new()),
            executor: Arc::new(EchoExecutor),
            exit: Arc::new(AbortProcess),
        }
    }

    pub fn settings(mut self, settings: Arc<GlobalSettings>) -> Self {
        self.settings = settings;
        self
    }

    pub fn metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn executor(mut self, executor: impl OperationExecutor + 'static) -> Self {
        self.executor = Arc::new(executor);
        self
    }

    pub fn exit(mut self, exit: Arc<dyn ProcessExit>) -> Self {
        self.exit = exit;
        self
    }

    pub fn build(self) -> Host {
        let gate = ConnectionGate::new(self.settings.clone(), self.metrics.clone());
        Host {
            store: self.store,
            settings: self.settings,
            metrics: self.metrics,
            executor: self.executor,
            exit: self.exit,
            gate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MIDDLEWARE_NAME;
    use crate::rules::MemRuleStore;

    #[test]
    fn test_engine_registered_outermost() {
        let host = Host::builder(Arc::new(MemRuleStore::new())).build();
        let session = host
            .connect(ConnectionInfo::new("alice"), AuthStatus::Ok)
            .unwrap();
        assert_eq!(
            session.pipeline().middleware_names(),
            vec![MIDDLEWARE_NAME, "observe"]
        );
    }

    #[test]
    fn test_host_auth_failure_passes_through() {
        let host = Host::builder(Arc::new(MemRuleStore::new())).build();
        let err = host
            .connect(ConnectionInfo::new("mallory"), AuthStatus::Failed)
            .err()
            .unwrap();
        assert!(matches!(err, CoreError::AuthenticationFailed(ref u) if u == "mallory"));
    }

    #[test]
    fn test_close_unhooks_engine() {
        let host = Host::builder(Arc::new(MemRuleStore::new())).build();
        let mut session = host
            .connect(ConnectionInfo::new("alice"), AuthStatus::Ok)
            .unwrap();

        session.close();
        assert!(session.is_closed());
        assert_eq!(session.pipeline().middleware_names(), vec!["observe"]);
        assert!(session.context().lifecycle().is_empty());
    }
}
