//! # Dispatch Engine
//!
//! Guard check, registry reload, rule lookup, action. One engine per
//! session.
//!
//! The guard is released explicitly only when evaluation finds no rule or
//! when a delay has finished. Every path that aborts the operation (an
//! injected error or a failed store read) leaves it held; the lifecycle
//! observer resets it when the host announces the resulting abort.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::core::{LifecycleHub, ObserverId, Operation, SessionContext};
use crate::observability::{Event, Logger, MetricsRegistry, ObservationScope};
use crate::rules::{Rule, RuleAdmin, RuleRegistry, RuleStore, StoreError, StoreResult};

use super::actions::{self, Fault};
use super::errors::{SimulaError, SimulaResult};
use super::guard::Guard;
use super::observer::GuardResetObserver;

struct Attachment {
    hub: Arc<LifecycleHub>,
    id: ObserverId,
}

/// Fault-injection engine of one session
pub struct FaultEngine {
    guard: Arc<Guard>,
    registry: Mutex<RuleRegistry>,
    store: Arc<dyn RuleStore>,
    metrics: Arc<MetricsRegistry>,
    attachment: Mutex<Option<Attachment>>,
}

impl std::fmt::Debug for FaultEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FaultEngine")
            .field("guard", &self.guard.state())
            .field("store", &self.store)
            .finish()
    }
}

impl FaultEngine {
    pub fn new(store: Arc<dyn RuleStore>, metrics: Arc<MetricsRegistry>) -> Self {
        Self {
            guard: Arc::new(Guard::new()),
            registry: Mutex::new(RuleRegistry::new()),
            store,
            metrics,
            attachment: Mutex::new(None),
        }
    }

    pub fn guard(&self) -> &Arc<Guard> {
        &self.guard
    }

    pub fn store(&self) -> &Arc<dyn RuleStore> {
        &self.store
    }

    fn lock_registry(&self) -> SimulaResult<MutexGuard<'_, RuleRegistry>> {
        self.registry
            .lock()
            .map_err(|_| SimulaError::Internal("rule registry lock poisoned".into()))
    }

    /// Attach the guard-reset observer to `hub`, once per engine
    pub fn ensure_observer(&self, hub: &Arc<LifecycleHub>) {
        if !self.guard.mark_observer_registered() {
            return;
        }

        let observer = GuardResetObserver::new(self.guard.clone(), self.metrics.clone());
        let id = hub.register(Arc::new(observer));
        if let Ok(mut attachment) = self.attachment.lock() {
            *attachment = Some(Attachment {
                hub: hub.clone(),
                id,
            });
        }
        Logger::trace(Event::ObserverRegistered.as_str(), &[]);
    }

    /// Decide what to do with `op`
    ///
    /// `Ok(None)` lets the operation run untouched. `Ok(Some(fault))` means a
    /// rule matched; the guard stays held until the fault has been performed.
    pub fn evaluate(&self, op: &Operation, ctx: &SessionContext) -> SimulaResult<Option<Fault>> {
        self.ensure_observer(ctx.lifecycle());

        if !self
            .guard
            .should_activate(ctx.simulation_enabled(), op, ctx.in_transaction())
        {
            return Ok(None);
        }
        if !self.guard.enter() {
            return Ok(None);
        }
        self.metrics.increment_operations_intercepted();

        self.reload(&ctx.session_id.to_string())?;

        let rule = match self.find(op.tag())? {
            Some(rule) => rule,
            None => {
                self.guard.release();
                return Ok(None);
            }
        };

        self.guard.begin_dispatch();
        self.metrics.increment_fault(rule.action());
        Logger::warn(
            Event::FaultInjected.as_str(),
            &[
                ("action", rule.action().as_str()),
                ("magnitude", &rule.magnitude().to_string()),
                ("operation", op.tag()),
                ("session", &ctx.session_id.to_string()),
            ],
        );
        Ok(Some(Fault::new(&rule, op.tag())))
    }

    /// Intercept `op` right before it executes
    pub async fn on_operation(&self, op: &Operation, ctx: &SessionContext) -> SimulaResult<()> {
        let fault = match self.evaluate(op, ctx)? {
            Some(fault) => fault,
            None => return Ok(()),
        };

        actions::perform(&fault).await?;
        self.guard.release();
        Ok(())
    }

    /// Rebuild the registry from a full scan of the store
    ///
    /// Returns the number of rules loaded. The old snapshot is discarded
    /// before the store is read, so a failed read leaves the registry empty.
    pub fn reload(&self, session: &str) -> SimulaResult<usize> {
        self.lock_registry()?.clear();

        if !self.store.is_installed() {
            self.metrics.record_reload(0);
            Logger::trace(Event::RulesUnavailable.as_str(), &[("session", session)]);
            return Ok(0);
        }

        let scope = ObservationScope::with_fields("RULE_RELOAD", &[("session", session)]);

        let rows = match self.store.list_all() {
            Ok(rows) => rows,
            Err(StoreError::NotInstalled) => {
                self.metrics.record_reload(0);
                scope.complete_with_fields(&[("rules", "0")]);
                return Ok(0);
            }
            Err(err) => {
                self.metrics.increment_store_errors();
                Logger::error(
                    Event::StoreReadFailed.as_str(),
                    &[("error", &err.to_string()), ("session", session)],
                );
                scope.fail(&err.to_string());
                return Err(err.into());
            }
        };

        let mut registry = self.lock_registry()?;
        for skipped in registry.rebuild(&rows) {
            Logger::warn(
                Event::RuleSkipped.as_str(),
                &[
                    ("action", &skipped.row.action),
                    ("operation", &skipped.row.operation),
                    ("reason", &skipped.reason.to_string()),
                ],
            );
        }

        let loaded = registry.len();
        self.metrics.record_reload(loaded);
        scope.complete_with_fields(&[("rules", &loaded.to_string())]);
        Ok(loaded)
    }

    /// First rule in registry order whose operation equals `tag`
    pub fn find(&self, tag: &str) -> SimulaResult<Option<Rule>> {
        Ok(self.lock_registry()?.find(tag).cloned())
    }

    /// Copy of the current registry
    pub fn registry_snapshot(&self) -> Vec<Rule> {
        self.registry
            .lock()
            .map(|registry| registry.rules().to_vec())
            .unwrap_or_default()
    }

    /// Run an administrative write with the guard held
    ///
    /// Any statement the write triggers on this session is left alone. The
    /// guard is released afterwards only if this call took it.
    pub fn administer<T>(
        &self,
        f: impl FnOnce(&RuleAdmin<'_>) -> StoreResult<T>,
    ) -> SimulaResult<T> {
        let entered = self.guard.enter();
        let result = f(&RuleAdmin::new(self.store.as_ref()));
        if entered {
            self.guard.release();
        }
        result.map_err(SimulaError::from)
    }

    /// Unregister the lifecycle observer; false if none was attached
    pub fn detach(&self) -> bool {
        let attachment = match self.attachment.lock() {
            Ok(mut attachment) => attachment.take(),
            Err(_) => None,
        };

        match attachment {
            Some(Attachment { hub, id }) => {
                let removed = hub.unregister(id);
                self.guard.clear_observer_registered();
                self.guard.reset();
                Logger::trace(Event::EngineDetached.as_str(), &[]);
                removed
            }
            None => false,
        }
    }
}
