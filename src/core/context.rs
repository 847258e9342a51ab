//! Session Context
//!
//! Context carried through the execution pipeline for the whole life of a
//! session: identity, transaction state, effective settings and the
//! session's lifecycle hub.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use crate::config::{GlobalSettings, SessionSettings};

use super::lifecycle::LifecycleHub;

/// Transaction state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnState {
    /// No transaction
    Idle,
    /// Single-statement transaction opened around one statement
    Implicit,
    /// Inside BEGIN ... COMMIT
    InBlock,
    /// Inside a block that has failed; only COMMIT/ROLLBACK accepted
    Failed,
}

/// Context carried through the execution pipeline
#[derive(Debug, Clone)]
pub struct SessionContext {
    /// Session ID for tracing
    pub session_id: Uuid,

    /// User the session authenticated as
    pub user: String,

    /// Metadata for observability
    pub metadata: HashMap<String, Value>,

    txn: TxnState,
    global: Arc<GlobalSettings>,
    overrides: SessionSettings,
    lifecycle: Arc<LifecycleHub>,
}

impl SessionContext {
    /// Create a new session context
    pub fn new(user: impl Into<String>, global: Arc<GlobalSettings>) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            user: user.into(),
            metadata: HashMap::new(),
            txn: TxnState::Idle,
            global,
            overrides: SessionSettings::default(),
            lifecycle: Arc::new(LifecycleHub::new()),
        }
    }

    /// Context with fresh global settings, for tests and tools
    pub fn detached(user: impl Into<String>) -> Self {
        Self::new(user, Arc::new(GlobalSettings::new()))
    }

    pub fn txn_state(&self) -> TxnState {
        self.txn
    }

    pub fn set_txn_state(&mut self, state: TxnState) {
        self.txn = state;
    }

    /// Whether a live transaction surrounds the current statement
    pub fn in_transaction(&self) -> bool {
        matches!(self.txn, TxnState::Implicit | TxnState::InBlock)
    }

    /// Effective `simula.enabled`
    pub fn simulation_enabled(&self) -> bool {
        self.overrides.simulation_enabled(&self.global)
    }

    pub fn settings_mut(&mut self) -> &mut SessionSettings {
        &mut self.overrides
    }

    pub fn lifecycle(&self) -> &Arc<LifecycleHub> {
        &self.lifecycle
    }

    /// Add metadata for observability
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}
