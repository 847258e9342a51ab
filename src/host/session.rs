//! Session
//!
//! One client connection of the reference host. Runs statements through
//! the session's pipeline, keeps the transaction state, announces every
//! transaction boundary on the lifecycle hub and escalates errors by level.
//!
//! Transaction model:
//!
//! - A statement outside a block runs in its own implicit transaction
//!   (start, pre-commit, commit; abort on error)
//! - `BEGIN` opens a block; an error inside the block aborts it and leaves
//!   the session in the failed state until `COMMIT` or `ROLLBACK`
//! - In the failed state every other statement is rejected
//!
//! `SET`/`RESET` of a simula toggle is an ordinary `SET`/`RESET` statement:
//! it runs through the pipeline and takes effect only once it succeeded.

use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::config::parse_bool;
use crate::core::{
    CoreError, CoreResult, ErrorLevel, Operation, Pipeline, SessionContext, TransactionControl,
    TransactionEvent, TxnState,
};
use crate::engine::{FaultEngine, SimulaResult, MIDDLEWARE_NAME};
use crate::observability::{log_event_with_fields, Event};
use crate::rules::{Rule, RuleRow};

use super::exit::ProcessExit;

static SET_STATEMENT: OnceLock<Option<Regex>> = OnceLock::new();
static RESET_STATEMENT: OnceLock<Option<Regex>> = OnceLock::new();

fn set_statement() -> Option<&'static Regex> {
    SET_STATEMENT
        .get_or_init(|| {
            Regex::new(
                r"(?i)^\s*SET\s+(?:SESSION\s+)?(simula\.[a-z_]+)\s*(?:=|\s+TO\s+)\s*('?[a-z0-9]+'?)\s*;?\s*$",
            )
            .ok()
        })
        .as_ref()
}

fn reset_statement() -> Option<&'static Regex> {
    RESET_STATEMENT
        .get_or_init(|| Regex::new(r"(?i)^\s*RESET\s+(simula\.[a-z_]+)\s*;?\s*$").ok())
        .as_ref()
}

/// A `SET`/`RESET` of one of the simula toggles
#[derive(Debug, Clone, PartialEq, Eq)]
enum SettingCommand {
    Set { name: String, value: String },
    Reset { name: String },
}

impl SettingCommand {
    fn parse(statement: &str) -> Option<Self> {
        if let Some(caps) = set_statement().and_then(|re| re.captures(statement)) {
            let name = caps[1].to_string();
            if caps[2].eq_ignore_ascii_case("default") {
                return Some(SettingCommand::Reset { name });
            }
            return Some(SettingCommand::Set {
                name,
                value: caps[2].to_string(),
            });
        }
        reset_statement()
            .and_then(|re| re.captures(statement))
            .map(|caps| SettingCommand::Reset {
                name: caps[1].to_string(),
            })
    }
}

/// One client session
pub struct Session {
    ctx: SessionContext,
    pipeline: Pipeline,
    engine: Arc<FaultEngine>,
    exit: Arc<dyn ProcessExit>,
    closed: bool,
}

impl Session {
    pub(crate) fn open(
        ctx: SessionContext,
        pipeline: Pipeline,
        engine: Arc<FaultEngine>,
        exit: Arc<dyn ProcessExit>,
    ) -> Self {
        log_event_with_fields(
            Event::SessionOpened,
            &[
                ("session", &ctx.session_id.to_string()),
                ("user", &ctx.user),
            ],
        );
        Self {
            ctx,
            pipeline,
            engine,
            exit,
            closed: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.ctx.session_id
    }

    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    pub fn engine(&self) -> &Arc<FaultEngine> {
        &self.engine
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn txn_state(&self) -> TxnState {
        self.ctx.txn_state()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Run one statement
    pub async fn execute(&mut self, statement: &str) -> CoreResult<Value> {
        if self.closed {
            return Err(CoreError::SessionClosed);
        }

        let op = Operation::parse(statement)?;

        let result = match self.ctx.txn_state() {
            TxnState::Failed => self.execute_in_failed_block(&op),
            TxnState::InBlock => self.execute_in_block(&op).await,
            TxnState::Idle | TxnState::Implicit => self.execute_outside_block(&op).await,
        };

        result.map_err(|err| self.escalate(err))
    }

    /// Run `op` through the pipeline, then apply it if it changes a toggle
    async fn run(&mut self, op: &Operation) -> CoreResult<Value> {
        let value = self.pipeline.execute(op, &mut self.ctx).await?;
        match SettingCommand::parse(op.statement()) {
            Some(command) => self.apply_setting(command),
            None => Ok(value),
        }
    }

    fn apply_setting(&mut self, command: SettingCommand) -> CoreResult<Value> {
        match command {
            SettingCommand::Set { name, value } => {
                let value = parse_bool(&name, &value)?;
                self.ctx.settings_mut().set(&name, value)?;
                Ok(json!({ "status": "ok", "tag": "SET", "name": name, "value": value }))
            }
            SettingCommand::Reset { name } => {
                self.ctx.settings_mut().reset(&name)?;
                Ok(json!({ "status": "ok", "tag": "RESET", "name": name }))
            }
        }
    }

    async fn execute_outside_block(&mut self, op: &Operation) -> CoreResult<Value> {
        self.begin_transaction(TxnState::Implicit);
        let result = self.run(op).await;

        match result {
            Ok(value) => {
                if op.transaction_control() == Some(TransactionControl::Begin) {
                    self.ctx.set_txn_state(TxnState::InBlock);
                } else {
                    self.commit_transaction();
                }
                Ok(value)
            }
            Err(err) => {
                self.abort_transaction(TxnState::Idle);
                Err(err)
            }
        }
    }

    async fn execute_in_block(&mut self, op: &Operation) -> CoreResult<Value> {
        let result = self.run(op).await;

        match (op.transaction_control(), result) {
            (Some(TransactionControl::Commit), Ok(value)) => {
                self.commit_transaction();
                Ok(value)
            }
            (Some(TransactionControl::Rollback), result) => {
                self.abort_transaction(TxnState::Idle);
                result
            }
            (Some(TransactionControl::Commit), Err(err)) => {
                self.abort_transaction(TxnState::Idle);
                Err(err)
            }
            (_, Ok(value)) => Ok(value),
            (_, Err(err)) => {
                self.abort_transaction(TxnState::Failed);
                Err(err)
            }
        }
    }

    fn execute_in_failed_block(&mut self, op: &Operation) -> CoreResult<Value> {
        match op.transaction_control() {
            Some(TransactionControl::Commit) | Some(TransactionControl::Rollback) => {
                // The abort was already announced when the block failed
                self.ctx.set_txn_state(TxnState::Idle);
                Ok(json!({ "status": "ok", "tag": "ROLLBACK" }))
            }
            _ => Err(CoreError::TransactionAborted),
        }
    }

    fn begin_transaction(&mut self, state: TxnState) {
        self.ctx.set_txn_state(state);
        self.ctx.lifecycle().notify(TransactionEvent::Start);
    }

    fn commit_transaction(&mut self) {
        self.ctx.lifecycle().notify(TransactionEvent::PreCommit);
        self.ctx.set_txn_state(TxnState::Idle);
        self.ctx.lifecycle().notify(TransactionEvent::Commit);
    }

    fn abort_transaction(&mut self, next: TxnState) {
        self.ctx.set_txn_state(next);
        self.ctx.lifecycle().notify(TransactionEvent::Abort);
    }

    /// Apply the reach of an error that already aborted its transaction
    fn escalate(&mut self, err: CoreError) -> CoreError {
        match err.level() {
            ErrorLevel::Error => {}
            ErrorLevel::Fatal => {
                log_event_with_fields(
                    Event::SessionTerminated,
                    &[
                        ("code", err.code()),
                        ("session", &self.ctx.session_id.to_string()),
                    ],
                );
                self.close();
            }
            ErrorLevel::Panic => {
                self.exit.exit(&err);
                self.close();
            }
        }
        err
    }

    /// Add or replace a rule without the write being intercepted
    pub fn add_rule(&self, operation: &str, action: &str, magnitude: i64) -> SimulaResult<Rule> {
        self.engine
            .administer(|admin| admin.add_rule(operation, action, magnitude))
    }

    /// Remove every rule without the write being intercepted
    pub fn clear_rules(&self) -> SimulaResult<()> {
        self.engine.administer(|admin| admin.clear_all())
    }

    pub fn list_rules(&self) -> SimulaResult<Vec<RuleRow>> {
        self.engine.administer(|admin| admin.list())
    }

    /// End the session and unhook the engine
    ///
    /// An open transaction is aborted first. Idempotent.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        if self.ctx.in_transaction() {
            self.abort_transaction(TxnState::Idle);
        }

        self.pipeline.remove(MIDDLEWARE_NAME);
        self.engine.detach();
        self.closed = true;

        log_event_with_fields(
            Event::SessionClosed,
            &[("session", &self.ctx.session_id.to_string())],
        );
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_set_forms() {
        assert_eq!(
            SettingCommand::parse("SET simula.enabled = on"),
            Some(SettingCommand::Set {
                name: "simula.enabled".into(),
                value: "on".into()
            })
        );
        assert_eq!(
            SettingCommand::parse("set session simula.connection_refuse to 'true';"),
            Some(SettingCommand::Set {
                name: "simula.connection_refuse".into(),
                value: "'true'".into()
            })
        );
        assert_eq!(
            SettingCommand::parse("RESET simula.enabled"),
            Some(SettingCommand::Reset {
                name: "simula.enabled".into()
            })
        );
    }

    #[test]
    fn test_set_to_default_is_reset() {
        assert_eq!(
            SettingCommand::parse("SET simula.enabled TO DEFAULT"),
            Some(SettingCommand::Reset {
                name: "simula.enabled".into()
            })
        );
        assert_eq!(
            SettingCommand::parse("set simula.enabled = default;"),
            Some(SettingCommand::Reset {
                name: "simula.enabled".into()
            })
        );
    }

    #[test]
    fn test_other_settings_are_not_toggles() {
        assert_eq!(SettingCommand::parse("SET search_path = public"), None);
        assert_eq!(SettingCommand::parse("SELECT 'SET simula.enabled = on'"), None);
    }
}
