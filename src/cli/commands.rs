//! CLI command implementations
//!
//! `rules` commands go straight to the rule file through the
//! administrative surface. `run` boots a reference host from the
//! configuration file and drives one session with statements from stdin.
//!
//! Every command writes its JSON lines to the writer it is given; the
//! entry point hands them stdout.

use std::io::{self, BufRead, Write};
use std::path::Path;

use serde_json::json;

use crate::config::SimulaConfig;
use crate::gate::{AuthStatus, ConnectionInfo};
use crate::host::Host;
use crate::observability::{log_event_with_fields, Event, Logger};
use crate::rules::{FileRuleStore, RuleAdmin};

use super::args::{Command, RulesAction};
use super::errors::{CliError, CliResult};
use super::io::{read_statements, write_error, write_response};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Rules { action } => match action {
            RulesAction::List { store } => rules_list(&store, io::stdout().lock()),
            RulesAction::Add {
                store,
                operation,
                action,
                magnitude,
            } => rules_add(&store, &operation, &action, magnitude, io::stdout().lock()),
            RulesAction::Clear { store } => rules_clear(&store, io::stdout().lock()),
        },
        Command::Run { config, user } => {
            run_session(&config, &user, io::stdin().lock(), io::stdout().lock())
        }
    }
}

/// Print every stored rule
pub fn rules_list(store_path: &Path, out: impl Write) -> CliResult<()> {
    let store = FileRuleStore::new(store_path);
    let rows = RuleAdmin::new(&store).list()?;
    write_response(out, json!({ "rules": rows }))
}

/// Add or replace one rule
pub fn rules_add(
    store_path: &Path,
    operation: &str,
    action: &str,
    magnitude: i64,
    out: impl Write,
) -> CliResult<()> {
    let store = FileRuleStore::new(store_path);
    let rule = RuleAdmin::new(&store).add_rule(operation, action, magnitude)?;
    write_response(out, json!({ "rule": rule }))
}

/// Remove every rule
pub fn rules_clear(store_path: &Path, out: impl Write) -> CliResult<()> {
    let store = FileRuleStore::new(store_path);
    RuleAdmin::new(&store).clear_all()?;
    write_response(out, json!({ "cleared": true }))
}

/// Open one session and replay `input` through it
///
/// Every statement gets exactly one response line. The loop stops early
/// when an error ends the session.
pub fn run_session(
    config_path: &Path,
    user: &str,
    input: impl BufRead,
    mut out: impl Write,
) -> CliResult<()> {
    let config = SimulaConfig::load(config_path)?;
    Logger::set_min_severity(config.severity()?);
    log_event_with_fields(
        Event::ConfigLoaded,
        &[
            ("path", &config_path.display().to_string()),
            ("rules_path", &config.rules_path.display().to_string()),
        ],
    );

    let host = Host::from_config(&config);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::session_error(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        let mut session = host.connect(ConnectionInfo::new(user), AuthStatus::Ok)?;

        for statement in read_statements(input) {
            let statement = statement?;
            match session.execute(&statement).await {
                Ok(data) => write_response(&mut out, data)?,
                Err(e) => write_error(&mut out, e.code(), &e.to_string())?,
            }
            if session.is_closed() {
                return Err(CliError::session_error("session terminated"));
            }
        }

        session.close();
        Ok(())
    })
}
