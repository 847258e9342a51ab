//! CLI module for simula
//!
//! Provides command-line interface for:
//! - rules list/add/clear: administer a rule file
//! - run: replay statements from stdin through one session

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command, RulesAction};
pub use commands::{rules_add, rules_clear, rules_list, run, run_command, run_session};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_statements, write_error, write_response};
