//! CLI argument definitions using clap
//!
//! Commands:
//! - simula rules list --store <path>
//! - simula rules add --store <path> <operation> <action> [magnitude]
//! - simula rules clear --store <path>
//! - simula run --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// simula - deterministic, rule-driven fault injection
#[derive(Parser, Debug)]
#[command(name = "simula")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Administer the rule set
    Rules {
        #[command(subcommand)]
        action: RulesAction,
    },

    /// Open one session and run statements read from stdin, one per line
    Run {
        /// Path to configuration file
        #[arg(long, default_value = "./simula.json")]
        config: PathBuf,

        /// User the session authenticates as
        #[arg(long, default_value = "simula")]
        user: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum RulesAction {
    /// Print every rule in store order
    List {
        /// Path to the rule file
        #[arg(long, default_value = "./simula_rules.json")]
        store: PathBuf,
    },

    /// Add a rule, or replace the rule for the same operation
    Add {
        /// Path to the rule file
        #[arg(long, default_value = "./simula_rules.json")]
        store: PathBuf,

        /// Operation tag, e.g. "DROP TABLE"
        operation: String,

        /// fail, crash, delay or terminate
        action: String,

        /// Seconds to sleep for delay; ignored by the other actions
        #[arg(default_value_t = 0, allow_negative_numbers = true)]
        magnitude: i64,
    },

    /// Remove every rule
    Clear {
        /// Path to the rule file
        #[arg(long, default_value = "./simula_rules.json")]
        store: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
