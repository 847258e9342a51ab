//! simula CLI entry point
//!
//! Parses arguments and dispatches through `cli::run`, prints any error to
//! stderr and exits non-zero on failure. Everything else lives in the CLI
//! module.

use simula::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
