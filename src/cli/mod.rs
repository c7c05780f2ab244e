//! CLI module for relsnap
//!
//! Provides command-line interface for:
//! - export: Snapshot the configured tables to a JSON file
//! - restore: Replace the configured tables from a JSON file

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{export, restore, run, run_command};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::write_json;
