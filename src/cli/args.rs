//! CLI argument definitions using clap
//!
//! Commands:
//! - relsnap [--config <path>] export [path]
//! - relsnap [--config <path>] restore [path]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::DEFAULT_CONFIG_PATH;

/// relsnap - portable JSON snapshots of a relational database
#[derive(Parser, Debug)]
#[command(name = "relsnap")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a snapshot of the configured tables
    Export {
        /// Snapshot file (defaults to backup_path from the config)
        path: Option<PathBuf>,
    },

    /// Replace the configured tables with a snapshot
    Restore {
        /// Snapshot file (defaults to backup_path from the config)
        path: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
