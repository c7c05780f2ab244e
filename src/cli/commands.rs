//! CLI command implementations
//!
//! Each command loads the configuration, sets the log level, opens the
//! database and hands over to the backup coordinator. The result summary
//! is printed as one JSON object on stdout.

use std::path::{Path, PathBuf};

use crate::backup::BackupCoordinator;
use crate::config::RelsnapConfig;
use crate::observability::{log_event_with_fields, Event, Logger};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::write_json;

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(&cli.config, cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(config_path: &Path, cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Export { path } => export(config_path, path.as_deref()),
        Command::Restore { path } => restore(config_path, path.as_deref()),
    }
}

/// Export the configured tables.
///
/// Writes to `path`, or to `backup_path` from the config.
pub fn export(config_path: &Path, path: Option<&Path>) -> CliResult<()> {
    let config = load_config(config_path)?;
    let target = resolve_path(&config, path);

    let mut coordinator = BackupCoordinator::open(&config)?;
    let summary = coordinator.export(&target)?;

    write_json(&summary)
}

/// Restore the configured tables.
///
/// Reads `path`, or `backup_path` from the config. A missing file is
/// reported before the database is opened.
pub fn restore(config_path: &Path, path: Option<&Path>) -> CliResult<()> {
    let config = load_config(config_path)?;
    let source = resolve_path(&config, path);

    if !source.exists() {
        return Err(CliError::backup_not_found(&source));
    }

    let mut coordinator = BackupCoordinator::open(&config)?;
    let stats = coordinator.restore(&source)?;

    write_json(&stats)
}

fn load_config(path: &Path) -> CliResult<RelsnapConfig> {
    let config = RelsnapConfig::load(path)?;
    Logger::set_min_severity(config.severity()?);

    let tables = config.tables.len().to_string();
    let database = config.database.display().to_string();
    log_event_with_fields(
        Event::ConfigLoaded,
        &[("database", database.as_str()), ("tables", tables.as_str())],
    );

    Ok(config)
}

fn resolve_path(config: &RelsnapConfig, path: Option<&Path>) -> PathBuf {
    path.map(Path::to_path_buf)
        .unwrap_or_else(|| config.backup_path.clone())
}
