//! JSON output for CLI
//!
//! - One JSON object per command on stdout
//! - UTF-8 only

use std::io::{self, Write};

use serde::Serialize;

use super::errors::CliResult;

/// Write `value` as one JSON line to stdout
pub fn write_json<T: Serialize>(value: &T) -> CliResult<()> {
    let line = serde_json::to_string(value)?;

    let mut stdout = io::stdout();
    writeln!(stdout, "{}", line)?;
    stdout.flush()?;

    Ok(())
}
