//! File input and JSON output for the CLI

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use super::errors::{CliError, CliResult};

/// Read a whole input file
pub fn read_file(path: &Path) -> CliResult<Vec<u8>> {
    fs::read(path).map_err(|e| CliError::io_error(format!("{}: {}", path.display(), e)))
}

/// Read and parse a JSON input file
pub fn read_json<T: DeserializeOwned>(path: &Path) -> CliResult<T> {
    let bytes = read_file(path)?;
    serde_json::from_slice(&bytes)
        .map_err(|e| CliError::invalid_argument(format!("{}: {}", path.display(), e)))
}

/// Write a value to stdout as pretty JSON
pub fn write_json<T: Serialize>(value: &T) -> CliResult<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    stdout.flush()?;
    Ok(())
}

/// Write one line to stdout
pub fn write_line(line: &str) -> CliResult<()> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", line)?;
    stdout.flush()?;
    Ok(())
}
