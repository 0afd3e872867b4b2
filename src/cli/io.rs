//! JSON-lines I/O for the CLI
//!
//! - Input: one JSON object per line on stdin, blank lines skipped
//! - Output: one JSON object per line on stdout
//! - Errors: one JSON object on stderr

use std::io::{self, BufRead, Write};

use serde::Serialize;
use serde_json::{json, Value};

use crate::columns::Row;

use super::errors::{CliError, CliResult};

/// Parse rows from a reader, numbering lines from 1
pub fn read_rows<R: BufRead>(reader: R) -> impl Iterator<Item = CliResult<Row>> {
    reader
        .lines()
        .enumerate()
        .filter_map(|(index, line)| {
            let line = match line {
                Ok(line) => line,
                Err(error) => return Some(Err(CliError::from(error))),
            };
            if line.trim().is_empty() {
                return None;
            }
            Some(parse_row(index + 1, &line))
        })
}

fn parse_row(line: usize, text: &str) -> CliResult<Row> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(row)) => Ok(row),
        Ok(_) => Err(CliError::invalid_input(line, "expected a JSON object")),
        Err(error) => Err(CliError::invalid_input(line, error.to_string())),
    }
}

/// Write one value as a JSON line
pub fn write_line<W: Write, T: Serialize>(out: &mut W, value: &T) -> CliResult<()> {
    serde_json::to_writer(&mut *out, value).map_err(io::Error::from)?;
    writeln!(out)?;
    Ok(())
}

/// Report an error on stderr
pub fn write_error(error: &CliError) {
    let report = json!({
        "status": "error",
        "code": error.code(),
        "message": error.to_string(),
    });
    eprintln!("{}", report);
}
