//! CLI module for elastic-fdw
//!
//! Provides one-shot commands against a live store:
//! - count: planner estimate for a query
//! - scan: stream matching rows
//! - insert / update / delete: apply rows read from stdin

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command, TableArgs};
pub use commands::{count, delete, insert, run, run_command, scan, update};
pub use errors::{CliError, CliResult};
pub use io::{read_rows, write_error, write_line};
