//! elastic-fdw CLI entry point
//!
//! Parses arguments, runs one command, reports any error as JSON on stderr
//! and exits non-zero. All logic lives in the CLI module.

use elastic_fdw::cli;

fn main() {
    if let Err(e) = cli::run() {
        cli::write_error(&e);
        std::process::exit(1);
    }
}
