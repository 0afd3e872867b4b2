//! CLI argument definitions using clap
//!
//! Commands:
//! - elastic-fdw count  -o index=<name> [--typed] [-q field=value]...
//! - elastic-fdw scan   -o index=<name> -c <column[:type]>... [-q field=value]...
//! - elastic-fdw insert -o index=<name> -c <column[:type]>...
//! - elastic-fdw update -o index=<name> -c <column[:type]>...
//! - elastic-fdw delete -o index=<name> -c <column[:type]>...

use clap::{Args, Parser, Subcommand};

use crate::columns::ColumnDefinition;
use crate::options::{RawOptions, StoreApiVersion};
use crate::request::Qualifier;

/// elastic-fdw - query and modify an Elasticsearch index as a table
#[derive(Parser, Debug)]
#[command(name = "elastic-fdw")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Options and columns shared by every command
#[derive(Args, Debug, Clone)]
pub struct TableArgs {
    /// Table option, repeatable (e.g. -o index=articles -o refresh=wait_for)
    #[arg(short = 'o', long = "option", value_parser = parse_option)]
    pub options: Vec<(String, String)>,

    /// Declared column, repeatable; the type defaults to text
    #[arg(short = 'c', long = "column", value_parser = parse_column)]
    pub columns: Vec<ColumnDefinition>,

    /// Server still uses mapping types; the `type` option becomes required
    #[arg(long)]
    pub typed: bool,
}

impl TableArgs {
    pub fn raw_options(&self) -> RawOptions {
        self.options.iter().cloned().collect()
    }

    pub fn api_version(&self) -> StoreApiVersion {
        if self.typed {
            StoreApiVersion::Typed
        } else {
            StoreApiVersion::Typeless
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Count matching documents and print the planner estimate
    Count {
        #[command(flatten)]
        table: TableArgs,

        /// Equality qualifier on a virtual column, repeatable
        #[arg(short = 'q', long = "qual", value_parser = parse_qualifier)]
        qualifiers: Vec<Qualifier>,
    },

    /// Stream matching rows to stdout, one JSON object per line
    Scan {
        #[command(flatten)]
        table: TableArgs,

        /// Equality qualifier on a virtual column, repeatable
        #[arg(short = 'q', long = "qual", value_parser = parse_qualifier)]
        qualifiers: Vec<Qualifier>,
    },

    /// Insert rows read from stdin
    Insert {
        #[command(flatten)]
        table: TableArgs,
    },

    /// Update rows read from stdin, addressed by their rowid column
    Update {
        #[command(flatten)]
        table: TableArgs,
    },

    /// Delete rows read from stdin, addressed by their rowid column
    Delete {
        #[command(flatten)]
        table: TableArgs,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

fn parse_option(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected key=value, got '{}'", raw)),
    }
}

fn parse_column(raw: &str) -> Result<ColumnDefinition, String> {
    let (name, type_name) = raw.split_once(':').unwrap_or((raw, "text"));
    if name.trim().is_empty() {
        return Err(format!("expected name[:type], got '{}'", raw));
    }
    Ok(ColumnDefinition::new(name.trim(), type_name.trim()))
}

fn parse_qualifier(raw: &str) -> Result<Qualifier, String> {
    match raw.split_once('=') {
        Some((field, value)) if !field.trim().is_empty() => {
            Ok(Qualifier::new(field.trim(), value.to_string()))
        }
        _ => Err(format!("expected field=value, got '{}'", raw)),
    }
}
