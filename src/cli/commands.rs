//! CLI command implementations
//!
//! Each command opens one table, runs to completion and exits. Commands are
//! generic over the store so they can be driven against `MemoryStore`.

use std::io::{self, BufRead, Write};

use serde_json::{json, Value};

use crate::observability::init_tracing;
use crate::request::Qualifier;
use crate::scan::PageState;
use crate::store::{DocumentStore, HttpStore};
use crate::table::ElasticTable;

use super::args::{Cli, Command, TableArgs};
use super::errors::{CliError, CliResult};
use super::io::{read_rows, write_line};

/// Main CLI entry point
pub fn run() -> CliResult<()> {
    init_tracing();
    let cli = Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cmd {
        Command::Count { table, qualifiers } => count(&connect(&table)?, &qualifiers, &mut out),
        Command::Scan { table, qualifiers } => scan(&connect(&table)?, &qualifiers, &mut out),
        Command::Insert { table } => insert(&connect(&table)?, stdin.lock(), &mut out),
        Command::Update { table } => update(&connect(&table)?, stdin.lock(), &mut out),
        Command::Delete { table } => delete(&connect(&table)?, stdin.lock(), &mut out),
    }
}

fn connect(args: &TableArgs) -> CliResult<ElasticTable<HttpStore>> {
    Ok(ElasticTable::connect_for(
        &args.raw_options(),
        args.api_version(),
        &args.columns,
    )?)
}

/// Print `{"rows": n, "width": w}` for the matching documents
pub fn count<S: DocumentStore, W: Write>(
    table: &ElasticTable<S>,
    qualifiers: &[Qualifier],
    out: &mut W,
) -> CliResult<()> {
    let columns: Vec<String> = table
        .schema()
        .columns()
        .iter()
        .map(|column| column.name().to_string())
        .collect();
    let (rows, width) = table.relation_size(qualifiers, &columns);
    write_line(out, &json!({ "rows": rows, "width": width }))
}

/// Stream every matching row
///
/// A scan that ends on a store failure is reported after the rows already
/// written.
pub fn scan<S: DocumentStore, W: Write>(
    table: &ElasticTable<S>,
    qualifiers: &[Qualifier],
    out: &mut W,
) -> CliResult<()> {
    let mut state = PageState::new();
    let result = {
        let mut rows = table.execute(qualifiers, None, &mut state);
        let written = rows.by_ref().try_for_each(|row| write_line(&mut *out, &row));
        match (written, rows.failure()) {
            (Err(error), _) => Err(error),
            (Ok(()), Some(failure)) => Err(CliError::Table(failure.clone())),
            (Ok(()), None) => Ok(()),
        }
    };
    table.end_scan(&mut state);
    out.flush()?;
    result
}

pub fn insert<S: DocumentStore, R: BufRead, W: Write>(
    table: &ElasticTable<S>,
    input: R,
    out: &mut W,
) -> CliResult<()> {
    for row in read_rows(input) {
        let returned = table.insert(row?)?;
        write_line(out, &returned)?;
    }
    out.flush()?;
    Ok(())
}

/// Update rows addressed by the value of their rowid column
pub fn update<S: DocumentStore, R: BufRead, W: Write>(
    table: &ElasticTable<S>,
    input: R,
    out: &mut W,
) -> CliResult<()> {
    for row in read_rows(input) {
        let row = row?;
        let identity = row.get(table.rowid_column()).cloned().unwrap_or(Value::Null);
        let returned = table.update(&identity, row)?;
        write_line(out, &returned)?;
    }
    out.flush()?;
    Ok(())
}

/// Delete rows addressed by the value of their rowid column
pub fn delete<S: DocumentStore, R: BufRead, W: Write>(
    table: &ElasticTable<S>,
    input: R,
    out: &mut W,
) -> CliResult<()> {
    for row in read_rows(input) {
        let row = row?;
        let identity = row.get(table.rowid_column()).cloned().unwrap_or(Value::Null);
        let returned = table.delete(&identity)?;
        write_line(out, &returned)?;
    }
    out.flush()?;
    Ok(())
}
