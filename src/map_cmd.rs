//! `map` subcommand: show how sheet headers resolve against a table.
//!
//! Prints one line per header with the matched column and whether the alias
//! table or the fuzzy fallback produced the match. Unmatched headers are
//! listed too so an operator can see what an import would silently drop.

use anyhow::{Result, anyhow};
use log::info;

use crate::{
    aliases,
    cli::MapArgs,
    matcher::{self, MatchKind},
    sheet,
    sqlite::SqliteStore,
    store::{MergeStore, TableRef},
    table,
};

pub fn execute(args: &MapArgs) -> Result<()> {
    let alias_table = aliases::load(args.aliases.as_deref())?;
    let data = sheet::read_rows(&args.input, args.delimiter, args.input_encoding.as_deref())?;

    let store = SqliteStore::open(&args.db)?;
    let table_ref = TableRef::parse(&args.table, &args.default_schema)?;
    let db_columns = store.table_columns(&table_ref)?;
    if db_columns.is_empty() {
        return Err(anyhow!(
            "table '{table_ref}' does not exist or has no columns"
        ));
    }

    let mapping = matcher::match_columns(&data.headers, &db_columns, &alias_table);

    let headers = vec!["header".to_string(), "column".to_string(), "match".to_string()];
    let mut rows = Vec::with_capacity(data.headers.len());
    for header in &data.headers {
        let row = match mapping.iter().find(|m| &m.header == header) {
            Some(m) => vec![
                header.clone(),
                m.column.clone(),
                match m.kind {
                    MatchKind::Alias => "alias".to_string(),
                    MatchKind::Fuzzy => "fuzzy".to_string(),
                },
            ],
            None => vec![header.clone(), "-".to_string(), "unmatched".to_string()],
        };
        rows.push(row);
    }
    table::print_table(&headers, &rows);

    info!(
        "{} of {} header(s) matched against {table_ref}",
        mapping.len(),
        data.headers.len()
    );
    Ok(())
}
