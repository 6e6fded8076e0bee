//! `preview` subcommand: show the first rows of a sheet as a table.

use anyhow::Result;
use log::info;

use crate::{cli::PreviewArgs, sheet, table};

pub fn execute(args: &PreviewArgs) -> Result<()> {
    let data = sheet::read_rows(&args.input, args.delimiter, args.input_encoding.as_deref())?;

    let rows: Vec<Vec<String>> = data
        .rows
        .iter()
        .take(args.rows)
        .map(|row| {
            row.iter()
                .map(|cell| cell.as_text().unwrap_or("").to_string())
                .collect()
        })
        .collect();

    table::print_table(&data.headers, &rows);
    info!("Displayed {} row(s) from {:?}", rows.len(), args.input);
    Ok(())
}
