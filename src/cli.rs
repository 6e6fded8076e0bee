use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(version, about = "Change-aware spreadsheet imports into SQLite", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Import a spreadsheet into a database table with a change-aware upsert
    Import(ImportArgs),
    /// Show how sheet headers resolve against a table's columns
    Map(MapArgs),
    /// Preview the first few rows of a sheet in a formatted table
    Preview(PreviewArgs),
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// Input sheet (.csv, .tsv, .xlsx; use '-' for CSV on stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// SQLite database file
    #[arg(long = "db")]
    pub db: PathBuf,
    /// Target table, optionally schema-qualified as `schema.table`
    #[arg(short = 't', long = "table")]
    pub table: String,
    /// Business-key column used to match incoming rows to stored rows
    #[arg(long, default_value = "RecordNo")]
    pub key: String,
    /// YAML file extending or overriding the built-in header aliases
    #[arg(long)]
    pub aliases: Option<PathBuf>,
    /// Schema assumed when the table name carries no prefix
    #[arg(long = "default-schema", default_value = "main")]
    pub default_schema: String,
    /// Input header whose '0' values become NULL foreign keys
    #[arg(long = "zero-null-column", default_value = "uot_sold_party_dp")]
    pub zero_null_column: String,
    /// Append every admitted row as an insert; skips the snapshot, the
    /// business-key requirement, and FK validation
    #[arg(long = "insert-only")]
    pub insert_only: bool,
    /// Keep the merge flow but do not validate foreign keys
    #[arg(long = "skip-fk-checks")]
    pub skip_fk_checks: bool,
    /// Classify rows without touching the target table
    #[arg(long = "dry-run")]
    pub dry_run: bool,
    /// Print the import report as JSON on stdout
    #[arg(long)]
    pub json: bool,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of CSV input (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct MapArgs {
    /// Input sheet (.csv, .tsv, .xlsx)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// SQLite database file
    #[arg(long = "db")]
    pub db: PathBuf,
    /// Target table, optionally schema-qualified as `schema.table`
    #[arg(short = 't', long = "table")]
    pub table: String,
    /// YAML file extending or overriding the built-in header aliases
    #[arg(long)]
    pub aliases: Option<PathBuf>,
    /// Schema assumed when the table name carries no prefix
    #[arg(long = "default-schema", default_value = "main")]
    pub default_schema: String,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of CSV input (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    /// Input sheet (.csv, .tsv, .xlsx)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Number of rows to display
    #[arg(long, default_value_t = 10)]
    pub rows: usize,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of CSV input (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
