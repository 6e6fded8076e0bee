//! Set-based merge planning.
//!
//! Builds the SQL the store runs inside one transaction: stage every row into
//! a temp table shaped like the target, update matched business keys whose
//! content actually changed, then insert the keys the target does not have.
//! Column lists are derived from the staged columns. The business key appears
//! in the INSERT column list but never in the UPDATE SET clause; it is the
//! match key, not a mutable attribute.
//!
//! The change guard on the UPDATE re-applies the partitioner's null-aware
//! inequality (`IFNULL(x, '') <> IFNULL(y, '')`) so a set-based apply can
//! never touch rows the change detector would call unchanged.

use itertools::Itertools;

use crate::error::ImportError;
use crate::store::TableRef;

pub const STAGING_TABLE: &str = "sheet_merge_staging";

/// Double-quotes an identifier, doubling any embedded quote.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// `schema.table` with both parts quoted.
pub fn qualified(table: &TableRef) -> String {
    format!(
        "{}.{}",
        quote_ident(&table.schema),
        quote_ident(&table.table)
    )
}

fn staging_qualified() -> String {
    format!("temp.{}", quote_ident(STAGING_TABLE))
}

/// The statements one merge apply executes, in order.
#[derive(Debug)]
pub struct MergeScript {
    pub create_staging: String,
    /// Parameterized single-row insert into the staging table.
    pub stage_row: String,
    /// Absent when the projection has no non-key columns; there is nothing
    /// to mutate on matched rows.
    pub update_existing: Option<String>,
    pub insert_missing: String,
    pub drop_staging: String,
}

/// Builds the merge script for a projected column list. `columns` pairs each
/// column name with its declared type so the staging table keeps the
/// target's affinities.
pub fn build_script(
    table: &TableRef,
    columns: &[(String, String)],
    key_column: &str,
) -> Result<MergeScript, ImportError> {
    let key = columns
        .iter()
        .map(|(name, _)| name.as_str())
        .find(|name| name.eq_ignore_ascii_case(key_column))
        .ok_or_else(|| {
            ImportError::Configuration(format!(
                "business-key column '{key_column}' is not among the staged columns"
            ))
        })?;

    let staging = staging_qualified();
    let target = qualified(table);
    let quoted: Vec<String> = columns.iter().map(|(name, _)| quote_ident(name)).collect();
    let non_key: Vec<&str> = columns
        .iter()
        .map(|(name, _)| name.as_str())
        .filter(|name| !name.eq_ignore_ascii_case(key))
        .collect();

    let decls = columns
        .iter()
        .map(|(name, decl)| {
            if decl.is_empty() {
                quote_ident(name)
            } else {
                format!("{} {}", quote_ident(name), decl)
            }
        })
        .join(", ");
    let create_staging = format!(
        "DROP TABLE IF EXISTS {staging};\nCREATE TEMP TABLE {} ({decls});",
        quote_ident(STAGING_TABLE)
    );

    let placeholders = (1..=columns.len()).map(|idx| format!("?{idx}")).join(", ");
    let stage_row = format!(
        "INSERT INTO {staging} ({}) VALUES ({placeholders})",
        quoted.iter().join(", ")
    );

    let update_existing = if non_key.is_empty() {
        None
    } else {
        let assignments = non_key
            .iter()
            .map(|name| format!("{0} = source.{0}", quote_ident(name)))
            .join(", ");
        let changed = non_key
            .iter()
            .map(|name| {
                let quoted = quote_ident(name);
                format!("IFNULL(target.{quoted}, '') <> IFNULL(source.{quoted}, '')")
            })
            .join(" OR ");
        let key = quote_ident(key);
        Some(format!(
            "UPDATE {target} AS target SET {assignments}\n\
             FROM {staging} AS source\n\
             WHERE target.{key} = source.{key} AND ({changed})"
        ))
    };

    let insert_columns = quoted.iter().join(", ");
    let select_columns = quoted.iter().map(|name| format!("source.{name}")).join(", ");
    let key_quoted = quote_ident(key);
    let insert_missing = format!(
        "INSERT INTO {target} ({insert_columns})\n\
         SELECT {select_columns} FROM {staging} AS source\n\
         WHERE NOT EXISTS (SELECT 1 FROM {target} AS target WHERE target.{key_quoted} = source.{key_quoted})"
    );

    let drop_staging = format!("DROP TABLE IF EXISTS {staging};");

    Ok(MergeScript {
        create_staging,
        stage_row,
        update_existing,
        insert_missing,
        drop_staging,
    })
}

/// Parameterized single-row insert straight into the target; the insert-only
/// flow bypasses staging entirely.
pub fn insert_statement(table: &TableRef, columns: &[String]) -> String {
    let quoted = columns.iter().map(|name| quote_ident(name)).join(", ");
    let placeholders = (1..=columns.len()).map(|idx| format!("?{idx}")).join(", ");
    format!(
        "INSERT INTO {} ({quoted}) VALUES ({placeholders})",
        qualified(table)
    )
}
