//! SQLite-backed implementation of the storage contracts.
//!
//! Schema introspection goes through `PRAGMA table_info` and
//! `PRAGMA foreign_key_list`, both of which report columns in stable
//! declaration order. The merge apply stages rows into a temp table and runs
//! the set-based statements from [`crate::merge`] inside one
//! [`rusqlite::Transaction`]; dropping an uncommitted transaction rolls back,
//! so every exit path releases cleanly.

use std::collections::HashMap;
use std::path::Path;

use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{Connection, OptionalExtension, ToSql};

use crate::error::ImportError;
use crate::merge;
use crate::store::{ExistingRecordIndex, ExistingRow, MergeStore, TableRef};
use crate::transform::{TransformedRow, Value};
use crate::validate::ForeignKey;

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Integer(i) => ToSqlOutput::from(*i),
            Value::Text(t) => ToSqlOutput::from(t.as_str()),
        })
    }
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, ImportError> {
        let conn = Connection::open(path)?;
        Ok(Self::from_connection(conn))
    }

    pub fn open_in_memory() -> Result<Self, ImportError> {
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// (name, declared type) pairs for `columns` of `table`, in the order of
    /// `columns`. Declared types drive the staging table's affinities.
    fn column_decls(
        &self,
        table: &TableRef,
        columns: &[String],
    ) -> Result<Vec<(String, String)>, ImportError> {
        let mut decls: HashMap<String, String> = HashMap::new();
        let sql = format!(
            "PRAGMA {}.table_info({})",
            merge::quote_ident(&table.schema),
            merge::quote_ident(&table.table)
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let name: String = row.get(1)?;
            let decl: String = row.get::<_, Option<String>>(2)?.unwrap_or_default();
            decls.insert(name.to_lowercase(), decl);
        }
        Ok(columns
            .iter()
            .map(|column| {
                let decl = decls.get(&column.to_lowercase()).cloned().unwrap_or_default();
                (column.clone(), decl)
            })
            .collect())
    }

    fn primary_key_column(&self, table: &TableRef) -> Result<String, ImportError> {
        let sql = format!(
            "PRAGMA {}.table_info({})",
            merge::quote_ident(&table.schema),
            merge::quote_ident(&table.table)
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let pk: i64 = row.get(5)?;
            if pk > 0 {
                return Ok(row.get(1)?);
            }
        }
        Ok("rowid".to_string())
    }
}

fn read_value(value: ValueRef<'_>) -> Option<Value> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(Value::Integer(i)),
        ValueRef::Real(f) => {
            if f.fract() == 0.0 && f.abs() < 1e15 {
                Some(Value::Text((f as i64).to_string()))
            } else {
                Some(Value::Text(f.to_string()))
            }
        }
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Some(Value::Text(String::from_utf8_lossy(bytes).into_owned()))
        }
    }
}

impl MergeStore for SqliteStore {
    fn table_columns(&self, table: &TableRef) -> Result<Vec<String>, ImportError> {
        let sql = format!(
            "PRAGMA {}.table_info({})",
            merge::quote_ident(&table.schema),
            merge::quote_ident(&table.table)
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let columns = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(columns)
    }

    fn foreign_keys(&self, table: &TableRef) -> Result<HashMap<String, ForeignKey>, ImportError> {
        let sql = format!(
            "PRAGMA {}.foreign_key_list({})",
            merge::quote_ident(&table.schema),
            merge::quote_ident(&table.table)
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(3)?,         // local column
                    row.get::<_, String>(2)?,         // referenced table
                    row.get::<_, Option<String>>(4)?, // referenced column; NULL = implicit PK
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut descriptors = HashMap::new();
        for (column, ref_table, ref_column) in rows {
            let ref_column = match ref_column {
                Some(name) => name,
                None => self.primary_key_column(&TableRef {
                    schema: table.schema.clone(),
                    table: ref_table.clone(),
                })?,
            };
            descriptors.insert(
                column.clone(),
                ForeignKey {
                    column,
                    // foreign_key_list cannot reference across attached
                    // databases; the parent lives in the same schema.
                    ref_schema: table.schema.clone(),
                    ref_table,
                    ref_column,
                },
            );
        }
        Ok(descriptors)
    }

    fn reference_exists(&self, fk: &ForeignKey, value: &Value) -> Result<bool, ImportError> {
        let sql = format!(
            "SELECT 1 FROM {}.{} WHERE {} = ?1 LIMIT 1",
            merge::quote_ident(&fk.ref_schema),
            merge::quote_ident(&fk.ref_table),
            merge::quote_ident(&fk.ref_column)
        );
        let found = self
            .conn
            .query_row(&sql, [value], |_| Ok(()))
            .optional()?
            .is_some();
        Ok(found)
    }

    fn load_existing(
        &self,
        table: &TableRef,
        columns: &[String],
        key_column: &str,
    ) -> Result<ExistingRecordIndex, ImportError> {
        let key_index = columns
            .iter()
            .position(|column| column.eq_ignore_ascii_case(key_column))
            .ok_or_else(|| {
                ImportError::Configuration(format!(
                    "business-key column '{key_column}' is not among the projected columns"
                ))
            })?;

        let column_list = columns
            .iter()
            .map(|column| merge::quote_ident(column))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT rowid, {column_list} FROM {}",
            merge::qualified(table)
        );

        let mut index = ExistingRecordIndex::new();
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let surrogate: i64 = row.get(0)?;
            let mut values = Vec::with_capacity(columns.len());
            for idx in 0..columns.len() {
                values.push(read_value(row.get_ref(idx + 1)?));
            }
            let key = values[key_index]
                .as_ref()
                .map(|value| value.as_display().trim().to_string())
                .unwrap_or_default();
            if key.is_empty() {
                continue;
            }
            index.insert(key, ExistingRow { surrogate, values });
        }
        Ok(index)
    }

    fn apply_merge(
        &mut self,
        table: &TableRef,
        columns: &[String],
        key_column: &str,
        rows: &[TransformedRow],
    ) -> Result<usize, ImportError> {
        let decls = self.column_decls(table, columns)?;
        let script = merge::build_script(table, &decls, key_column)?;

        let tx = self.conn.transaction()?;
        tx.execute_batch(&script.create_staging)?;
        {
            let mut stage = tx.prepare(&script.stage_row)?;
            for row in rows {
                stage.execute(rusqlite::params_from_iter(
                    row.values.iter().map(Option::as_ref),
                ))?;
            }
        }
        let updated = match &script.update_existing {
            Some(update) => tx.execute(update, [])?,
            None => 0,
        };
        let inserted = tx.execute(&script.insert_missing, [])?;
        tx.execute_batch(&script.drop_staging)?;
        tx.commit()?;

        Ok(updated + inserted)
    }

    fn append_rows(
        &mut self,
        table: &TableRef,
        columns: &[String],
        rows: &[TransformedRow],
    ) -> Result<usize, ImportError> {
        let sql = merge::insert_statement(table, columns);
        let tx = self.conn.transaction()?;
        let mut written = 0usize;
        {
            let mut insert = tx.prepare(&sql)?;
            for row in rows {
                written += insert.execute(rusqlite::params_from_iter(
                    row.values.iter().map(Option::as_ref),
                ))?;
            }
        }
        tx.commit()?;
        Ok(written)
    }
}
