//! Storage collaborator contracts and table addressing.
//!
//! The import core talks to storage through [`MergeStore`]; the SQLite
//! implementation lives in [`crate::sqlite`]. Keeping the seam here means the
//! matcher/transformer/partitioner never see a connection handle.

use std::collections::HashMap;
use std::fmt;

use crate::error::ImportError;
use crate::transform::{TransformedRow, Value};
use crate::validate::ForeignKey;

/// A schema-qualified table reference. The schema is always explicit by the
/// time storage sees it; bare names pick up the configured default schema at
/// parse time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub schema: String,
    pub table: String,
}

impl TableRef {
    /// Parses `schema.table` or a bare `table` name, applying
    /// `default_schema` to the latter.
    pub fn parse(input: &str, default_schema: &str) -> Result<Self, ImportError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ImportError::Configuration("table name is required".into()));
        }
        match input.split_once('.') {
            Some((schema, table)) => {
                let schema = schema.trim();
                let table = table.trim();
                if schema.is_empty() || table.is_empty() {
                    return Err(ImportError::Configuration(format!(
                        "invalid table name '{input}'"
                    )));
                }
                Ok(Self {
                    schema: schema.to_string(),
                    table: table.to_string(),
                })
            }
            None => Ok(Self {
                schema: default_schema.to_string(),
                table: input.to_string(),
            }),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.table)
    }
}

/// An existing row snapshot: the surrogate row identity plus stored values
/// aligned to the projected column list.
#[derive(Debug, Clone)]
pub struct ExistingRow {
    pub surrogate: i64,
    pub values: Vec<Option<Value>>,
}

/// Snapshot of the target table keyed by trimmed business-key text. Loaded
/// once per import and read-only thereafter.
pub type ExistingRecordIndex = HashMap<String, ExistingRow>;

/// Storage operations the import pipeline depends on.
pub trait MergeStore {
    /// Column names of `table` in declaration order. An empty list signals
    /// that the table does not exist.
    fn table_columns(&self, table: &TableRef) -> Result<Vec<String>, ImportError>;

    /// Foreign-key descriptors of `table`, keyed by local column name.
    fn foreign_keys(&self, table: &TableRef) -> Result<HashMap<String, ForeignKey>, ImportError>;

    /// Whether `value` exists in the referenced column of `fk`.
    fn reference_exists(&self, fk: &ForeignKey, value: &Value) -> Result<bool, ImportError>;

    /// Loads the full snapshot of `table` restricted to `columns`, keyed by
    /// the business-key column's trimmed display text. Rows with an empty key
    /// are not indexed.
    fn load_existing(
        &self,
        table: &TableRef,
        columns: &[String],
        key_column: &str,
    ) -> Result<ExistingRecordIndex, ImportError>;

    /// Stages `rows` and applies the set-based insert/update as one atomic
    /// operation keyed by `key_column`. Returns the number of rows written;
    /// any failure rolls the whole batch back.
    fn apply_merge(
        &mut self,
        table: &TableRef,
        columns: &[String],
        key_column: &str,
        rows: &[TransformedRow],
    ) -> Result<usize, ImportError>;

    /// Plain transactional append of `rows` with no key handling; the
    /// insert-only flow. Returns the number of rows written.
    fn append_rows(
        &mut self,
        table: &TableRef,
        columns: &[String],
        rows: &[TransformedRow],
    ) -> Result<usize, ImportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_names_pick_up_the_default_schema() {
        let table = TableRef::parse("Projects", "main").expect("parsed");
        assert_eq!(table.schema, "main");
        assert_eq!(table.table, "Projects");
        assert_eq!(table.to_string(), "main.Projects");
    }

    #[test]
    fn qualified_names_keep_their_schema() {
        let table = TableRef::parse("archive.Projects", "main").expect("parsed");
        assert_eq!(table.schema, "archive");
        assert_eq!(table.table, "Projects");
    }

    #[test]
    fn empty_and_malformed_names_are_configuration_errors() {
        assert!(matches!(
            TableRef::parse("  ", "main"),
            Err(ImportError::Configuration(_))
        ));
        assert!(matches!(
            TableRef::parse(".Projects", "main"),
            Err(ImportError::Configuration(_))
        ));
        assert!(matches!(
            TableRef::parse("archive.", "main"),
            Err(ImportError::Configuration(_))
        ));
    }
}
