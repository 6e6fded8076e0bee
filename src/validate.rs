//! Referential-integrity validation ahead of staging.
//!
//! A row carrying a non-null value in a foreign-key column is only admitted
//! when the value exists in the referenced table. Violations reject the whole
//! row (never a partial row) and are recorded as ordinary values; the batch
//! continues with the next row. NULL values are always valid, which is what
//! makes zero-as-null foreign keys optional references.
//!
//! Existence lookups are the dominant latency cost of an import, so results
//! are cached per distinct (column, value) pair for the validator's lifetime.

use std::collections::HashMap;
use std::fmt;

use crate::error::ImportError;
use crate::store::MergeStore;
use crate::transform::{TransformedRow, Value};

/// Declares that a column's values must exist in another table's column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub column: String,
    pub ref_schema: String,
    pub ref_table: String,
    pub ref_column: String,
}

/// A row excluded by validation. Rendered into the import report's error
/// list; carries everything an operator needs to fix the source sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowRejection {
    pub row: usize,
    pub column: String,
    pub value: String,
    pub ref_schema: String,
    pub ref_table: String,
}

impl fmt::Display for RowRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "row {}: foreign-key violation: {}='{}' not found in {}.{}",
            self.row, self.column, self.value, self.ref_schema, self.ref_table
        )
    }
}

pub struct FkValidator {
    // Projected column index paired with its descriptor.
    descriptors: Vec<(usize, ForeignKey)>,
    cache: HashMap<(usize, String), bool>,
}

impl FkValidator {
    /// Binds descriptors to their positions in the projected column list.
    /// Descriptors for columns outside the projection are ignored; nothing
    /// will be staged into them.
    pub fn new(columns: &[String], descriptors: &HashMap<String, ForeignKey>) -> Self {
        let descriptors = columns
            .iter()
            .enumerate()
            .filter_map(|(index, column)| {
                descriptors
                    .iter()
                    .find(|(local, _)| local.eq_ignore_ascii_case(column))
                    .map(|(_, fk)| (index, fk.clone()))
            })
            .collect();
        Self {
            descriptors,
            cache: HashMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Checks every foreign-key column of `row`, returning the first
    /// violation if any. `row_number` is the 1-based data row used in the
    /// rejection message.
    pub fn check<S: MergeStore + ?Sized>(
        &mut self,
        store: &S,
        row_number: usize,
        row: &TransformedRow,
    ) -> Result<Option<RowRejection>, ImportError> {
        for (index, fk) in &self.descriptors {
            let Some(value) = row.values.get(*index).and_then(Option::as_ref) else {
                continue;
            };
            let cache_key = (*index, value.as_display());
            let exists = match self.cache.get(&cache_key) {
                Some(hit) => *hit,
                None => {
                    let found = store.reference_exists(fk, value)?;
                    self.cache.insert(cache_key, found);
                    found
                }
            };
            if !exists {
                return Ok(Some(RowRejection {
                    row: row_number,
                    column: fk.column.clone(),
                    value: value.as_display(),
                    ref_schema: fk.ref_schema.clone(),
                    ref_table: fk.ref_table.clone(),
                }));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_message_names_column_value_and_reference() {
        let rejection = RowRejection {
            row: 7,
            column: "CustomerID".into(),
            value: "C404".into(),
            ref_schema: "main".into(),
            ref_table: "Customers".into(),
        };
        let message = rejection.to_string();
        assert!(message.contains("CustomerID"));
        assert!(message.contains("C404"));
        assert!(message.contains("main.Customers"));
        assert!(message.contains("row 7"));
    }
}
