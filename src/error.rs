//! Typed import error taxonomy.
//!
//! Per spec.md §7 / SPEC_FULL.md §5, fatal import failures fall into three
//! kinds. Row-scoped foreign-key violations are values (see
//! [`crate::validate::RowRejection`]), not errors. `rusqlite::Error` converts
//! into [`ImportError::Transaction`] so the storage layer can use `?`.

use thiserror::Error;

/// Fatal errors raised while importing. The orchestrator in
/// [`crate::import`] translates these into the report's error list.
#[derive(Debug, Error)]
pub enum ImportError {
    /// Empty/invalid table name, business-key column absent from the mapping,
    /// unreadable alias file, or unreadable input.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Target table missing or reporting zero columns, or no header matched
    /// any column.
    #[error("schema error: {0}")]
    Schema(String),

    /// Staging/apply failure; the transaction rolls back fully.
    #[error("transaction error: {0}")]
    Transaction(#[from] rusqlite::Error),
}
