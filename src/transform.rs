//! Typed row construction: per-column coercion rules and the projection that
//! shapes staged rows.
//!
//! Coercion rules applied before a cell lands in its destination column:
//!
//! - **Status**: a source column whose normalized header is `status` is
//!   encoded as an integer. Empty → 2, `Active` → 1, `Terminated` → 2, and
//!   any unrecognized text → 2; the default-to-terminated fallback is a
//!   business decision carried from the source system.
//! - **Zero-as-null**: the designated customer-identifier column maps the
//!   exact trimmed text `0` to NULL (an optional reference); every other
//!   value keeps its trimmed text, so `00` stays `00`.
//! - **Default**: empty cells become NULL, text is kept verbatim. Storage
//!   applies its own typing downstream.

use std::fmt;

use crate::error::ImportError;
use crate::matcher::{self, ColumnMapping};
use crate::sheet::Cell;

pub const STATUS_ACTIVE: i64 = 1;
pub const STATUS_TERMINATED: i64 = 2;

/// A coerced database value. SQL NULL is `None` at every call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Integer(i64),
    Text(String),
}

impl Value {
    pub fn as_display(&self) -> String {
        match self {
            Value::Integer(i) => i.to_string(),
            Value::Text(t) => t.clone(),
        }
    }

    fn is_blank(&self) -> bool {
        matches!(self, Value::Text(t) if t.is_empty())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{i}"),
            Value::Text(t) => write!(f, "{t}"),
        }
    }
}

/// Null-aware equality used for change detection: NULL compares equal to the
/// empty string, and integers compare equal to their decimal text form, the
/// same way the set-based apply compares staged against stored values.
pub fn values_equal(left: Option<&Value>, right: Option<&Value>) -> bool {
    match (left, right) {
        (None, None) => true,
        (None, Some(v)) | (Some(v), None) => v.is_blank(),
        (Some(Value::Text(a)), Some(Value::Text(b))) => a == b,
        (Some(Value::Integer(a)), Some(Value::Integer(b))) => a == b,
        (Some(Value::Integer(i)), Some(Value::Text(t)))
        | (Some(Value::Text(t)), Some(Value::Integer(i))) => *t == i.to_string(),
    }
}

/// The staged shape of an import: distinct destination columns in mapping
/// order, plus where the business key lives within them.
#[derive(Debug, Clone)]
pub struct Projection {
    pub columns: Vec<String>,
    pub key_index: Option<usize>,
}

/// One transformed input row: coerced values aligned to the projection, the
/// business-key text used for snapshot lookup, and (for updates) the
/// surrogate row identity carried forward from the existing snapshot.
#[derive(Debug, Clone)]
pub struct TransformedRow {
    pub business_key: String,
    pub surrogate: Option<i64>,
    pub values: Vec<Option<Value>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Status,
    ZeroNull,
    Plain,
}

#[derive(Debug)]
struct Slot {
    source: usize,
    dest: usize,
    role: Role,
}

/// Applies the coercion rules to raw rows. Built once per import from the
/// column mapping; rejects the whole import up front when the business-key
/// column is absent from the mapped destinations.
#[derive(Debug)]
pub struct RowTransformer {
    projection: Projection,
    slots: Vec<Slot>,
}

impl RowTransformer {
    pub fn new(
        headers: &[String],
        mapping: &ColumnMapping,
        key_column: Option<&str>,
        zero_null_header: &str,
    ) -> Result<Self, ImportError> {
        let columns: Vec<String> = mapping
            .destinations()
            .into_iter()
            .map(str::to_string)
            .collect();

        let key_index = match key_column {
            Some(key) => Some(
                columns
                    .iter()
                    .position(|column| column.eq_ignore_ascii_case(key))
                    .ok_or_else(|| {
                        ImportError::Configuration(format!(
                            "business-key column '{key}' is not among the mapped columns"
                        ))
                    })?,
            ),
            None => None,
        };

        let zero_null = matcher::normalize(zero_null_header);
        let mut slots = Vec::with_capacity(mapping.len());
        for m in mapping.iter() {
            // The mapping was built from this header list, so both lookups
            // hold; a miss would mean the caller mixed mappings and headers.
            let (Some(source), Some(dest)) = (
                headers.iter().position(|header| header == &m.header),
                columns.iter().position(|column| column == &m.column),
            ) else {
                continue;
            };
            let normalized = matcher::normalize(&m.header);
            let role = if normalized == "status" {
                Role::Status
            } else if !zero_null.is_empty() && normalized == zero_null {
                Role::ZeroNull
            } else {
                Role::Plain
            };
            slots.push(Slot { source, dest, role });
        }

        Ok(Self {
            projection: Projection { columns, key_index },
            slots,
        })
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    /// Coerces one raw row. When two headers feed the same destination the
    /// later header's value wins. Cells beyond the row's width count as empty.
    pub fn transform(&self, row: &[Cell]) -> TransformedRow {
        let mut values: Vec<Option<Value>> = vec![None; self.projection.columns.len()];
        for slot in &self.slots {
            let text = row.get(slot.source).and_then(Cell::as_text);
            values[slot.dest] = match slot.role {
                Role::Status => Some(Value::Integer(status_code(text))),
                Role::ZeroNull => zero_as_null(text),
                Role::Plain => text.map(|text| Value::Text(text.to_string())),
            };
        }

        let business_key = self
            .projection
            .key_index
            .and_then(|idx| values[idx].as_ref())
            .map(|value| value.as_display().trim().to_string())
            .unwrap_or_default();

        TransformedRow {
            business_key,
            surrogate: None,
            values,
        }
    }
}

fn status_code(text: Option<&str>) -> i64 {
    match text {
        None => STATUS_TERMINATED,
        Some(text) if text.trim().eq_ignore_ascii_case("active") => STATUS_ACTIVE,
        // "Terminated" and every unrecognized code fall back to terminated.
        Some(_) => STATUS_TERMINATED,
    }
}

fn zero_as_null(text: Option<&str>) -> Option<Value> {
    let trimmed = text?.trim();
    if trimmed.is_empty() || trimmed == "0" {
        None
    } else {
        Some(Value::Text(trimmed.to_string()))
    }
}
