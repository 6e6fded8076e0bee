//! Change detection: classify transformed rows as insert, update, or
//! unchanged against the existing snapshot.
//!
//! Classification is content-based, never timestamp-based: a row only becomes
//! an update when at least one non-key column differs from the stored
//! snapshot under null-aware equality. Unchanged rows are dropped silently.
//! Lookup is O(1) per row against the pre-built [`ExistingRecordIndex`]; the
//! existing table is never re-scanned.

use std::collections::HashMap;

use crate::store::ExistingRecordIndex;
use crate::transform::{TransformedRow, values_equal};

/// Outcome of partitioning one batch. Inserts and updates are disjoint by
/// construction: membership in the snapshot index decides the branch, and
/// business keys are unique within each set.
#[derive(Debug, Default)]
pub struct MergePlan {
    pub inserts: Vec<TransformedRow>,
    pub updates: Vec<TransformedRow>,
    pub unchanged: usize,
    pub skipped: usize,
}

impl MergePlan {
    pub fn is_empty(&self) -> bool {
        self.inserts.is_empty() && self.updates.is_empty()
    }

    /// All rows destined for the staging area, inserts first.
    pub fn into_staged(self) -> Vec<TransformedRow> {
        let mut staged = self.inserts;
        staged.extend(self.updates);
        staged
    }
}

/// Partitions `rows` against the snapshot. Rows with an empty business key
/// are skipped; a batch-internal duplicate key supersedes the earlier row
/// (last write wins) and counts the superseded row as skipped. Updates carry
/// the snapshot's surrogate identity forward so storage can target the
/// physical row.
pub fn partition(
    rows: Vec<TransformedRow>,
    existing: &ExistingRecordIndex,
    key_index: usize,
) -> MergePlan {
    let mut plan = MergePlan::default();
    let mut insert_slots: HashMap<String, usize> = HashMap::new();
    let mut update_slots: HashMap<String, usize> = HashMap::new();

    for mut row in rows {
        if row.business_key.trim().is_empty() {
            plan.skipped += 1;
            continue;
        }

        match existing.get(&row.business_key) {
            None => {
                if let Some(&slot) = insert_slots.get(&row.business_key) {
                    plan.inserts[slot] = row;
                    plan.skipped += 1;
                } else {
                    insert_slots.insert(row.business_key.clone(), plan.inserts.len());
                    plan.inserts.push(row);
                }
            }
            Some(snapshot) => {
                let changed = row.values.iter().enumerate().any(|(idx, value)| {
                    idx != key_index
                        && !values_equal(
                            value.as_ref(),
                            snapshot.values.get(idx).and_then(Option::as_ref),
                        )
                });
                if !changed {
                    plan.unchanged += 1;
                    continue;
                }
                row.surrogate = Some(snapshot.surrogate);
                if let Some(&slot) = update_slots.get(&row.business_key) {
                    plan.updates[slot] = row;
                    plan.skipped += 1;
                } else {
                    update_slots.insert(row.business_key.clone(), plan.updates.len());
                    plan.updates.push(row);
                }
            }
        }
    }

    plan
}
