use std::collections::HashSet;

use sheet_merge::partition::partition;
use sheet_merge::store::{ExistingRecordIndex, ExistingRow};
use sheet_merge::transform::{TransformedRow, Value};

const KEY: usize = 0;

fn row(key: &str, values: &[Option<&str>]) -> TransformedRow {
    let mut all = vec![Some(Value::Text(key.to_string()))];
    all.extend(
        values
            .iter()
            .map(|v| v.map(|text| Value::Text(text.to_string()))),
    );
    TransformedRow {
        business_key: key.trim().to_string(),
        surrogate: None,
        values: all,
    }
}

fn snapshot(entries: &[(&str, i64, &[Option<&str>])]) -> ExistingRecordIndex {
    entries
        .iter()
        .map(|(key, surrogate, values)| {
            let mut all = vec![Some(Value::Text(key.to_string()))];
            all.extend(
                values
                    .iter()
                    .map(|v| v.map(|text| Value::Text(text.to_string()))),
            );
            (
                key.to_string(),
                ExistingRow {
                    surrogate: *surrogate,
                    values: all,
                },
            )
        })
        .collect()
}

#[test]
fn unknown_keys_become_inserts() {
    let plan = partition(vec![row("R1", &[Some("Acme")])], &snapshot(&[]), KEY);
    assert_eq!(plan.inserts.len(), 1);
    assert!(plan.updates.is_empty());
    assert_eq!(plan.unchanged, 0);
}

#[test]
fn identical_rows_are_dropped_silently() {
    let existing = snapshot(&[("R1", 11, &[Some("Acme")])]);
    let plan = partition(vec![row("R1", &[Some("Acme")])], &existing, KEY);
    assert!(plan.inserts.is_empty());
    assert!(plan.updates.is_empty());
    assert_eq!(plan.unchanged, 1);
}

#[test]
fn changed_rows_carry_the_snapshot_surrogate_forward() {
    let existing = snapshot(&[("R1", 11, &[Some("Acme")])]);
    let plan = partition(vec![row("R1", &[Some("Acme Corp")])], &existing, KEY);
    assert!(plan.inserts.is_empty());
    assert_eq!(plan.updates.len(), 1);
    assert_eq!(plan.updates[0].surrogate, Some(11));
}

#[test]
fn blank_business_keys_are_skipped() {
    let plan = partition(
        vec![row("", &[Some("Acme")]), row("   ", &[Some("Beta")])],
        &snapshot(&[]),
        KEY,
    );
    assert!(plan.is_empty());
    assert_eq!(plan.skipped, 2);
}

#[test]
fn null_and_empty_text_compare_equal_for_change_detection() {
    let existing = snapshot(&[("R1", 11, &[Some("")])]);
    let plan = partition(vec![row("R1", &[None])], &existing, KEY);
    assert_eq!(plan.unchanged, 1);
    assert!(plan.updates.is_empty());
}

#[test]
fn snapshot_missing_trailing_columns_count_as_null() {
    let existing = snapshot(&[("R1", 11, &[])]);
    let plan = partition(vec![row("R1", &[None])], &existing, KEY);
    assert_eq!(plan.unchanged, 1);
}

#[test]
fn every_keyed_row_lands_in_exactly_one_bucket() {
    let existing = snapshot(&[
        ("R1", 1, &[Some("Acme")]),
        ("R2", 2, &[Some("Beta")]),
    ]);
    let rows = vec![
        row("R1", &[Some("Acme")]),      // unchanged
        row("R2", &[Some("Beta Corp")]), // update
        row("R3", &[Some("Gamma")]),     // insert
        row("", &[Some("skipped")]),     // skipped
    ];
    let total = rows.len();
    let plan = partition(rows, &existing, KEY);

    assert_eq!(
        plan.inserts.len() + plan.updates.len() + plan.unchanged + plan.skipped,
        total
    );

    let insert_keys: HashSet<_> = plan.inserts.iter().map(|r| r.business_key.clone()).collect();
    let update_keys: HashSet<_> = plan.updates.iter().map(|r| r.business_key.clone()).collect();
    assert!(insert_keys.is_disjoint(&update_keys));
}

#[test]
fn duplicate_insert_keys_keep_the_last_row() {
    let plan = partition(
        vec![row("R1", &[Some("first")]), row("R1", &[Some("second")])],
        &snapshot(&[]),
        KEY,
    );
    assert_eq!(plan.inserts.len(), 1);
    assert_eq!(plan.skipped, 1);
    assert_eq!(
        plan.inserts[0].values[1],
        Some(Value::Text("second".into()))
    );
}

#[test]
fn staged_rows_list_inserts_before_updates() {
    let existing = snapshot(&[("R1", 1, &[Some("Acme")])]);
    let plan = partition(
        vec![row("R1", &[Some("Changed")]), row("R9", &[Some("New")])],
        &existing,
        KEY,
    );
    let staged = plan.into_staged();
    assert_eq!(staged.len(), 2);
    assert_eq!(staged[0].business_key, "R9");
    assert_eq!(staged[1].business_key, "R1");
}
