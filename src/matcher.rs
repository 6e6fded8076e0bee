//! Header-to-column reconciliation.
//!
//! Maps inconsistently-named sheet headers onto a table's actual column
//! names. Per header, the layered strategy is: alias table first (known
//! exporter spellings resolved to a logical name, which must line up with a
//! normalized column name), then a fuzzy fallback where the normalized header
//! and a normalized column name contain one another. Headers that survive
//! neither layer are dropped from the mapping.
//!
//! The result is deterministic for fixed inputs: headers are visited in sheet
//! order and the fuzzy scan takes the first hit in column order, which the
//! schema introspector reports in stable declaration order.

use std::collections::HashMap;

use itertools::Itertools;

use crate::aliases::AliasTable;

/// How a header ended up mapped to its column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Alias,
    Fuzzy,
}

#[derive(Debug, Clone)]
pub struct ColumnMatch {
    pub header: String,
    pub column: String,
    pub kind: MatchKind,
}

/// Header→column mapping in sheet order. Headers are unique (a repeated
/// header string keeps its first occurrence); destination columns may repeat,
/// and the staged projection dedupes them first-occurrence-wins.
#[derive(Debug, Clone, Default)]
pub struct ColumnMapping {
    matches: Vec<ColumnMatch>,
}

impl ColumnMapping {
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ColumnMatch> {
        self.matches.iter()
    }

    pub fn column_for(&self, header: &str) -> Option<&str> {
        self.matches
            .iter()
            .find(|m| m.header == header)
            .map(|m| m.column.as_str())
    }

    /// Distinct destination columns, first occurrence wins.
    pub fn destinations(&self) -> Vec<&str> {
        self.matches
            .iter()
            .map(|m| m.column.as_str())
            .unique()
            .collect()
    }
}

/// Canonical comparison form of a header or column name: lowercased with
/// whitespace, underscores, dashes, and line breaks removed. Pure and total;
/// the empty string normalizes to itself and never matches anything.
pub fn normalize(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Builds the header→column mapping for one import.
pub fn match_columns(
    headers: &[String],
    db_columns: &[String],
    aliases: &AliasTable,
) -> ColumnMapping {
    // Normalize the column list once. The ordered list drives the fuzzy scan;
    // the map serves alias resolution (first column wins a normalized tie).
    let mut ordered: Vec<(String, &str)> = Vec::with_capacity(db_columns.len());
    let mut by_normalized: HashMap<String, &str> = HashMap::new();
    for column in db_columns {
        let normalized = normalize(column);
        if normalized.is_empty() {
            continue;
        }
        by_normalized
            .entry(normalized.clone())
            .or_insert(column.as_str());
        ordered.push((normalized, column.as_str()));
    }

    let mut matches: Vec<ColumnMatch> = Vec::new();
    for header in headers {
        if matches.iter().any(|m| &m.header == header) {
            continue;
        }

        // 1. Alias lookup on the raw header string.
        if let Some(logical) = aliases.logical_name(header)
            && let Some(column) = by_normalized.get(&normalize(logical))
        {
            matches.push(ColumnMatch {
                header: header.clone(),
                column: (*column).to_string(),
                kind: MatchKind::Alias,
            });
            continue;
        }

        // 2. Containment fallback on normalized forms.
        let needle = normalize(header);
        if needle.is_empty() {
            continue;
        }
        if let Some((_, column)) = ordered
            .iter()
            .find(|(normalized, _)| normalized.contains(&needle) || needle.contains(normalized))
        {
            matches.push(ColumnMatch {
                header: header.clone(),
                column: (*column).to_string(),
                kind: MatchKind::Fuzzy,
            });
        }
    }

    ColumnMapping { matches }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn normalize_strips_separators_and_case() {
        assert_eq!(normalize("Work_Phone-Number"), "workphonenumber");
        assert_eq!(normalize("  Company Name \r\n"), "companyname");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn alias_beats_fuzzy_containment() {
        // "pid" would fuzzily match PidCode; the alias must win and route it
        // to RecordNo instead.
        let mapping = match_columns(
            &columns(&["pid"]),
            &columns(&["PidCode", "RecordNo"]),
            &AliasTable::builtin(),
        );
        assert_eq!(mapping.column_for("pid"), Some("RecordNo"));
        assert_eq!(mapping.iter().next().unwrap().kind, MatchKind::Alias);
    }

    #[test]
    fn fuzzy_takes_first_column_in_declaration_order() {
        let mapping = match_columns(
            &columns(&["name"]),
            &columns(&["CompanyName", "Name"]),
            &AliasTable::builtin(),
        );
        assert_eq!(mapping.column_for("name"), Some("CompanyName"));
    }

    #[test]
    fn unmatched_and_empty_headers_are_dropped() {
        let mapping = match_columns(
            &columns(&["completely_unrelated_xyz", "", "   "]),
            &columns(&["RecordNo"]),
            &AliasTable::builtin(),
        );
        assert!(mapping.is_empty());
    }

    #[test]
    fn duplicate_destinations_stay_in_the_mapping() {
        let mapping = match_columns(
            &columns(&["Company Name", "CompanyName"]),
            &columns(&["CompanyName"]),
            &AliasTable::builtin(),
        );
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping.destinations(), vec!["CompanyName"]);
    }
}
