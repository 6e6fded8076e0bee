//! Alias table mapping known exporter header spellings to logical names.
//!
//! The built-in entries are accumulated production knowledge about upstream
//! source-system exports; they are not derivable from naming convention. A
//! YAML file of `raw_header: LogicalName` pairs can extend or override the
//! built-ins at startup so new exporter spellings land without a redeploy.
//!
//! Lookup is by raw header string, case-insensitive.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};

/// Known source-system header spellings and the logical column they carry.
const BUILTIN_ALIASES: &[(&str, &str)] = &[
    // Customer master
    ("uot_sold_party_code_sdt120", "CompanyCode"),
    ("ucm_comp_name_sdt120", "CompanyName"),
    ("ucm_url_hp", "CompanyURL"),
    ("phone_number004", "WorkPhoneNumber"),
    ("uvetaxidtb16", "GST"),
    ("uot_sold_party_dp", "CustomerID"),
    // Customer contacts
    ("uircntctfstnmtb", "ContactFirstName"),
    ("uricntctlstnmtb", "ContactLastName"),
    ("ugenzipcodetxt16", "ZipPostalCode"),
    // Projects
    ("us_xcpr_id", "ProjectTemplateID"),
    ("shellnumber", "ProjectNumber"),
    ("shellname", "ProjectName"),
    ("pid", "RecordNo"),
    // Vendor master
    ("vendor_master_vendor", "VendorName"),
    ("vendor_master_con_person", "ContactPerson"),
    ("vendor_master_con_number", "ContactNumber"),
    ("vendor_master_manu_add", "ManufacturingAddress"),
    ("vendor_master_code", "VendorCode"),
];

#[derive(Debug, Clone)]
pub struct AliasTable {
    // Keyed by lowercased raw header.
    entries: HashMap<String, String>,
}

impl AliasTable {
    /// The built-in production alias set.
    pub fn builtin() -> Self {
        let entries = BUILTIN_ALIASES
            .iter()
            .map(|(header, logical)| (header.to_lowercase(), (*logical).to_string()))
            .collect();
        Self { entries }
    }

    /// Merges `raw_header: LogicalName` pairs from a YAML file on top of the
    /// current entries. File entries win over built-ins.
    pub fn merge_file(&mut self, path: &Path) -> Result<()> {
        let file = File::open(path).with_context(|| format!("Opening alias file {path:?}"))?;
        let overrides: HashMap<String, String> = serde_yaml::from_reader(BufReader::new(file))
            .with_context(|| format!("Parsing alias YAML {path:?}"))?;
        for (header, logical) in overrides {
            self.entries.insert(header.trim().to_lowercase(), logical);
        }
        Ok(())
    }

    /// Logical column name for a raw header, matched case-insensitively.
    pub fn logical_name(&self, raw_header: &str) -> Option<&str> {
        self.entries
            .get(&raw_header.to_lowercase())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Built-in aliases plus an optional override file.
pub fn load(path: Option<&Path>) -> Result<AliasTable> {
    let mut table = AliasTable::builtin();
    if let Some(path) = path {
        table.merge_file(path)?;
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_lookup_is_case_insensitive() {
        let table = AliasTable::builtin();
        assert_eq!(table.logical_name("pid"), Some("RecordNo"));
        assert_eq!(table.logical_name("PID"), Some("RecordNo"));
        assert_eq!(table.logical_name("Pid"), Some("RecordNo"));
        assert_eq!(table.logical_name("unknown"), None);
    }

    #[test]
    fn builtin_covers_the_known_exporters() {
        let table = AliasTable::builtin();
        assert_eq!(table.len(), BUILTIN_ALIASES.len());
        assert_eq!(
            table.logical_name("vendor_master_manu_add"),
            Some("ManufacturingAddress")
        );
        assert_eq!(table.logical_name("uot_sold_party_dp"), Some("CustomerID"));
    }
}
