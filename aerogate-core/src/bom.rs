//! Bill-of-materials records

use serde::{Deserialize, Serialize};

/// One line of an as-designed or as-built bill of materials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BomItem {
    pub part_number: String,
    #[serde(default)]
    pub description: String,
    pub revision: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    pub quantity: u32,
}

impl BomItem {
    pub fn new(part_number: impl Into<String>, revision: impl Into<String>, quantity: u32) -> Self {
        Self {
            part_number: part_number.into(),
            description: String::new(),
            revision: revision.into(),
            serial_number: None,
            quantity,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Kind of mismatch between the two BOMs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscrepancyType {
    MissingPart,
    VersionMismatch,
    ExtraPart,
    QuantityMismatch,
}

impl DiscrepancyType {
    pub const ALL: [&'static str; 4] = [
        "MISSING_PART",
        "VERSION_MISMATCH",
        "EXTRA_PART",
        "QUANTITY_MISMATCH",
    ];
}

/// Severity of a BOM discrepancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Minor,
    Major,
    Critical,
}

impl Severity {
    pub const ALL: [&'static str; 3] = ["CRITICAL", "MAJOR", "MINOR"];
}

/// One discrepancy reported by BOM reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BomDiscrepancy {
    pub part_number: String,
    pub issue_type: DiscrepancyType,
    pub severity: Severity,
    pub description: String,
    pub recommendation: String,
}
