//! Airworthiness directive triage records

use serde::{Deserialize, Serialize};

/// One aircraft in the operator's fleet inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetAircraft {
    pub tail_number: String,
    pub model: String,
    #[serde(default)]
    pub engine: String,
    #[serde(default)]
    pub cycles: u64,
    #[serde(default)]
    pub components: Vec<String>,
}

/// Compliance state of an aircraft against a directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplianceStatus {
    Compliant,
    NonCompliant,
    PendingInspection,
}

impl ComplianceStatus {
    pub const ALL: [&'static str; 3] = ["COMPLIANT", "NON_COMPLIANT", "PENDING_INSPECTION"];
}

/// Handling priority of a regulatory impact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImpactPriority {
    Urgent,
    Informational,
    Administrative,
}

impl ImpactPriority {
    pub const ALL: [&'static str; 3] = ["URGENT", "INFORMATIONAL", "ADMINISTRATIVE"];
}

/// A directive's effect on one aircraft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegulatoryImpact {
    pub affected_tail_number: String,
    pub component: String,
    pub required_action: String,
    pub deadline: String,
    pub compliance_status: ComplianceStatus,
    pub priority: ImpactPriority,
}

/// Draft engineering order produced from an impact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineeringOrder {
    pub eo_number: String,
    #[serde(rename = "relatedAD")]
    pub related_ad: String,
    pub title: String,
    pub compliance_deadline: String,
    pub applicability: String,
    pub instructions: Vec<String>,
    pub parts_required: Vec<String>,
    pub man_hours: f64,
}

/// Implementation record of an engineering change notice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EcnDetail {
    pub id: String,
    pub title: String,
    pub solution: String,
    pub approver: String,
    pub approval_date: String,
    pub impacted_docs: Vec<String>,
}
