//! Task identifiers
//!
//! Every analytical operation the gateway can run is named by a [`TaskKind`].
//! The kind travels with every error so callers can tell which operation failed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One named analytical operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Compare as-designed and as-built bills of materials.
    ReconcileBoms,
    /// Triage an airworthiness directive against the fleet.
    AnalyzeRegulatoryImpact,
    /// Draft an engineering order for one regulatory impact.
    GenerateEngineeringOrder,
    /// Ripple analysis and management triage for a change request.
    AnalyzeChangeRequest,
    /// Implementation details for an engineering change notice.
    FetchEcnDetails,
    /// Segment a regulation document into structured rules.
    ParseRegulationDocument,
    /// Find library segments relevant to a free-text query.
    SemanticSearch,
    /// Extract PLM artifacts from a requirements document.
    ExtractRequirements,
    /// Audit regulation segments against PLM artifacts.
    EvaluateCompliance,
    /// Render an audit result as a certification report.
    GenerateCertificationReport,
    /// One turn of the virtual auditor conversation.
    AuditorChat,
}

impl TaskKind {
    /// All task kinds, in dispatch-table order.
    pub const ALL: [TaskKind; 11] = [
        TaskKind::ReconcileBoms,
        TaskKind::AnalyzeRegulatoryImpact,
        TaskKind::GenerateEngineeringOrder,
        TaskKind::AnalyzeChangeRequest,
        TaskKind::FetchEcnDetails,
        TaskKind::ParseRegulationDocument,
        TaskKind::SemanticSearch,
        TaskKind::ExtractRequirements,
        TaskKind::EvaluateCompliance,
        TaskKind::GenerateCertificationReport,
        TaskKind::AuditorChat,
    ];

    /// Stable identifier used in logs and serialized requests.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReconcileBoms => "reconcile_boms",
            Self::AnalyzeRegulatoryImpact => "analyze_regulatory_impact",
            Self::GenerateEngineeringOrder => "generate_engineering_order",
            Self::AnalyzeChangeRequest => "analyze_change_request",
            Self::FetchEcnDetails => "fetch_ecn_details",
            Self::ParseRegulationDocument => "parse_regulation_document",
            Self::SemanticSearch => "semantic_search",
            Self::ExtractRequirements => "extract_requirements",
            Self::EvaluateCompliance => "evaluate_compliance",
            Self::GenerateCertificationReport => "generate_certification_report",
            Self::AuditorChat => "auditor_chat",
        }
    }

    /// Parse from the stable identifier.
    pub fn from_str_id(s: &str) -> Result<Self, TaskKindParseError> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| TaskKindParseError(s.to_string()))
    }

    /// Human-readable prefix placed in front of every failure message for this task.
    pub fn failure_prefix(&self) -> &'static str {
        match self {
            Self::ReconcileBoms => "BOM Reconciliation Failure",
            Self::AnalyzeRegulatoryImpact => "Regulatory Impact Analysis Failure",
            Self::GenerateEngineeringOrder => "Engineering Order Drafting Failure",
            Self::AnalyzeChangeRequest => "Triage Pipeline Failure",
            Self::FetchEcnDetails => "ECN Lookup Failure",
            Self::ParseRegulationDocument => "Regulation Parsing Failure",
            Self::SemanticSearch => "Semantic Search Failure",
            Self::ExtractRequirements => "Requirement Extraction Failure",
            Self::EvaluateCompliance => "Compliance Evaluation Failure",
            Self::GenerateCertificationReport => "Certification Report Failure",
            Self::AuditorChat => "Virtual Auditor Failure",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskKind {
    type Err = TaskKindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_id(s)
    }
}

/// Error parsing TaskKind from string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskKindParseError(pub String);

impl fmt::Display for TaskKindParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid task kind: {}", self.0)
    }
}

impl std::error::Error for TaskKindParseError {}
