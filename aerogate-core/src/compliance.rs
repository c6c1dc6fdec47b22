//! Regulation pipeline and compliance audit records

use serde::{Deserialize, Serialize};

// ============================================================================
// REGULATION PIPELINE
// ============================================================================

/// How a regulation segment binds the applicant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SegmentNormalization {
    ComplianceObligation,
    Guidance,
    Observation,
}

impl SegmentNormalization {
    pub const ALL: [&'static str; 3] = ["COMPLIANCE_OBLIGATION", "GUIDANCE", "OBSERVATION"];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentMetadata {
    pub source_document: String,
    pub clause_number: String,
    #[serde(default)]
    pub dal_applicability: Vec<String>,
    pub lifecycle_area: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredRule {
    pub rule_type: String,
    pub object_of_compliance: String,
    pub requirement: String,
    #[serde(default)]
    pub evidence_required: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_condition: Option<Vec<String>>,
}

/// One clause of a parsed regulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedSegment {
    pub id: String,
    pub original_text: String,
    pub semantic_summary: String,
    pub normalization: SegmentNormalization,
    pub metadata: SegmentMetadata,
    pub structured_rule: StructuredRule,
}

/// Output of regulation document parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegulationPipelineResult {
    pub document_title: String,
    pub segments: Vec<ProcessedSegment>,
}

// ============================================================================
// PLM ARTIFACTS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlmArtifactType {
    Requirement,
    TestCase,
    TestResult,
    DesignDoc,
    CodeFile,
}

impl PlmArtifactType {
    pub const ALL: [&'static str; 5] = [
        "REQUIREMENT",
        "TEST_CASE",
        "TEST_RESULT",
        "DESIGN_DOC",
        "CODE_FILE",
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlmStatus {
    Draft,
    Approved,
    Obsolete,
}

impl PlmStatus {
    pub const ALL: [&'static str; 3] = ["DRAFT", "APPROVED", "OBSOLETE"];
}

/// A lifecycle artifact tracked in the PLM system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlmArtifact {
    pub id: String,
    #[serde(rename = "type")]
    pub artifact_type: PlmArtifactType,
    pub name: String,
    pub status: PlmStatus,
    pub content_snippet: String,
    #[serde(default)]
    pub trace_links: Vec<String>,
}

// ============================================================================
// AUDIT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditRiskLevel {
    Low,
    Moderate,
    High,
}

impl AuditRiskLevel {
    pub const ALL: [&'static str; 3] = ["LOW", "MODERATE", "HIGH"];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GapSeverity {
    High,
    Medium,
    Low,
}

impl GapSeverity {
    pub const ALL: [&'static str; 3] = ["HIGH", "MEDIUM", "LOW"];
}

/// A regulation clause lacking supporting evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceGap {
    pub regulation_clause_id: String,
    pub severity: GapSeverity,
    pub issue: String,
    pub missing_artifact_type: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceabilityEntry {
    pub reg_id: String,
    pub artifacts: Vec<String>,
}

/// Result of auditing regulation segments against PLM artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceAuditResult {
    pub overall_score: f64,
    pub risk_level: AuditRiskLevel,
    pub evaluated_count: u32,
    pub pass_count: u32,
    pub gap_analysis: Vec<ComplianceGap>,
    pub traceability_matrix: Vec<TraceabilityEntry>,
}

impl ComplianceAuditResult {
    /// True when the audit found no gaps.
    pub fn is_clean(&self) -> bool {
        self.gap_analysis.is_empty()
    }
}

/// Certification report sections rendered from an audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificationReport {
    pub title: String,
    pub generated_date: String,
    pub executive_summary: String,
    pub compliance_table: String,
    pub gap_analysis_section: String,
    pub conclusion: String,
}
