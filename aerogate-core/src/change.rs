//! Change-management triage records

use crate::graph::GraphArtifact;
use serde::{Deserialize, Serialize};

/// An engineering change request submitted for triage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRequest {
    pub title: String,
    pub description: String,
    /// Free-text EBOM context. Truncated before it reaches the prompt.
    #[serde(default)]
    pub ebom_context: String,
    #[serde(default)]
    pub parallel_changes: Vec<ParallelChange>,
}

/// Another open change that may overlap the one under triage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParallelChange {
    pub cr_id: String,
    pub overlap_system: String,
    pub description: String,
}

/// Affected items grouped by kind of ripple.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ImpactTiers {
    #[serde(default)]
    pub physical: Vec<String>,
    #[serde(default)]
    pub functional: Vec<String>,
    #[serde(default)]
    pub regulatory: Vec<String>,
    #[serde(default)]
    pub logistical: Vec<String>,
}

/// Technical half of the triage: the ripple graph and its tiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalAnalysis {
    #[serde(flatten)]
    pub graph: GraphArtifact,
    pub tiers: ImpactTiers,
}

/// Review track chosen by triage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriageTrack {
    FastTrack,
    ManualReview,
}

impl TriageTrack {
    pub const ALL: [&'static str; 2] = ["FAST_TRACK", "MANUAL_REVIEW"];
}

/// How a stakeholder takes part in the review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StakeholderPriority {
    Required,
    Consulted,
    Informed,
}

impl StakeholderPriority {
    pub const ALL: [&'static str; 3] = ["REQUIRED", "CONSULTED", "INFORMED"];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stakeholder {
    pub role: String,
    pub reason: String,
    pub priority: StakeholderPriority,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeConflict {
    pub cr_id: String,
    pub overlap_system: String,
    pub conflict_description: String,
}

/// Management half of the triage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagementAssessment {
    /// 1 (trivial) to 10 (severe).
    pub risk_score: f64,
    pub triage_track: TriageTrack,
    pub stakeholders: Vec<Stakeholder>,
    #[serde(default)]
    pub conflicts: Vec<ChangeConflict>,
    #[serde(default)]
    pub estimated_man_hours: f64,
    pub technical_justification: String,
    pub pre_meeting_briefing: String,
    #[serde(default)]
    pub recommendation: String,
}

/// Full result of change-request triage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeManagerResult {
    pub technical: TechnicalAnalysis,
    pub management: ManagementAssessment,
}
