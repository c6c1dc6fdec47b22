//! aerogate Core - Domain Types
//!
//! Pure data structures shared by the gateway and its callers: task
//! identifiers, domain records, the graph artifact, configuration, and the
//! error taxonomy. No network code lives here.

use chrono::{DateTime, Utc};
use uuid::Uuid;

pub mod attachment;
pub mod bom;
pub mod change;
pub mod chat;
pub mod compliance;
pub mod config;
pub mod error;
pub mod graph;
pub mod history;
pub mod regulatory;
pub mod task;

// ============================================================================
// IDENTITY TYPES
// ============================================================================

/// Identifier for history entries. UUIDv7, so ids sort by creation time.
pub type EntryId = Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Generate a new UUIDv7 EntryId.
pub fn new_entry_id() -> EntryId {
    Uuid::now_v7()
}

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use attachment::{Attachment, DocumentInput, MEDIA_TYPE_PDF};
pub use bom::{BomDiscrepancy, BomItem, DiscrepancyType, Severity};
pub use change::{
    ChangeConflict, ChangeManagerResult, ChangeRequest, ImpactTiers, ManagementAssessment,
    ParallelChange, Stakeholder, StakeholderPriority, TechnicalAnalysis, TriageTrack,
};
pub use chat::{ChatRole, ChatTurn, ConversationHistory};
pub use compliance::{
    AuditRiskLevel, CertificationReport, ComplianceAuditResult, ComplianceGap, GapSeverity,
    PlmArtifact, PlmArtifactType, PlmStatus, ProcessedSegment, RegulationPipelineResult,
    SegmentMetadata, SegmentNormalization, StructuredRule, TraceabilityEntry,
};
pub use config::GatewayConfig;
pub use error::{
    AeroError, AeroResult, ConfigError, ErrorCategory, GatewayError, StorageError,
    ValidationError,
};
pub use graph::{
    flatten_attributes, EdgeCategory, GraphArtifact, GraphEdge, GraphNode, NodeAttribute,
    NodeCategory, WireGraphNode,
};
pub use history::{HistoryEntry, HistoryLog, KeyValueStore, MemoryKeyValueStore};
pub use regulatory::{
    ComplianceStatus, EcnDetail, EngineeringOrder, FleetAircraft, ImpactPriority,
    RegulatoryImpact,
};
pub use task::{TaskKind, TaskKindParseError};

#[cfg(test)]
pub(crate) mod test_support {
    use serde::Serialize;
    use std::collections::BTreeSet;

    /// Serde wire names of `variants`, for comparison against a declared `ALL` list.
    pub fn wire_names<T: Serialize>(variants: &[T]) -> BTreeSet<String> {
        variants
            .iter()
            .map(|v| match serde_json::to_value(v).unwrap() {
                serde_json::Value::String(s) => s,
                other => panic!("variant serialized as {}", other),
            })
            .collect()
    }

    pub fn declared(all: &[&str]) -> BTreeSet<String> {
        all.iter().map(|s| s.to_string()).collect()
    }
}
