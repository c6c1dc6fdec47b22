//! Task catalog
//!
//! Each task is a pure builder from typed inputs to a [`TaskSpec`]: the prompt
//! text, an optional attachment, the response schema (or none for free text),
//! the reshape rule, and the model tier. Builders never touch the network, so
//! every task can be tested without a provider.

use crate::normalize::Reshape;
use crate::prompt;
use crate::schema::ResponseSchema;
use crate::{ContentPart, InferenceRequest, Message, ResponseMode};
use aerogate_core::{
    Attachment, AuditRiskLevel, BomDiscrepancy, BomItem, CertificationReport, ChangeManagerResult,
    ChangeRequest, ChatRole, ChatTurn, ComplianceAuditResult, ComplianceStatus, ConversationHistory,
    DiscrepancyType, DocumentInput, EcnDetail, EdgeCategory, EngineeringOrder, FleetAircraft,
    GapSeverity, GatewayConfig, GatewayError, ImpactPriority, NodeCategory, PlmArtifact,
    PlmArtifactType, PlmStatus, ProcessedSegment, RegulationPipelineResult, RegulatoryImpact,
    SegmentNormalization, Severity, StakeholderPriority, TaskKind, TriageTrack,
};
use serde::Serialize;
use serde_json::{json, Value};

/// JSON pointer of the graph nodes in a change-triage reply.
pub const CHANGE_GRAPH_NODES: &str = "/technical/nodes";

/// Which configured model a task runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelTier {
    /// `GatewayConfig::model`, used by every structured task.
    Structured,
    /// `GatewayConfig::chat_model`.
    Chat,
}

/// A task with its inputs.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskRequest {
    ReconcileBoms {
        as_designed: Vec<BomItem>,
        as_built: Vec<BomItem>,
    },
    AnalyzeRegulatoryImpact {
        directive_text: String,
        fleet: Vec<FleetAircraft>,
    },
    GenerateEngineeringOrder {
        impact: RegulatoryImpact,
        directive_text: String,
    },
    AnalyzeChangeRequest(ChangeRequest),
    FetchEcnDetails {
        ecn_id: String,
    },
    ParseRegulationDocument {
        document: DocumentInput,
    },
    SemanticSearch {
        query: String,
        library: Vec<ProcessedSegment>,
    },
    ExtractRequirements {
        document: DocumentInput,
    },
    EvaluateCompliance {
        segments: Vec<ProcessedSegment>,
        artifacts: Vec<PlmArtifact>,
    },
    GenerateCertificationReport {
        audit: ComplianceAuditResult,
        title: String,
    },
    AuditorChat {
        history: ConversationHistory,
        message: String,
    },
}

/// Typed result of a dispatched task.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutput {
    Discrepancies(Vec<BomDiscrepancy>),
    Impacts(Vec<RegulatoryImpact>),
    EngineeringOrder(EngineeringOrder),
    ChangeTriage(Box<ChangeManagerResult>),
    Ecn(EcnDetail),
    Regulation(RegulationPipelineResult),
    Matches(Vec<ProcessedSegment>),
    Artifacts(Vec<PlmArtifact>),
    Audit(ComplianceAuditResult),
    Report(CertificationReport),
    Reply(String),
}

impl TaskOutput {
    pub fn kind(&self) -> TaskKind {
        match self {
            Self::Discrepancies(_) => TaskKind::ReconcileBoms,
            Self::Impacts(_) => TaskKind::AnalyzeRegulatoryImpact,
            Self::EngineeringOrder(_) => TaskKind::GenerateEngineeringOrder,
            Self::ChangeTriage(_) => TaskKind::AnalyzeChangeRequest,
            Self::Ecn(_) => TaskKind::FetchEcnDetails,
            Self::Regulation(_) => TaskKind::ParseRegulationDocument,
            Self::Matches(_) => TaskKind::SemanticSearch,
            Self::Artifacts(_) => TaskKind::ExtractRequirements,
            Self::Audit(_) => TaskKind::EvaluateCompliance,
            Self::Report(_) => TaskKind::GenerateCertificationReport,
            Self::Reply(_) => TaskKind::AuditorChat,
        }
    }
}

/// Everything needed to issue one task call, before model resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskSpec {
    pub kind: TaskKind,
    pub prompt: String,
    pub attachment: Option<Attachment>,
    /// `None` selects free-text mode.
    pub schema: Option<ResponseSchema>,
    pub reshape: Reshape,
    pub system_instruction: Option<String>,
    /// Prior turns, sent before the prompt.
    pub history: Vec<ChatTurn>,
    pub tier: ModelTier,
    /// Ask for minimum decoding effort.
    pub fast: bool,
    /// Value used in place of an empty body. `None` makes an empty body an error.
    pub empty_fallback: Option<Value>,
}

impl TaskSpec {
    fn structured(kind: TaskKind, prompt: String, schema: ResponseSchema) -> Self {
        Self {
            kind,
            prompt,
            attachment: None,
            schema: Some(schema),
            reshape: Reshape::None,
            system_instruction: None,
            history: Vec::new(),
            tier: ModelTier::Structured,
            fast: false,
            empty_fallback: None,
        }
    }

    pub fn is_structured(&self) -> bool {
        self.schema.is_some()
    }

    /// Resolve model and effort from configuration.
    pub fn to_request(&self, config: &GatewayConfig) -> InferenceRequest {
        let mut messages: Vec<Message> = self
            .history
            .iter()
            .map(|turn| Message::text(turn.role, turn.text.clone()))
            .collect();

        let mut parts = vec![ContentPart::Text(self.prompt.clone())];
        if let Some(attachment) = &self.attachment {
            parts.push(ContentPart::InlineData(attachment.clone()));
        }
        messages.push(Message {
            role: ChatRole::User,
            parts,
        });

        let model = match self.tier {
            ModelTier::Structured => config.model.clone(),
            ModelTier::Chat => config.chat_model.clone(),
        };

        InferenceRequest {
            task: self.kind,
            model,
            system_instruction: self.system_instruction.clone(),
            messages,
            response_mode: match &self.schema {
                Some(schema) => ResponseMode::Json(schema.clone()),
                None => ResponseMode::FreeText,
            },
            thinking_budget: if self.fast {
                config.fast_thinking_budget
            } else {
                None
            },
        }
    }
}

impl TaskRequest {
    pub fn kind(&self) -> TaskKind {
        match self {
            Self::ReconcileBoms { .. } => TaskKind::ReconcileBoms,
            Self::AnalyzeRegulatoryImpact { .. } => TaskKind::AnalyzeRegulatoryImpact,
            Self::GenerateEngineeringOrder { .. } => TaskKind::GenerateEngineeringOrder,
            Self::AnalyzeChangeRequest(_) => TaskKind::AnalyzeChangeRequest,
            Self::FetchEcnDetails { .. } => TaskKind::FetchEcnDetails,
            Self::ParseRegulationDocument { .. } => TaskKind::ParseRegulationDocument,
            Self::SemanticSearch { .. } => TaskKind::SemanticSearch,
            Self::ExtractRequirements { .. } => TaskKind::ExtractRequirements,
            Self::EvaluateCompliance { .. } => TaskKind::EvaluateCompliance,
            Self::GenerateCertificationReport { .. } => TaskKind::GenerateCertificationReport,
            Self::AuditorChat { .. } => TaskKind::AuditorChat,
        }
    }

    /// Build the call for this task. Pure.
    pub fn build(&self) -> Result<TaskSpec, GatewayError> {
        match self {
            Self::ReconcileBoms {
                as_designed,
                as_built,
            } => reconcile_boms(as_designed, as_built),
            Self::AnalyzeRegulatoryImpact {
                directive_text,
                fleet,
            } => analyze_regulatory_impact(directive_text, fleet),
            Self::GenerateEngineeringOrder {
                impact,
                directive_text,
            } => generate_engineering_order(impact, directive_text),
            Self::AnalyzeChangeRequest(request) => analyze_change_request(request),
            Self::FetchEcnDetails { ecn_id } => fetch_ecn_details(ecn_id),
            Self::ParseRegulationDocument { document } => parse_regulation_document(document),
            Self::SemanticSearch { query, library } => semantic_search(query, library),
            Self::ExtractRequirements { document } => extract_requirements(document),
            Self::EvaluateCompliance {
                segments,
                artifacts,
            } => evaluate_compliance(segments, artifacts),
            Self::GenerateCertificationReport { audit, title } => {
                generate_certification_report(audit, title)
            }
            Self::AuditorChat { history, message } => auditor_chat(history, message),
        }
    }
}

// ============================================================================
// BUILDERS
// ============================================================================

fn to_json<T: Serialize + ?Sized>(task: TaskKind, value: &T) -> Result<String, GatewayError> {
    serde_json::to_string(value).map_err(|e| GatewayError::InvalidInput {
        task,
        reason: format!("cannot serialize input: {}", e),
    })
}

fn require_text(task: TaskKind, field: &str, value: &str) -> Result<(), GatewayError> {
    if value.trim().is_empty() {
        return Err(GatewayError::InvalidInput {
            task,
            reason: format!("{} is empty", field),
        });
    }
    Ok(())
}

pub fn reconcile_boms(
    as_designed: &[BomItem],
    as_built: &[BomItem],
) -> Result<TaskSpec, GatewayError> {
    let kind = TaskKind::ReconcileBoms;
    let prompt = prompt::reconcile_boms(&to_json(kind, as_designed)?, &to_json(kind, as_built)?);
    Ok(TaskSpec::structured(
        kind,
        prompt,
        ResponseSchema::array_of(discrepancy_schema()),
    ))
}

pub fn analyze_regulatory_impact(
    directive_text: &str,
    fleet: &[FleetAircraft],
) -> Result<TaskSpec, GatewayError> {
    let kind = TaskKind::AnalyzeRegulatoryImpact;
    require_text(kind, "directive_text", directive_text)?;
    let prompt = prompt::analyze_regulatory_impact(directive_text, &to_json(kind, fleet)?);
    Ok(TaskSpec::structured(
        kind,
        prompt,
        ResponseSchema::array_of(impact_schema()),
    ))
}

pub fn generate_engineering_order(
    impact: &RegulatoryImpact,
    directive_text: &str,
) -> Result<TaskSpec, GatewayError> {
    let kind = TaskKind::GenerateEngineeringOrder;
    let prompt = prompt::generate_engineering_order(&to_json(kind, impact)?, directive_text);
    Ok(TaskSpec::structured(kind, prompt, engineering_order_schema()))
}

pub fn analyze_change_request(request: &ChangeRequest) -> Result<TaskSpec, GatewayError> {
    let kind = TaskKind::AnalyzeChangeRequest;
    require_text(kind, "title", &request.title)?;
    require_text(kind, "description", &request.description)?;
    let prompt = prompt::analyze_change_request(
        &request.title,
        &request.description,
        &request.ebom_context,
        &to_json(kind, &request.parallel_changes)?,
    );
    let mut spec = TaskSpec::structured(kind, prompt, change_triage_schema());
    spec.reshape = Reshape::FlattenNodeAttributes(CHANGE_GRAPH_NODES);
    spec.fast = true;
    Ok(spec)
}

pub fn fetch_ecn_details(ecn_id: &str) -> Result<TaskSpec, GatewayError> {
    let kind = TaskKind::FetchEcnDetails;
    require_text(kind, "ecn_id", ecn_id)?;
    Ok(TaskSpec::structured(
        kind,
        prompt::fetch_ecn_details(ecn_id),
        ecn_schema(),
    ))
}

fn document_spec(
    kind: TaskKind,
    document: &DocumentInput,
    template: fn(Option<&str>) -> String,
    schema: ResponseSchema,
) -> Result<TaskSpec, GatewayError> {
    match document {
        DocumentInput::Text(text) => {
            require_text(kind, "document", text)?;
            Ok(TaskSpec::structured(kind, template(Some(text)), schema))
        }
        DocumentInput::Binary(attachment) => {
            let mut spec = TaskSpec::structured(kind, template(None), schema);
            spec.attachment = Some(attachment.clone());
            Ok(spec)
        }
    }
}

pub fn parse_regulation_document(document: &DocumentInput) -> Result<TaskSpec, GatewayError> {
    document_spec(
        TaskKind::ParseRegulationDocument,
        document,
        prompt::parse_regulation_document,
        regulation_schema(),
    )
}

pub fn semantic_search(
    query: &str,
    library: &[ProcessedSegment],
) -> Result<TaskSpec, GatewayError> {
    let kind = TaskKind::SemanticSearch;
    require_text(kind, "query", query)?;
    let summaries: Vec<Value> = library
        .iter()
        .map(|s| json!({"id": s.id, "summary": s.semantic_summary}))
        .collect();
    let prompt = prompt::semantic_search(query, &to_json(kind, &summaries)?);
    let mut spec = TaskSpec::structured(kind, prompt, ResponseSchema::string_list());
    spec.empty_fallback = Some(json!([]));
    Ok(spec)
}

pub fn extract_requirements(document: &DocumentInput) -> Result<TaskSpec, GatewayError> {
    document_spec(
        TaskKind::ExtractRequirements,
        document,
        prompt::extract_requirements,
        ResponseSchema::array_of(plm_artifact_schema()),
    )
}

pub fn evaluate_compliance(
    segments: &[ProcessedSegment],
    artifacts: &[PlmArtifact],
) -> Result<TaskSpec, GatewayError> {
    let kind = TaskKind::EvaluateCompliance;
    let prompt = prompt::evaluate_compliance(&to_json(kind, segments)?, &to_json(kind, artifacts)?);
    Ok(TaskSpec::structured(kind, prompt, audit_schema()))
}

pub fn generate_certification_report(
    audit: &ComplianceAuditResult,
    title: &str,
) -> Result<TaskSpec, GatewayError> {
    let kind = TaskKind::GenerateCertificationReport;
    require_text(kind, "title", title)?;
    let prompt = prompt::generate_certification_report(title, &to_json(kind, audit)?);
    Ok(TaskSpec::structured(kind, prompt, report_schema()))
}

pub fn auditor_chat(
    history: &ConversationHistory,
    message: &str,
) -> Result<TaskSpec, GatewayError> {
    let kind = TaskKind::AuditorChat;
    require_text(kind, "message", message)?;
    Ok(TaskSpec {
        kind,
        prompt: message.to_string(),
        attachment: None,
        schema: None,
        reshape: Reshape::None,
        system_instruction: Some(prompt::AUDITOR_SYSTEM_INSTRUCTION.to_string()),
        history: history.turns().to_vec(),
        tier: ModelTier::Chat,
        fast: false,
        empty_fallback: None,
    })
}

// ============================================================================
// RESPONSE SCHEMAS
// ============================================================================

type S = ResponseSchema;

pub fn discrepancy_schema() -> ResponseSchema {
    S::object([
        ("partNumber", S::string()),
        ("issueType", S::enumeration(&DiscrepancyType::ALL)),
        ("severity", S::enumeration(&Severity::ALL)),
        ("description", S::string()),
        ("recommendation", S::string()),
    ])
}

pub fn impact_schema() -> ResponseSchema {
    S::object([
        ("affectedTailNumber", S::string()),
        ("component", S::string()),
        ("requiredAction", S::string()),
        ("deadline", S::string()),
        ("complianceStatus", S::enumeration(&ComplianceStatus::ALL)),
        ("priority", S::enumeration(&ImpactPriority::ALL)),
    ])
}

pub fn engineering_order_schema() -> ResponseSchema {
    S::object([
        ("eoNumber", S::string()),
        ("relatedAD", S::string()),
        ("title", S::string()),
        ("complianceDeadline", S::string()),
        ("applicability", S::string()),
        ("instructions", S::string_list()),
        ("partsRequired", S::string_list()),
        ("manHours", S::number()),
    ])
}

/// Wire shape of a change triage. Nodes carry `attributes`, flattened after parsing.
pub fn change_triage_schema() -> ResponseSchema {
    let attribute = S::object([("key", S::string()), ("value", S::string())]);
    let node = S::object([
        ("id", S::string()),
        ("label", S::string()),
        ("type", S::enumeration(&NodeCategory::ALL)),
        ("layer", S::integer()),
        ("description", S::string()),
        ("attributes", S::array_of(attribute)),
    ])
    .optional(&["description", "attributes"]);
    let edge = S::object([
        ("id", S::string()),
        ("from", S::string()),
        ("to", S::string()),
        ("label", S::string()),
        ("type", S::enumeration(&EdgeCategory::ALL)),
        ("description", S::string()),
    ])
    .optional(&["description"]);
    let tiers = S::object([
        ("physical", S::string_list()),
        ("functional", S::string_list()),
        ("regulatory", S::string_list()),
        ("logistical", S::string_list()),
    ]);
    let stakeholder = S::object([
        ("role", S::string()),
        ("reason", S::string()),
        ("priority", S::enumeration(&StakeholderPriority::ALL)),
    ]);
    let conflict = S::object([
        ("crId", S::string()),
        ("overlapSystem", S::string()),
        ("conflictDescription", S::string()),
    ]);

    S::object([
        (
            "technical",
            S::object([
                ("nodes", S::array_of(node)),
                ("edges", S::array_of(edge)),
                ("tiers", tiers),
            ]),
        ),
        (
            "management",
            S::object([
                ("riskScore", S::number()),
                ("triageTrack", S::enumeration(&TriageTrack::ALL)),
                ("stakeholders", S::array_of(stakeholder)),
                ("conflicts", S::array_of(conflict)),
                ("estimatedManHours", S::number()),
                ("technicalJustification", S::string()),
                ("preMeetingBriefing", S::string()),
                ("recommendation", S::string()),
            ]),
        ),
    ])
}

pub fn ecn_schema() -> ResponseSchema {
    S::object([
        ("id", S::string()),
        ("title", S::string()),
        ("solution", S::string()),
        ("approver", S::string()),
        ("approvalDate", S::string()),
        ("impactedDocs", S::string_list()),
    ])
}

pub fn regulation_schema() -> ResponseSchema {
    let metadata = S::object([
        ("source_document", S::string()),
        ("clause_number", S::string()),
        ("dal_applicability", S::string_list()),
        ("lifecycle_area", S::string()),
        ("category", S::string()),
    ]);
    let rule = S::object([
        ("rule_type", S::string()),
        ("object_of_compliance", S::string()),
        ("requirement", S::string()),
        ("evidence_required", S::string_list()),
        ("failure_condition", S::string_list()),
    ])
    .optional(&["failure_condition"]);
    let segment = S::object([
        ("id", S::string()),
        ("original_text", S::string()),
        ("semantic_summary", S::string()),
        ("normalization", S::enumeration(&SegmentNormalization::ALL)),
        ("metadata", metadata),
        ("structured_rule", rule),
    ]);
    S::object([
        ("documentTitle", S::string()),
        ("segments", S::array_of(segment)),
    ])
}

pub fn plm_artifact_schema() -> ResponseSchema {
    S::object([
        ("id", S::string()),
        ("type", S::enumeration(&PlmArtifactType::ALL)),
        ("name", S::string()),
        ("status", S::enumeration(&PlmStatus::ALL)),
        ("contentSnippet", S::string()),
        ("traceLinks", S::string_list()),
    ])
}

pub fn audit_schema() -> ResponseSchema {
    let gap = S::object([
        ("regulationClauseId", S::string()),
        ("severity", S::enumeration(&GapSeverity::ALL)),
        ("issue", S::string()),
        ("missingArtifactType", S::string()),
        ("recommendation", S::string()),
    ]);
    let trace = S::object([("regId", S::string()), ("artifacts", S::string_list())]);
    S::object([
        ("overallScore", S::number()),
        ("riskLevel", S::enumeration(&AuditRiskLevel::ALL)),
        ("evaluatedCount", S::integer()),
        ("passCount", S::integer()),
        ("gapAnalysis", S::array_of(gap)),
        ("traceabilityMatrix", S::array_of(trace)),
    ])
}

pub fn report_schema() -> ResponseSchema {
    S::object([
        ("title", S::string()),
        ("generatedDate", S::string()),
        ("executiveSummary", S::string()),
        ("complianceTable", S::string()),
        ("gapAnalysisSection", S::string()),
        ("conclusion", S::string()),
    ])
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        /// EBOM context in the change prompt is exactly its first 2,000 chars.
        #[test]
        fn prop_ebom_context_truncated_deterministically(extra in 0usize..600, seed in "[a-z]{1,8}") {
            let ebom: String = seed.chars().cycle().take(1_800 + extra).collect();
            let request = ChangeRequest {
                title: "t".to_string(),
                description: "d".to_string(),
                ebom_context: ebom.clone(),
                parallel_changes: vec![],
            };
            let spec = analyze_change_request(&request).unwrap();
            let kept = prompt::truncate_chars(&ebom, prompt::EBOM_CONTEXT_BUDGET);
            let expected = format!("EBOM CONTEXT: {}\n", kept);
            prop_assert!(spec.prompt.contains(&expected));
            prop_assert_eq!(kept.chars().count(), ebom.chars().count().min(2_000));
        }
    }
}
