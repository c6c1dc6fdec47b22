//! Prompt templates and free-text budgets
//!
//! Every template is a pure function of its inputs. Oversized free text is cut
//! at a fixed character budget with [`truncate_chars`] before interpolation,
//! and each template names every field its response schema requires.

use aerogate_core::{
    AuditRiskLevel, ComplianceStatus, DiscrepancyType, EdgeCategory, GapSeverity, ImpactPriority,
    NodeCategory, PlmArtifactType, PlmStatus, SegmentNormalization, Severity, StakeholderPriority,
    TriageTrack,
};

/// Characters of EBOM context kept for change-request triage.
pub const EBOM_CONTEXT_BUDGET: usize = 2_000;

/// Characters of directive text kept as context for engineering-order drafting.
pub const DIRECTIVE_CONTEXT_BUDGET: usize = 1_000;

/// Characters of directive text kept for fleet impact analysis.
pub const DIRECTIVE_TEXT_BUDGET: usize = 10_000;

/// Characters of extracted document text kept for ingestion tasks.
pub const DOCUMENT_TEXT_BUDGET: usize = 30_000;

pub const MAX_GRAPH_NODES: usize = 10;
pub const MAX_GRAPH_EDGES: usize = 12;
pub const MAX_BRIEFING_WORDS: usize = 200;
pub const STAKEHOLDER_COUNT: usize = 3;

/// System instruction for the virtual auditor chat.
pub const AUDITOR_SYSTEM_INSTRUCTION: &str = "You are a Virtual Aviation Auditor.";

/// The first `budget` characters of `text`. Never splits a character.
pub fn truncate_chars(text: &str, budget: usize) -> &str {
    match text.char_indices().nth(budget) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

fn one_of(values: &[&str]) -> String {
    format!("one of {}", values.join(", "))
}

pub fn reconcile_boms(as_designed_json: &str, as_built_json: &str) -> String {
    format!(
        "Compare the As-Designed and As-Built bills of materials for an aircraft assembly \
         and identify every discrepancy between them.\n\n\
         AS-DESIGNED: {as_designed_json}\n\
         AS-BUILT: {as_built_json}\n\n\
         For each discrepancy return: partNumber, issueType ({}), severity ({}), \
         description, recommendation.\n\
         Return an empty array when the two lists agree.",
        one_of(&DiscrepancyType::ALL),
        one_of(&Severity::ALL),
    )
}

pub fn analyze_regulatory_impact(directive_text: &str, fleet_json: &str) -> String {
    format!(
        "Analyze the following Airworthiness Directive against the operator's fleet and \
         list every aircraft it affects.\n\n\
         DIRECTIVE TEXT: \"{}\"\n\
         FLEET: {fleet_json}\n\n\
         For each affected aircraft return: affectedTailNumber, component, requiredAction, \
         deadline, complianceStatus ({}), priority ({}).\n\
         Return an empty array when no aircraft is affected.",
        truncate_chars(directive_text, DIRECTIVE_TEXT_BUDGET),
        one_of(&ComplianceStatus::ALL),
        one_of(&ImpactPriority::ALL),
    )
}

pub fn generate_engineering_order(impact_json: &str, directive_text: &str) -> String {
    format!(
        "Draft an Engineering Order for the following regulatory impact.\n\n\
         IMPACT: {impact_json}\n\
         DIRECTIVE CONTEXT: {}\n\n\
         Return: eoNumber, relatedAD, title, complianceDeadline, applicability, \
         instructions (ordered steps), partsRequired, manHours.",
        truncate_chars(directive_text, DIRECTIVE_CONTEXT_BUDGET),
    )
}

pub fn analyze_change_request(
    title: &str,
    description: &str,
    ebom_context: &str,
    parallel_changes_json: &str,
) -> String {
    format!(
        "You are an Advanced Change Management AI for Aviation.\n\
         Perform a focused triage and ripple analysis for this Engineering Change Request (CR).\n\n\
         CR TITLE: \"{title}\"\n\
         CR DESCRIPTION: \"{description}\"\n\
         EBOM CONTEXT: {}\n\
         PARALLEL CHANGES: {parallel_changes_json}\n\n\
         CONSTRAINTS:\n\
         - Technical Graph: limit to MAX {MAX_GRAPH_NODES} nodes and MAX {MAX_GRAPH_EDGES} edges.\n\
         - Briefing: concise executive summary (max {MAX_BRIEFING_WORDS} words).\n\
         - No nesting of properties inside nodes. Use the 'attributes' array of {{key, value}} pairs only.\n\
         - Do not generate large blocks of repetitive text.\n\n\
         TASKS:\n\
         1. TECHNICAL ANALYSIS: build a knowledge graph of the affected items. \
         Layers: 1 (Origin), 2 (Direct), 3 (Ripple), 4 (Certification). \
         Every edge must connect node ids present in the graph.\n\
         2. RISK PROFILING: assign a risk score from 1 to 10 and a triage track.\n\
         3. PEOPLE-WORK: identify {STAKEHOLDER_COUNT} key stakeholders (SMEs).\n\
         4. PRE-MEETING BRIEFING: summarize for board members.\n\
         5. CONFLICT DETECTION: check the parallel changes for overlaps.\n\n\
         OUTPUT JSON:\n\
         - technical: {{ nodes: [{{id, label, type ({}), layer, description, attributes: [{{key, value}}]}}], \
         edges: [{{id, from, to, label, type ({})}}], \
         tiers: {{physical, functional, regulatory, logistical}} }}\n\
         - management: {{ riskScore, triageTrack ({}), stakeholders: [{{role, reason, priority ({})}}], \
         conflicts: [{{crId, overlapSystem, conflictDescription}}], estimatedManHours, \
         technicalJustification, preMeetingBriefing, recommendation }}",
        truncate_chars(ebom_context, EBOM_CONTEXT_BUDGET),
        one_of(&NodeCategory::ALL),
        one_of(&EdgeCategory::ALL),
        one_of(&TriageTrack::ALL),
        one_of(&StakeholderPriority::ALL),
    )
}

pub fn fetch_ecn_details(ecn_id: &str) -> String {
    format!(
        "Provide detailed implementation data for Aviation ECN: \"{ecn_id}\".\n\
         Focus on the solution implemented and the approver.\n\
         Return: id, title, solution, approver, approvalDate, impactedDocs (array)."
    )
}

/// Instruction for regulation parsing. `document_text` is `None` when the
/// document travels as an attachment.
pub fn parse_regulation_document(document_text: Option<&str>) -> String {
    let mut prompt = format!(
        "Segment the following aviation regulation or guidance document into clauses.\n\
         Return documentTitle and segments. For each segment return: id, original_text, \
         semantic_summary, normalization ({}), metadata {{source_document, clause_number, \
         dal_applicability, lifecycle_area, category}}, structured_rule {{rule_type, \
         object_of_compliance, requirement, evidence_required, failure_condition}}.",
        one_of(&SegmentNormalization::ALL),
    );
    append_document(&mut prompt, document_text);
    prompt
}

pub fn semantic_search(query: &str, library_json: &str) -> String {
    format!(
        "Find the segments in the regulation library relevant to the query.\n\n\
         QUERY: \"{query}\"\n\
         LIBRARY: {library_json}\n\n\
         Return only the ids of the relevant segments as an array of strings. \
         Return an empty array when nothing matches."
    )
}

pub fn extract_requirements(document_text: Option<&str>) -> String {
    let mut prompt = format!(
        "Extract the lifecycle artifacts (requirements, tests, design documents, code files) \
         described in the following engineering document.\n\
         For each artifact return: id, type ({}), name, status ({}), contentSnippet, traceLinks.",
        one_of(&PlmArtifactType::ALL),
        one_of(&PlmStatus::ALL),
    );
    append_document(&mut prompt, document_text);
    prompt
}

pub fn evaluate_compliance(segments_json: &str, artifacts_json: &str) -> String {
    format!(
        "Audit the PLM artifacts against the regulation segments and report compliance gaps.\n\n\
         REGULATIONS: {segments_json}\n\
         PLM ARTIFACTS: {artifacts_json}\n\n\
         Return: overallScore (0-100), riskLevel ({}), evaluatedCount, passCount, \
         gapAnalysis [{{regulationClauseId, severity ({}), issue, missingArtifactType, \
         recommendation}}], traceabilityMatrix [{{regId, artifacts}}].",
        one_of(&AuditRiskLevel::ALL),
        one_of(&GapSeverity::ALL),
    )
}

pub fn generate_certification_report(title: &str, audit_json: &str) -> String {
    format!(
        "Generate a certification report titled \"{title}\" from the following compliance audit.\n\n\
         AUDIT: {audit_json}\n\n\
         Return: title, generatedDate, executiveSummary, complianceTable, gapAnalysisSection, \
         conclusion."
    )
}

fn append_document(prompt: &mut String, document_text: Option<&str>) {
    match document_text {
        Some(text) => {
            prompt.push_str("\n\nDOCUMENT:\n");
            prompt.push_str(truncate_chars(text, DOCUMENT_TEXT_BUDGET));
        }
        None => prompt.push_str("\n\nThe document is attached."),
    }
}
