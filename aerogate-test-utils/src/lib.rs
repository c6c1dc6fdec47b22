//! aerogate Test Utilities
//!
//! Centralized test infrastructure for the aerogate workspace:
//! - Scripted inference client and gateway constructors
//! - Proptest generators for domain records
//! - Fixtures and canned model payloads for common scenarios
//! - Custom assertions for gateway errors

// Re-export the scripted client from its source crate
pub use aerogate_llm::{
    InferenceGateway, InferenceRequest, InferenceResponse, MockInferenceClient, ProviderFailure,
};

// Re-export core types for convenience
pub use aerogate_core::{
    BomDiscrepancy, BomItem, ChangeRequest, ConversationHistory, ErrorCategory, FleetAircraft,
    GatewayConfig, GatewayError, GraphArtifact, NodeAttribute, NodeCategory, ParallelChange,
    PlmArtifact, ProcessedSegment, TaskKind, WireGraphNode,
};

use std::sync::Arc;

// ============================================================================
// SCRIPTED GATEWAY
// ============================================================================

/// Gateway over a scripted client with default configuration.
///
/// The returned client handle exposes the requests the gateway sent.
pub fn scripted_gateway(client: MockInferenceClient) -> (Arc<MockInferenceClient>, InferenceGateway) {
    scripted_gateway_with(client, GatewayConfig::default())
}

pub fn scripted_gateway_with(
    client: MockInferenceClient,
    config: GatewayConfig,
) -> (Arc<MockInferenceClient>, InferenceGateway) {
    let client = Arc::new(client);
    let gateway = InferenceGateway::new(client.clone(), config);
    (client, gateway)
}

/// Gateway whose only call returns `body`.
pub fn gateway_replying(body: impl Into<String>) -> (Arc<MockInferenceClient>, InferenceGateway) {
    scripted_gateway(MockInferenceClient::new().with_text(body))
}

/// Gateway whose only call fails with `failure`.
pub fn gateway_failing(failure: ProviderFailure) -> (Arc<MockInferenceClient>, InferenceGateway) {
    scripted_gateway(MockInferenceClient::new().with_failure(failure))
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for generating aerogate values.

    use super::*;
    use proptest::prelude::*;

    /// Generate a TaskKind variant.
    pub fn arb_task_kind() -> impl Strategy<Value = TaskKind> {
        (0..TaskKind::ALL.len()).prop_map(|i| TaskKind::ALL[i])
    }

    /// Generate an aviation-style part number like `27-40-10-112`.
    pub fn arb_part_number() -> impl Strategy<Value = String> {
        (10u32..99, 10u32..99, 10u32..99, 100u32..999)
            .prop_map(|(a, b, c, d)| format!("{}-{}-{}-{}", a, b, c, d))
    }

    /// Generate a BOM line.
    pub fn arb_bom_item() -> impl Strategy<Value = BomItem> {
        (arb_part_number(), "[A-F]", 1u32..20, "[a-z ]{0,24}").prop_map(
            |(part, revision, quantity, description)| {
                BomItem::new(part, revision, quantity).with_description(description)
            },
        )
    }

    /// Generate a list of `{key, value}` pairs with frequent duplicate keys.
    pub fn arb_node_attributes() -> impl Strategy<Value = Vec<NodeAttribute>> {
        prop::collection::vec(
            ("(material|finish|torque|weight)", "[a-z0-9]{1,8}")
                .prop_map(|(k, v)| NodeAttribute::new(k, v)),
            0..8,
        )
    }

    /// Generate a NodeCategory variant.
    pub fn arb_node_category() -> impl Strategy<Value = NodeCategory> {
        prop_oneof![
            Just(NodeCategory::Part),
            Just(NodeCategory::System),
            Just(NodeCategory::Document),
            Just(NodeCategory::Regulation),
            Just(NodeCategory::Tool),
            Just(NodeCategory::Risk),
        ]
    }

    /// Generate a graph node in wire form.
    pub fn arb_wire_node() -> impl Strategy<Value = WireGraphNode> {
        (
            "N[0-9]{1,3}",
            "[A-Za-z ]{1,20}",
            arb_node_category(),
            1i64..=4,
            arb_node_attributes(),
        )
            .prop_map(|(id, label, category, layer, attributes)| WireGraphNode {
                id,
                label,
                category,
                layer,
                description: None,
                attributes,
            })
    }

    /// Generate a provider failure with an optional HTTP status.
    pub fn arb_provider_failure() -> impl Strategy<Value = ProviderFailure> {
        (
            proptest::option::of(prop_oneof![Just(400u16), Just(429), Just(403), Just(500), Just(503)]),
            "[ -~]{0,40}",
        )
            .prop_map(|(status, message)| ProviderFailure {
                status,
                code: None,
                message,
                retry_after_ms: None,
            })
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built records and canned model payloads.

    use super::*;
    use aerogate_core::{
        ComplianceStatus, ImpactPriority, PlmArtifactType, PlmStatus, RegulatoryImpact,
        SegmentMetadata, SegmentNormalization, StructuredRule,
    };
    use serde_json::json;

    /// Part number shared by the BOM fixtures.
    pub const BRACKET_PART: &str = "27-40-10-112";

    /// As-designed BOM: the bracket at revision B.
    pub fn as_designed_bom() -> Vec<BomItem> {
        vec![BomItem::new(BRACKET_PART, "B", 2).with_description("Flap actuator bracket")]
    }

    /// As-built BOM: the bracket installed at revision A.
    pub fn as_built_bom() -> Vec<BomItem> {
        vec![BomItem::new(BRACKET_PART, "A", 2).with_description("Flap actuator bracket")]
    }

    /// Model reply declaring one revision mismatch on the bracket.
    pub fn version_mismatch_payload() -> String {
        json!([{
            "partNumber": BRACKET_PART,
            "issueType": "VERSION_MISMATCH",
            "severity": "MAJOR",
            "description": "As-built revision A does not match as-designed revision B.",
            "recommendation": "Replace with revision B or raise a concession."
        }])
        .to_string()
    }

    pub fn fleet() -> Vec<FleetAircraft> {
        vec![
            FleetAircraft {
                tail_number: "N101AA".to_string(),
                model: "B737-800".to_string(),
                engine: "CFM56-7B".to_string(),
                cycles: 24_500,
                components: vec!["Flap Actuator PN 27-40-10-112".to_string()],
            },
            FleetAircraft {
                tail_number: "N202AA".to_string(),
                model: "A320-200".to_string(),
                engine: "V2527-A5".to_string(),
                cycles: 18_200,
                components: vec![],
            },
        ]
    }

    pub fn change_request() -> ChangeRequest {
        ChangeRequest {
            title: "Replace hydraulic pump seal material".to_string(),
            description: "Switch EDP shaft seal from nitrile to fluorocarbon.".to_string(),
            ebom_context: "EDP assembly 29-11-00 / seal kit 29-11-05-220".to_string(),
            parallel_changes: vec![ParallelChange {
                cr_id: "CR-902".to_string(),
                overlap_system: "Hydraulic System B".to_string(),
                description: "Filter element replacement".to_string(),
            }],
        }
    }

    /// Change-triage reply in wire form. Node `N1` repeats the `material` key.
    pub fn change_triage_payload() -> String {
        json!({
            "technical": {
                "nodes": [
                    {"id": "N1", "label": "EDP Seal", "type": "PART", "layer": 1,
                     "description": "Shaft seal",
                     "attributes": [
                        {"key": "material", "value": "titanium"},
                        {"key": "material", "value": "steel"},
                        {"key": "pn", "value": "29-11-05-220"}
                     ]},
                    {"id": "N2", "label": "Hydraulic System B", "type": "SYSTEM", "layer": 2},
                    {"id": "N3", "label": "CS 25.1435", "type": "REGULATION", "layer": 4,
                     "attributes": []}
                ],
                "edges": [
                    {"id": "E1", "from": "N1", "to": "N2", "label": "seals", "type": "PHYSICAL"},
                    {"id": "E2", "from": "N2", "to": "N3", "label": "certified by", "type": "REGULATORY"}
                ],
                "tiers": {
                    "physical": ["EDP Seal"],
                    "functional": ["Hydraulic System B"],
                    "regulatory": ["CS 25.1435"],
                    "logistical": []
                }
            },
            "management": {
                "riskScore": 6,
                "triageTrack": "MANUAL_REVIEW",
                "stakeholders": [
                    {"role": "Hydraulics SME", "reason": "System owner", "priority": "REQUIRED"},
                    {"role": "Certification Engineer", "reason": "CS 25.1435", "priority": "CONSULTED"},
                    {"role": "Supply Chain", "reason": "New seal kit", "priority": "INFORMED"}
                ],
                "conflicts": [
                    {"crId": "CR-902", "overlapSystem": "Hydraulic System B",
                     "conflictDescription": "Both changes open System B reservoir."}
                ],
                "estimatedManHours": 14.5,
                "technicalJustification": "Fluorocarbon tolerates Skydrol better.",
                "preMeetingBriefing": "Seal material change on EDP; coordinate with CR-902.",
                "recommendation": "Approve with combined work package."
            }
        })
        .to_string()
    }

    /// Directive text shared by the regulatory fixtures.
    pub const FLAP_DIRECTIVE: &str =
        "AD 2024-05-11: inspect flap actuator brackets PN 27-40-10-112 within 600 cycles.";

    /// Model reply flagging one aircraft in [`fleet`].
    pub fn impact_payload() -> String {
        json!([{
            "affectedTailNumber": "N101AA",
            "component": "Flap Actuator PN 27-40-10-112",
            "requiredAction": "Detailed visual inspection of actuator bracket lugs.",
            "deadline": "Within 600 cycles",
            "complianceStatus": "PENDING_INSPECTION",
            "priority": "URGENT"
        }])
        .to_string()
    }

    /// The impact described by [`impact_payload`], as a typed record.
    pub fn flap_impact() -> RegulatoryImpact {
        RegulatoryImpact {
            affected_tail_number: "N101AA".to_string(),
            component: "Flap Actuator PN 27-40-10-112".to_string(),
            required_action: "Detailed visual inspection of actuator bracket lugs.".to_string(),
            deadline: "Within 600 cycles".to_string(),
            compliance_status: ComplianceStatus::PendingInspection,
            priority: ImpactPriority::Urgent,
        }
    }

    pub fn engineering_order_payload() -> String {
        json!({
            "eoNumber": "EO-2024-0117",
            "relatedAD": "AD 2024-05-11",
            "title": "Flap actuator bracket inspection",
            "complianceDeadline": "Within 600 cycles",
            "applicability": "N101AA",
            "instructions": [
                "Gain access to flap track 3.",
                "Inspect bracket lugs for cracks."
            ],
            "partsRequired": ["27-40-10-112"],
            "manHours": 3.5
        })
        .to_string()
    }

    pub fn ecn_payload() -> String {
        json!({
            "id": "ECN-4471",
            "title": "Bracket revision B",
            "solution": "Thicken lug section to 4.2 mm.",
            "approver": "Chief Structures Engineer",
            "approvalDate": "2024-03-18",
            "impactedDocs": ["DWG-27-40-10", "SRM 57-50-01"]
        })
        .to_string()
    }

    /// Parsed regulation document with one obligation carrying failure conditions.
    pub fn regulation_payload() -> String {
        json!({
            "documentTitle": "DO-178C Section 6",
            "segments": [{
                "id": "SEG-1",
                "original_text": "6.4.4.2 Structural coverage analysis shall be performed.",
                "semantic_summary": "Structural coverage analysis",
                "normalization": "COMPLIANCE_OBLIGATION",
                "metadata": {
                    "source_document": "DO-178C",
                    "clause_number": "6.4.4.2",
                    "dal_applicability": ["A", "B", "C"],
                    "lifecycle_area": "Verification",
                    "category": "Coverage"
                },
                "structured_rule": {
                    "rule_type": "OBLIGATION",
                    "object_of_compliance": "Airborne software",
                    "requirement": "Perform structural coverage analysis",
                    "evidence_required": ["Coverage report"],
                    "failure_condition": ["Uncovered code without justification"]
                }
            }]
        })
        .to_string()
    }

    /// Extracted PLM artifacts matching [`plm_artifacts`].
    pub fn requirements_payload() -> String {
        json!([
            {"id": "REQ-101", "type": "REQUIREMENT", "name": "Flap asymmetry detection",
             "status": "APPROVED", "contentSnippet": "The FCC shall detect flap asymmetry ...",
             "traceLinks": ["TC-201"]},
            {"id": "TC-201", "type": "TEST_CASE", "name": "Asymmetry injection test",
             "status": "DRAFT", "contentSnippet": "Inject 3 degree split ...",
             "traceLinks": ["REQ-101"]}
        ])
        .to_string()
    }

    pub fn report_payload() -> String {
        json!({
            "title": "DAL A Certification Readiness",
            "generatedDate": "2024-06-01",
            "executiveSummary": "Two of three objectives satisfied.",
            "complianceTable": "| SEG-1 | PASS |\n| SEG-2 | GAP |",
            "gapAnalysisSection": "SEG-2 lacks a structural coverage report.",
            "conclusion": "Not ready until MC/DC evidence is attached."
        })
        .to_string()
    }

    fn segment(id: &str, clause: &str, summary: &str) -> ProcessedSegment {
        ProcessedSegment {
            id: id.to_string(),
            original_text: format!("{} The applicant shall ...", clause),
            semantic_summary: summary.to_string(),
            normalization: SegmentNormalization::ComplianceObligation,
            metadata: SegmentMetadata {
                source_document: "DO-178C".to_string(),
                clause_number: clause.to_string(),
                dal_applicability: vec!["A".to_string(), "B".to_string()],
                lifecycle_area: "Verification".to_string(),
                category: "Testing".to_string(),
            },
            structured_rule: StructuredRule {
                rule_type: "OBLIGATION".to_string(),
                object_of_compliance: "Airborne software".to_string(),
                requirement: summary.to_string(),
                evidence_required: vec!["Verification results".to_string()],
                failure_condition: None,
            },
        }
    }

    /// Three-segment regulation library.
    pub fn regulation_library() -> Vec<ProcessedSegment> {
        vec![
            segment("SEG-1", "6.4.1", "Requirements-based testing"),
            segment("SEG-2", "6.4.4.2", "Structural coverage analysis"),
            segment("SEG-3", "11.9", "Software requirements data"),
        ]
    }

    pub fn plm_artifacts() -> Vec<PlmArtifact> {
        vec![
            PlmArtifact {
                id: "REQ-101".to_string(),
                artifact_type: PlmArtifactType::Requirement,
                name: "Flap asymmetry detection".to_string(),
                status: PlmStatus::Approved,
                content_snippet: "The FCC shall detect flap asymmetry ...".to_string(),
                trace_links: vec!["TC-201".to_string()],
            },
            PlmArtifact {
                id: "TC-201".to_string(),
                artifact_type: PlmArtifactType::TestCase,
                name: "Asymmetry injection test".to_string(),
                status: PlmStatus::Draft,
                content_snippet: "Inject 3 degree split ...".to_string(),
                trace_links: vec!["REQ-101".to_string()],
            },
        ]
    }

    /// Audit reply with one structural-coverage gap.
    pub fn audit_payload() -> String {
        json!({
            "overallScore": 66.7,
            "riskLevel": "MODERATE",
            "evaluatedCount": 3,
            "passCount": 2,
            "gapAnalysis": [{
                "regulationClauseId": "SEG-2",
                "severity": "HIGH",
                "issue": "No structural coverage report",
                "missingArtifactType": "TEST_RESULT",
                "recommendation": "Run MC/DC analysis and attach the report."
            }],
            "traceabilityMatrix": [
                {"regId": "SEG-1", "artifacts": ["REQ-101", "TC-201"]},
                {"regId": "SEG-2", "artifacts": []}
            ]
        })
        .to_string()
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions for gateway results.

    use super::*;

    /// Assert that a gateway result failed with the given category.
    #[track_caller]
    pub fn assert_category<T: std::fmt::Debug>(
        result: &Result<T, GatewayError>,
        category: ErrorCategory,
    ) {
        match result {
            Err(err) => assert_eq!(err.category(), category, "wrong category for {}", err),
            Ok(value) => panic!("Expected {:?} error, got Ok: {:?}", category, value),
        }
    }

    /// Assert that a gateway error message starts with the task's failure prefix.
    #[track_caller]
    pub fn assert_task_prefix(err: &GatewayError, task: TaskKind) {
        let message = err.to_string();
        let prefix = format!("{}: ", task.failure_prefix());
        assert!(
            message.starts_with(&prefix),
            "Expected message to start with {:?}, got {:?}",
            prefix,
            message
        );
    }

    /// Assert that every edge of a graph references known nodes.
    #[track_caller]
    pub fn assert_edges_resolve(graph: &GraphArtifact) {
        let dangling = graph.dangling_edges();
        assert!(dangling.is_empty(), "Dangling edges: {:?}", dangling);
    }
}
