//! End-to-end gateway tests over a scripted client.
//!
//! Each test drives a public task operation through the full pipeline:
//! builder, single provider call, classification, normalization and typed
//! decode.

use aerogate_core::{
    Attachment, ChatRole, ComplianceAuditResult, ComplianceStatus, ConversationHistory,
    DiscrepancyType, DocumentInput, ErrorCategory, GatewayConfig, ImpactPriority, NodeCategory,
    PlmArtifactType, PlmStatus, SegmentNormalization, Severity, TaskKind, TriageTrack,
    MEDIA_TYPE_PDF,
};
use aerogate_llm::{ContentPart, ProviderFailure, ResponseMode, TaskOutput, TaskRequest};
use aerogate_test_utils::assertions::{assert_category, assert_edges_resolve, assert_task_prefix};
use aerogate_test_utils::fixtures;
use aerogate_test_utils::{
    gateway_failing, gateway_replying, scripted_gateway, scripted_gateway_with,
    MockInferenceClient,
};

// ============================================================================
// BOM RECONCILIATION
// ============================================================================

#[tokio::test]
async fn test_reconcile_returns_declared_discrepancy_unmodified() {
    let (client, gateway) = gateway_replying(fixtures::version_mismatch_payload());

    let discrepancies = gateway
        .reconcile_boms(&fixtures::as_designed_bom(), &fixtures::as_built_bom())
        .await
        .unwrap();

    assert_eq!(client.call_count(), 1);
    assert_eq!(discrepancies.len(), 1);
    let found = &discrepancies[0];
    assert_eq!(found.part_number, fixtures::BRACKET_PART);
    assert_eq!(found.issue_type, DiscrepancyType::VersionMismatch);
    assert_eq!(found.severity, Severity::Major);
    assert_eq!(
        found.description,
        "As-built revision A does not match as-designed revision B."
    );
}

#[tokio::test]
async fn test_reconcile_prompt_carries_both_boms_and_schema() {
    let (client, gateway) = gateway_replying("[]");

    let discrepancies = gateway
        .reconcile_boms(&fixtures::as_designed_bom(), &fixtures::as_built_bom())
        .await
        .unwrap();
    assert!(discrepancies.is_empty());

    let sent = client.requests().remove(0);
    assert_eq!(sent.task, TaskKind::ReconcileBoms);
    assert!(matches!(sent.response_mode, ResponseMode::Json(_)));
    let ContentPart::Text(prompt) = &sent.messages[0].parts[0] else {
        panic!("first part should be the prompt text");
    };
    assert!(prompt.contains("\"revision\":\"B\""));
    assert!(prompt.contains("\"revision\":\"A\""));
}

#[tokio::test]
async fn test_reconcile_fenced_body_is_malformed() {
    let body = format!("```json\n{}\n```", fixtures::version_mismatch_payload());
    let (_, gateway) = gateway_replying(body);

    let result = gateway
        .reconcile_boms(&fixtures::as_designed_bom(), &fixtures::as_built_bom())
        .await;

    assert_category(&result, ErrorCategory::MalformedJson);
    assert_task_prefix(&result.unwrap_err(), TaskKind::ReconcileBoms);
}

#[tokio::test]
async fn test_reconcile_empty_body_is_empty_response() {
    let (_, gateway) = scripted_gateway(MockInferenceClient::new().with_empty());

    let result = gateway
        .reconcile_boms(&fixtures::as_designed_bom(), &fixtures::as_built_bom())
        .await;

    assert_category(&result, ErrorCategory::EmptyResponse);
}

#[tokio::test]
async fn test_out_of_enum_value_is_malformed() {
    let body = fixtures::version_mismatch_payload().replace("MAJOR", "CATASTROPHIC");
    let (_, gateway) = gateway_replying(body);

    let result = gateway
        .reconcile_boms(&fixtures::as_designed_bom(), &fixtures::as_built_bom())
        .await;

    assert_category(&result, ErrorCategory::MalformedJson);
}

// ============================================================================
// FAILURE CLASSIFICATION
// ============================================================================

#[tokio::test]
async fn test_quota_failure_is_rate_limited_with_prefix() {
    let failure = ProviderFailure {
        status: Some(429),
        code: Some("RESOURCE_EXHAUSTED".to_string()),
        message: "Quota exceeded".to_string(),
        retry_after_ms: Some(3_000),
    };
    let (_, gateway) = gateway_failing(failure);

    let err = gateway
        .analyze_regulatory_impact("AD 2024-05-11: inspect flap actuators", &fixtures::fleet())
        .await
        .unwrap_err();

    assert_eq!(err.category(), ErrorCategory::RateLimited);
    assert_task_prefix(&err, TaskKind::AnalyzeRegulatoryImpact);
    assert!(err.to_string().contains("429"));
}

#[tokio::test]
async fn test_revoked_key_in_bare_message_is_unauthorized() {
    let failure = ProviderFailure::message("request failed: API key expired. Please renew.");
    let (_, gateway) = gateway_failing(failure);

    let err = gateway.fetch_ecn_details("ECN-4471").await.unwrap_err();

    assert_eq!(err.category(), ErrorCategory::Unauthorized);
    assert_task_prefix(&err, TaskKind::FetchEcnDetails);
}

#[tokio::test]
async fn test_embedded_error_json_is_classified() {
    let failure = ProviderFailure::message(
        r#"got {"error":{"code":403,"status":"PERMISSION_DENIED","message":"Key revoked"}}"#,
    );
    let (_, gateway) = gateway_failing(failure);

    let err = gateway.fetch_ecn_details("ECN-4471").await.unwrap_err();

    assert_eq!(err.category(), ErrorCategory::Unauthorized);
    assert!(err.to_string().contains("Key revoked"));
}

#[tokio::test]
async fn test_other_failure_is_upstream_with_prefix() {
    let (_, gateway) = gateway_failing(ProviderFailure::with_status(503, "backend unavailable"));

    let err = gateway.fetch_ecn_details("ECN-4471").await.unwrap_err();

    assert_eq!(err.category(), ErrorCategory::UpstreamGeneric);
    assert_eq!(
        err.to_string(),
        "ECN Lookup Failure: backend unavailable"
    );
}

#[tokio::test]
async fn test_failed_call_is_not_retried() {
    let client = MockInferenceClient::new()
        .with_failure(ProviderFailure::with_status(429, "slow down"))
        .with_text(fixtures::version_mismatch_payload());
    let (client, gateway) = scripted_gateway(client);

    let result = gateway
        .reconcile_boms(&fixtures::as_designed_bom(), &fixtures::as_built_bom())
        .await;

    assert_category(&result, ErrorCategory::RateLimited);
    assert_eq!(client.call_count(), 1);
}

// ============================================================================
// CHANGE TRIAGE
// ============================================================================

#[tokio::test]
async fn test_change_triage_flattens_attributes_last_wins() {
    let (client, gateway) = gateway_replying(fixtures::change_triage_payload());

    let result = gateway
        .analyze_change_request(&fixtures::change_request())
        .await
        .unwrap();

    let graph = &result.technical.graph;
    assert_eq!(graph.nodes.len(), 3);
    let seal = graph.node("N1").unwrap();
    assert_eq!(seal.category, NodeCategory::Part);
    assert_eq!(seal.properties.len(), 2);
    assert_eq!(seal.properties["material"], "steel");
    assert!(graph.node("N2").unwrap().properties.is_empty());
    assert_edges_resolve(graph);

    assert_eq!(result.management.triage_track, TriageTrack::ManualReview);
    assert_eq!(result.management.stakeholders.len(), 3);
    assert_eq!(result.management.conflicts[0].cr_id, "CR-902");

    let serialized = serde_json::to_value(seal).unwrap();
    assert!(serialized.get("attributes").is_none());

    let sent = client.requests().remove(0);
    assert_eq!(sent.thinking_budget, Some(0));
}

#[tokio::test]
async fn test_change_triage_missing_management_is_malformed() {
    let mut payload: serde_json::Value =
        serde_json::from_str(&fixtures::change_triage_payload()).unwrap();
    payload.as_object_mut().unwrap().remove("management");
    let (_, gateway) = gateway_replying(payload.to_string());

    let result = gateway
        .analyze_change_request(&fixtures::change_request())
        .await;

    assert_category(&result, ErrorCategory::MalformedJson);
}

#[tokio::test]
async fn test_change_triage_dangling_edge_is_reported() {
    let mut payload: serde_json::Value =
        serde_json::from_str(&fixtures::change_triage_payload()).unwrap();
    payload["technical"]["edges"][0]["to"] = serde_json::json!("N9");
    let (_, gateway) = gateway_replying(payload.to_string());

    let result = gateway
        .analyze_change_request(&fixtures::change_request())
        .await
        .unwrap();

    let dangling = result.technical.graph.dangling_edges();
    assert_eq!(dangling.len(), 1);
    assert_eq!(dangling[0].id, "E1");
    assert!(result.technical.graph.validate_edges().is_err());
}

// ============================================================================
// REGULATORY LIBRARY
// ============================================================================

#[tokio::test]
async fn test_semantic_search_keeps_library_order_and_drops_unknown_ids() {
    let (_, gateway) = gateway_replying(r#"["SEG-3","SEG-1","SEG-404"]"#);

    let matches = gateway
        .semantic_search("structural coverage", &fixtures::regulation_library())
        .await
        .unwrap();

    let ids: Vec<&str> = matches.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["SEG-1", "SEG-3"]);
}

#[tokio::test]
async fn test_semantic_search_empty_body_means_no_matches() {
    let (_, gateway) = scripted_gateway(MockInferenceClient::new().with_text("   "));

    let matches = gateway
        .semantic_search("structural coverage", &fixtures::regulation_library())
        .await
        .unwrap();

    assert!(matches.is_empty());
}

#[tokio::test]
async fn test_semantic_search_blank_query_is_rejected_without_a_call() {
    let (client, gateway) = gateway_replying("[]");

    let result = gateway
        .semantic_search("  ", &fixtures::regulation_library())
        .await;

    assert_category(&result, ErrorCategory::InvalidRequest);
    assert_eq!(client.call_count(), 0);
}

#[tokio::test]
async fn test_oversized_attachment_is_rejected_without_a_call() {
    let config = GatewayConfig {
        max_attachment_bytes: 16,
        ..GatewayConfig::default()
    };
    let (client, gateway) =
        scripted_gateway_with(MockInferenceClient::new().with_text("{}"), config);
    let document = DocumentInput::Binary(Attachment::from_bytes(MEDIA_TYPE_PDF, &[0u8; 64]));

    let result = gateway.parse_regulation_document(&document).await;

    assert_category(&result, ErrorCategory::InvalidRequest);
    assert_task_prefix(&result.unwrap_err(), TaskKind::ParseRegulationDocument);
    assert_eq!(client.call_count(), 0);
}

#[tokio::test]
async fn test_binary_document_is_sent_inline() {
    let (client, gateway) = gateway_replying("[]");
    let document = DocumentInput::Binary(Attachment::from_bytes(MEDIA_TYPE_PDF, b"%PDF-1.7"));

    let artifacts = gateway.extract_requirements(&document).await.unwrap();
    assert!(artifacts.is_empty());

    let sent = client.requests().remove(0);
    let parts = &sent.messages.last().unwrap().parts;
    assert!(matches!(
        &parts[1],
        ContentPart::InlineData(a) if a.media_type == MEDIA_TYPE_PDF
    ));
}

#[tokio::test]
async fn test_evaluate_compliance_decodes_audit() {
    let (_, gateway) = gateway_replying(fixtures::audit_payload());

    let audit = gateway
        .evaluate_compliance(&fixtures::regulation_library(), &fixtures::plm_artifacts())
        .await
        .unwrap();

    assert_eq!(audit.evaluated_count, 3);
    assert_eq!(audit.pass_count, 2);
    assert_eq!(audit.gap_analysis.len(), 1);
    assert_eq!(audit.gap_analysis[0].regulation_clause_id, "SEG-2");
    assert!(!audit.is_clean());
}

// ============================================================================
// AUDITOR CHAT
// ============================================================================

#[tokio::test]
async fn test_auditor_chat_sends_history_then_message() {
    let (client, gateway) = gateway_replying("Objective A-7 requires MC/DC coverage.");
    let mut history = ConversationHistory::new();
    history.record_exchange("What is DAL A?", "The most severe failure condition level.");

    let reply = gateway
        .auditor_chat(&history, "Which objectives need MC/DC?")
        .await
        .unwrap();
    assert_eq!(reply, "Objective A-7 requires MC/DC coverage.");

    let sent = client.requests().remove(0);
    let roles: Vec<ChatRole> = sent.messages.iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![ChatRole::User, ChatRole::Assistant, ChatRole::User]);
    assert!(sent.system_instruction.unwrap().contains("Virtual Aviation Auditor"));
    assert!(matches!(sent.response_mode, ResponseMode::FreeText));
    assert_eq!(sent.model, GatewayConfig::default().chat_model);
}

#[tokio::test]
async fn test_auditor_chat_empty_reply_is_empty_response() {
    let (_, gateway) = scripted_gateway(MockInferenceClient::new().with_empty());

    let result = gateway
        .auditor_chat(&ConversationHistory::new(), "Hello?")
        .await;

    assert_category(&result, ErrorCategory::EmptyResponse);
}

// ============================================================================
// DECLARED SCHEMAS DECODE IN FULL
// ============================================================================

#[tokio::test]
async fn test_regulatory_impact_decodes_every_field() {
    let (_, gateway) = gateway_replying(fixtures::impact_payload());

    let impacts = gateway
        .analyze_regulatory_impact(fixtures::FLAP_DIRECTIVE, &fixtures::fleet())
        .await
        .unwrap();

    assert_eq!(impacts, vec![fixtures::flap_impact()]);
    assert_eq!(impacts[0].compliance_status, ComplianceStatus::PendingInspection);
    assert_eq!(impacts[0].priority, ImpactPriority::Urgent);
}

#[tokio::test]
async fn test_regulatory_impact_missing_required_field_is_malformed() {
    let mut payload: serde_json::Value =
        serde_json::from_str(&fixtures::impact_payload()).unwrap();
    payload[0].as_object_mut().unwrap().remove("priority");
    let (_, gateway) = gateway_replying(payload.to_string());

    let result = gateway
        .analyze_regulatory_impact(fixtures::FLAP_DIRECTIVE, &fixtures::fleet())
        .await;

    assert_category(&result, ErrorCategory::MalformedJson);
    assert_task_prefix(&result.unwrap_err(), TaskKind::AnalyzeRegulatoryImpact);
}

#[tokio::test]
async fn test_engineering_order_decodes_every_field() {
    let (_, gateway) = gateway_replying(fixtures::engineering_order_payload());

    let order = gateway
        .generate_engineering_order(&fixtures::flap_impact(), fixtures::FLAP_DIRECTIVE)
        .await
        .unwrap();

    assert_eq!(order.eo_number, "EO-2024-0117");
    assert_eq!(order.related_ad, "AD 2024-05-11");
    assert_eq!(order.title, "Flap actuator bracket inspection");
    assert_eq!(order.compliance_deadline, "Within 600 cycles");
    assert_eq!(order.applicability, "N101AA");
    assert_eq!(order.instructions.len(), 2);
    assert_eq!(order.parts_required, vec![fixtures::BRACKET_PART.to_string()]);
    assert_eq!(order.man_hours, 3.5);
}

#[tokio::test]
async fn test_ecn_details_decode_every_field() {
    let (_, gateway) = gateway_replying(fixtures::ecn_payload());

    let ecn = gateway.fetch_ecn_details("ECN-4471").await.unwrap();

    assert_eq!(ecn.id, "ECN-4471");
    assert_eq!(ecn.title, "Bracket revision B");
    assert_eq!(ecn.solution, "Thicken lug section to 4.2 mm.");
    assert_eq!(ecn.approver, "Chief Structures Engineer");
    assert_eq!(ecn.approval_date, "2024-03-18");
    assert_eq!(ecn.impacted_docs, vec!["DWG-27-40-10", "SRM 57-50-01"]);
}

#[tokio::test]
async fn test_regulation_document_decodes_every_field() {
    let (_, gateway) = gateway_replying(fixtures::regulation_payload());
    let document = DocumentInput::from("6.4.4.2 Structural coverage analysis shall be performed.");

    let parsed = gateway.parse_regulation_document(&document).await.unwrap();

    assert_eq!(parsed.document_title, "DO-178C Section 6");
    assert_eq!(parsed.segments.len(), 1);
    let segment = &parsed.segments[0];
    assert_eq!(segment.id, "SEG-1");
    assert_eq!(segment.semantic_summary, "Structural coverage analysis");
    assert_eq!(segment.normalization, SegmentNormalization::ComplianceObligation);
    assert_eq!(segment.metadata.clause_number, "6.4.4.2");
    assert_eq!(segment.metadata.dal_applicability, vec!["A", "B", "C"]);
    assert_eq!(segment.metadata.lifecycle_area, "Verification");
    assert_eq!(segment.structured_rule.rule_type, "OBLIGATION");
    assert_eq!(segment.structured_rule.evidence_required, vec!["Coverage report"]);
    assert_eq!(
        segment.structured_rule.failure_condition,
        Some(vec!["Uncovered code without justification".to_string()])
    );
}

#[tokio::test]
async fn test_extracted_requirements_decode_every_field() {
    let (_, gateway) = gateway_replying(fixtures::requirements_payload());
    let document = DocumentInput::from("REQ-101 The FCC shall detect flap asymmetry.");

    let artifacts = gateway.extract_requirements(&document).await.unwrap();

    assert_eq!(artifacts, fixtures::plm_artifacts());
    assert_eq!(artifacts[0].artifact_type, PlmArtifactType::Requirement);
    assert_eq!(artifacts[1].status, PlmStatus::Draft);
}

#[tokio::test]
async fn test_certification_report_decodes_every_field() {
    let audit: ComplianceAuditResult = serde_json::from_str(&fixtures::audit_payload()).unwrap();
    let (client, gateway) = gateway_replying(fixtures::report_payload());

    let report = gateway
        .generate_certification_report(&audit, "DAL A Certification Readiness")
        .await
        .unwrap();

    assert_eq!(report.title, "DAL A Certification Readiness");
    assert_eq!(report.generated_date, "2024-06-01");
    assert_eq!(report.executive_summary, "Two of three objectives satisfied.");
    assert_eq!(report.compliance_table, "| SEG-1 | PASS |\n| SEG-2 | GAP |");
    assert_eq!(
        report.gap_analysis_section,
        "SEG-2 lacks a structural coverage report."
    );
    assert_eq!(report.conclusion, "Not ready until MC/DC evidence is attached.");
    assert_eq!(client.call_count(), 1);
}

// ============================================================================
// DISPATCH
// ============================================================================

#[tokio::test]
async fn test_dispatch_routes_to_typed_output() {
    let (_, gateway) = gateway_replying(fixtures::version_mismatch_payload());
    let request = TaskRequest::ReconcileBoms {
        as_designed: fixtures::as_designed_bom(),
        as_built: fixtures::as_built_bom(),
    };

    let output = gateway.dispatch(&request).await.unwrap();

    assert_eq!(output.kind(), TaskKind::ReconcileBoms);
    match output {
        TaskOutput::Discrepancies(found) => assert_eq!(found.len(), 1),
        other => panic!("unexpected output: {:?}", other),
    }
}
