//! Inference gateway
//!
//! Stateless front door for every task. Each invocation builds its spec,
//! issues exactly one call through the configured [`InferenceClient`], and
//! either returns the typed result or a classified [`GatewayError`]. There is
//! no retry, caching, or deduplication.

use crate::classify::classify_failure;
use crate::normalize::{self, NormalizeError};
use crate::providers::GeminiClient;
use crate::tasks::{self, TaskOutput, TaskRequest, TaskSpec};
use crate::{InferenceClient, ProviderFailure};
use aerogate_core::{
    AeroResult, BomDiscrepancy, BomItem, CertificationReport, ChangeManagerResult, ChangeRequest,
    ComplianceAuditResult, ConversationHistory, DocumentInput, EcnDetail, EngineeringOrder,
    FleetAircraft, GatewayConfig, GatewayError, PlmArtifact, ProcessedSegment,
    RegulationPipelineResult, RegulatoryImpact, TaskKind,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

/// Schema-constrained gateway over one inference client.
#[derive(Clone)]
pub struct InferenceGateway {
    client: Arc<dyn InferenceClient>,
    config: GatewayConfig,
}

impl InferenceGateway {
    pub fn new(client: Arc<dyn InferenceClient>, config: GatewayConfig) -> Self {
        Self { client, config }
    }

    /// Validate the configuration and connect the Gemini provider.
    pub fn from_config(config: GatewayConfig) -> AeroResult<Self> {
        config.validate()?;
        let client = GeminiClient::new(&config)?;
        Ok(Self::new(Arc::new(client), config))
    }

    /// Shorthand for [`InferenceGateway::from_config`] over `GatewayConfig::from_env()`.
    pub fn from_env() -> AeroResult<Self> {
        Self::from_config(GatewayConfig::from_env())
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn provider_id(&self) -> &str {
        self.client.provider_id()
    }

    /// Run any task and return its typed output.
    pub async fn dispatch(&self, request: &TaskRequest) -> Result<TaskOutput, GatewayError> {
        match request {
            TaskRequest::ReconcileBoms {
                as_designed,
                as_built,
            } => self
                .reconcile_boms(as_designed, as_built)
                .await
                .map(TaskOutput::Discrepancies),
            TaskRequest::AnalyzeRegulatoryImpact {
                directive_text,
                fleet,
            } => self
                .analyze_regulatory_impact(directive_text, fleet)
                .await
                .map(TaskOutput::Impacts),
            TaskRequest::GenerateEngineeringOrder {
                impact,
                directive_text,
            } => self
                .generate_engineering_order(impact, directive_text)
                .await
                .map(TaskOutput::EngineeringOrder),
            TaskRequest::AnalyzeChangeRequest(change) => self
                .analyze_change_request(change)
                .await
                .map(|r| TaskOutput::ChangeTriage(Box::new(r))),
            TaskRequest::FetchEcnDetails { ecn_id } => {
                self.fetch_ecn_details(ecn_id).await.map(TaskOutput::Ecn)
            }
            TaskRequest::ParseRegulationDocument { document } => self
                .parse_regulation_document(document)
                .await
                .map(TaskOutput::Regulation),
            TaskRequest::SemanticSearch { query, library } => self
                .semantic_search(query, library)
                .await
                .map(TaskOutput::Matches),
            TaskRequest::ExtractRequirements { document } => self
                .extract_requirements(document)
                .await
                .map(TaskOutput::Artifacts),
            TaskRequest::EvaluateCompliance {
                segments,
                artifacts,
            } => self
                .evaluate_compliance(segments, artifacts)
                .await
                .map(TaskOutput::Audit),
            TaskRequest::GenerateCertificationReport { audit, title } => self
                .generate_certification_report(audit, title)
                .await
                .map(TaskOutput::Report),
            TaskRequest::AuditorChat { history, message } => self
                .auditor_chat(history, message)
                .await
                .map(TaskOutput::Reply),
        }
    }

    // ========================================================================
    // TYPED TASKS
    // ========================================================================

    /// Compare as-designed and as-built BOMs. An empty list means no discrepancies.
    pub async fn reconcile_boms(
        &self,
        as_designed: &[BomItem],
        as_built: &[BomItem],
    ) -> Result<Vec<BomDiscrepancy>, GatewayError> {
        self.run_structured(tasks::reconcile_boms(as_designed, as_built)?)
            .await
    }

    pub async fn analyze_regulatory_impact(
        &self,
        directive_text: &str,
        fleet: &[FleetAircraft],
    ) -> Result<Vec<RegulatoryImpact>, GatewayError> {
        self.run_structured(tasks::analyze_regulatory_impact(directive_text, fleet)?)
            .await
    }

    pub async fn generate_engineering_order(
        &self,
        impact: &RegulatoryImpact,
        directive_text: &str,
    ) -> Result<EngineeringOrder, GatewayError> {
        self.run_structured(tasks::generate_engineering_order(impact, directive_text)?)
            .await
    }

    /// Triage a change request. Node attributes arrive flattened into `properties`.
    pub async fn analyze_change_request(
        &self,
        request: &ChangeRequest,
    ) -> Result<ChangeManagerResult, GatewayError> {
        self.run_structured(tasks::analyze_change_request(request)?)
            .await
    }

    pub async fn fetch_ecn_details(&self, ecn_id: &str) -> Result<EcnDetail, GatewayError> {
        self.run_structured(tasks::fetch_ecn_details(ecn_id)?).await
    }

    pub async fn parse_regulation_document(
        &self,
        document: &DocumentInput,
    ) -> Result<RegulationPipelineResult, GatewayError> {
        self.run_structured(tasks::parse_regulation_document(document)?)
            .await
    }

    /// Segments of `library` the model judged relevant, in library order.
    ///
    /// An empty reply is a valid "no matches" outcome, not an error.
    pub async fn semantic_search(
        &self,
        query: &str,
        library: &[ProcessedSegment],
    ) -> Result<Vec<ProcessedSegment>, GatewayError> {
        let ids: Vec<String> = self
            .run_structured(tasks::semantic_search(query, library)?)
            .await?;
        let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
        Ok(library
            .iter()
            .filter(|segment| wanted.contains(segment.id.as_str()))
            .cloned()
            .collect())
    }

    pub async fn extract_requirements(
        &self,
        document: &DocumentInput,
    ) -> Result<Vec<PlmArtifact>, GatewayError> {
        self.run_structured(tasks::extract_requirements(document)?)
            .await
    }

    pub async fn evaluate_compliance(
        &self,
        segments: &[ProcessedSegment],
        artifacts: &[PlmArtifact],
    ) -> Result<ComplianceAuditResult, GatewayError> {
        self.run_structured(tasks::evaluate_compliance(segments, artifacts)?)
            .await
    }

    pub async fn generate_certification_report(
        &self,
        audit: &ComplianceAuditResult,
        title: &str,
    ) -> Result<CertificationReport, GatewayError> {
        self.run_structured(tasks::generate_certification_report(audit, title)?)
            .await
    }

    /// One auditor turn. The caller owns the history and appends the exchange.
    pub async fn auditor_chat(
        &self,
        history: &ConversationHistory,
        message: &str,
    ) -> Result<String, GatewayError> {
        let spec = tasks::auditor_chat(history, message)?;
        let kind = spec.kind;
        self.call(&spec)
            .await?
            .ok_or(GatewayError::EmptyResponse { task: kind })
            .inspect_err(|e| log_failure(kind, e))
    }

    // ========================================================================
    // EXECUTION
    // ========================================================================

    async fn run_structured<T: DeserializeOwned>(&self, spec: TaskSpec) -> Result<T, GatewayError> {
        let kind = spec.kind;
        let result = match self.call(&spec).await? {
            Some(text) => normalize::normalize(&text, spec.schema.as_ref(), spec.reshape)
                .and_then(normalize::decode::<T>)
                .map_err(|e| malformed(kind, e)),
            None => match spec.empty_fallback {
                Some(fallback) => decode_fallback(kind, fallback),
                None => Err(GatewayError::EmptyResponse { task: kind }),
            },
        };
        result.inspect_err(|e| log_failure(kind, e))
    }

    /// Issue the single outbound call. `Ok(None)` means the body had no text.
    async fn call(&self, spec: &TaskSpec) -> Result<Option<String>, GatewayError> {
        if let Some(attachment) = &spec.attachment {
            if let Err(e) = attachment.validate(self.config.max_attachment_bytes) {
                let err = GatewayError::InvalidInput {
                    task: spec.kind,
                    reason: e.to_string(),
                };
                log_failure(spec.kind, &err);
                return Err(err);
            }
        }

        let request = spec.to_request(&self.config);
        tracing::debug!(
            task = %spec.kind,
            provider = self.client.provider_id(),
            model = %request.model,
            structured = spec.is_structured(),
            attachment = spec.attachment.is_some(),
            history_turns = spec.history.len(),
            "Dispatching inference task"
        );

        let started = Instant::now();
        let deadline = self.config.request_timeout;
        let outcome = tokio::time::timeout(deadline, self.client.generate(&request))
            .await
            .unwrap_or_else(|_| {
                Err(ProviderFailure::message(format!(
                    "request timed out after {}ms",
                    deadline.as_millis()
                )))
            });
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(response) => {
                tracing::info!(
                    task = %spec.kind,
                    elapsed_ms,
                    finish_reason = ?response.finish_reason,
                    "Inference call completed"
                );
                Ok(response.text.filter(|t| !t.trim().is_empty()))
            }
            Err(failure) => {
                let err = classify_failure(spec.kind, failure);
                tracing::warn!(
                    task = %spec.kind,
                    elapsed_ms,
                    category = ?err.category(),
                    error = %err,
                    "Inference call failed"
                );
                Err(err)
            }
        }
    }
}

fn malformed(task: TaskKind, err: NormalizeError) -> GatewayError {
    GatewayError::MalformedJson {
        task,
        reason: err.to_string(),
    }
}

fn decode_fallback<T: DeserializeOwned>(task: TaskKind, fallback: Value) -> Result<T, GatewayError> {
    tracing::debug!(task = %task, "Empty body, using documented fallback");
    normalize::decode(fallback).map_err(|e| malformed(task, e))
}

fn log_failure(task: TaskKind, err: &GatewayError) {
    match err {
        // Already logged at the call site.
        GatewayError::RateLimited { .. }
        | GatewayError::Unauthorized { .. }
        | GatewayError::Upstream { .. } => {}
        _ => tracing::warn!(
            task = %task,
            category = ?err.category(),
            error = %err,
            "Inference task failed"
        ),
    }
}

impl std::fmt::Debug for InferenceGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceGateway")
            .field("provider", &self.client.provider_id())
            .field("config", &self.config)
            .finish()
    }
}
