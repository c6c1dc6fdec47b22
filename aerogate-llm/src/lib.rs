//! aerogate LLM - Inference Gateway
//!
//! Turns a domain task plus inputs into one schema-constrained call against an
//! external text-generation service, then validates, reshapes, and decodes the
//! reply. The provider is abstracted behind [`InferenceClient`]; the Gemini
//! REST implementation lives in [`providers`].

use aerogate_core::{Attachment, ChatRole, TaskKind};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

pub mod classify;
pub mod gateway;
pub mod normalize;
pub mod prompt;
pub mod providers;
pub mod schema;
pub mod tasks;
pub mod telemetry;

pub use classify::{classify_failure, sniff_message, SniffedCategory};
pub use gateway::InferenceGateway;
pub use normalize::{NormalizeError, Reshape};
pub use providers::GeminiClient;
pub use schema::{ResponseSchema, SchemaViolation};
pub use tasks::{ModelTier, TaskOutput, TaskRequest, TaskSpec};

// ============================================================================
// REQUEST / RESPONSE TYPES
// ============================================================================

/// One part of a message: text or an inline binary payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPart {
    Text(String),
    InlineData(Attachment),
}

/// One message in the request, in chronological order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: ChatRole,
    pub parts: Vec<ContentPart>,
}

impl Message {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            parts: vec![ContentPart::Text(text.into())],
        }
    }

    pub fn text(role: ChatRole, text: impl Into<String>) -> Self {
        Self {
            role,
            parts: vec![ContentPart::Text(text.into())],
        }
    }
}

/// How the provider should shape its reply.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseMode {
    FreeText,
    Json(ResponseSchema),
}

/// A fully resolved call to the inference endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceRequest {
    /// Originating task, for logging and error attribution.
    pub task: TaskKind,
    pub model: String,
    pub system_instruction: Option<String>,
    pub messages: Vec<Message>,
    pub response_mode: ResponseMode,
    /// Decoding-effort hint. `Some(0)` asks for minimum latency.
    pub thinking_budget: Option<u32>,
}

/// Raw reply from the provider.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InferenceResponse {
    /// `None` when the provider returned no text at all.
    pub text: Option<String>,
    pub finish_reason: Option<String>,
}

impl InferenceResponse {
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            finish_reason: None,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

/// Failure reported by a provider, before classification.
///
/// Providers fill the structured fields when the transport exposes them;
/// `message` always carries the raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderFailure {
    /// HTTP status, when a response was received.
    pub status: Option<u16>,
    /// Provider error code, e.g. `RESOURCE_EXHAUSTED`.
    pub code: Option<String>,
    pub message: String,
    pub retry_after_ms: Option<i64>,
}

impl ProviderFailure {
    /// A failure known only by its message.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            status: None,
            code: None,
            message: message.into(),
            retry_after_ms: None,
        }
    }

    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            ..Self::message(message)
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

impl std::fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(f, "[{}] {}", status, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

// ============================================================================
// INFERENCE CLIENT TRAIT
// ============================================================================

/// A text-generation endpoint.
/// Implementations must be thread-safe (Send + Sync).
///
/// # Example
/// ```ignore
/// struct MyClient { /* ... */ }
///
/// #[async_trait]
/// impl InferenceClient for MyClient {
///     fn provider_id(&self) -> &str { "my-provider" }
///     async fn generate(&self, request: &InferenceRequest)
///         -> Result<InferenceResponse, ProviderFailure> {
///         // Call the API once
///     }
/// }
/// ```
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Identifier used in logs and `ProviderNotConfigured` errors.
    fn provider_id(&self) -> &str;

    /// Issue exactly one call. Implementations must not retry.
    async fn generate(&self, request: &InferenceRequest)
        -> Result<InferenceResponse, ProviderFailure>;
}

// ============================================================================
// MOCK CLIENT (for testing)
// ============================================================================

/// Client that replays queued outcomes and records every request it sees.
///
/// Once the queue is drained every call returns an empty response.
#[derive(Debug, Default)]
pub struct MockInferenceClient {
    outcomes: Mutex<VecDeque<Result<InferenceResponse, ProviderFailure>>>,
    requests: Mutex<Vec<InferenceRequest>>,
}

impl MockInferenceClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply with the given body text.
    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.push(Ok(InferenceResponse::with_text(text)));
        self
    }

    /// Queue a reply that carries no text.
    pub fn with_empty(self) -> Self {
        self.push(Ok(InferenceResponse::empty()));
        self
    }

    /// Queue a provider failure.
    pub fn with_failure(self, failure: ProviderFailure) -> Self {
        self.push(Err(failure));
        self
    }

    pub fn push(&self, outcome: Result<InferenceResponse, ProviderFailure>) {
        if let Ok(mut outcomes) = self.outcomes.lock() {
            outcomes.push_back(outcome);
        }
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<InferenceRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }
}

#[async_trait]
impl InferenceClient for MockInferenceClient {
    fn provider_id(&self) -> &str {
        "mock"
    }

    async fn generate(
        &self,
        request: &InferenceRequest,
    ) -> Result<InferenceResponse, ProviderFailure> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        let next = self
            .outcomes
            .lock()
            .map_err(|_| ProviderFailure::message("mock client lock poisoned"))?
            .pop_front();
        next.unwrap_or_else(|| Ok(InferenceResponse::empty()))
    }
}
