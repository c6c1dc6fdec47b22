//! Gemini REST client

use super::types::{
    ApiError, Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part,
    ThinkingConfig,
};
use crate::{
    ContentPart, InferenceClient, InferenceRequest, InferenceResponse, ProviderFailure,
    ResponseMode,
};
use aerogate_core::{AeroResult, ChatRole, ConfigError, GatewayConfig, GatewayError};
use async_trait::async_trait;
use reqwest::Client;

const PROVIDER_ID: &str = "gemini";

/// Client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    /// Create a client from gateway configuration.
    ///
    /// # Errors
    /// * `GatewayError::ProviderNotConfigured` - no API key is set
    /// * `ConfigError::InvalidValue` - the HTTP client cannot be built
    pub fn new(config: &GatewayConfig) -> AeroResult<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| GatewayError::ProviderNotConfigured {
                provider: PROVIDER_ID.to_string(),
            })?
            .to_string();

        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ConfigError::InvalidValue {
                field: "request_timeout".to_string(),
                value: format!("{:?}", config.request_timeout),
                reason: format!("cannot build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }
}

/// Translate a gateway request into the Gemini wire body.
pub fn to_wire_request(request: &InferenceRequest) -> GenerateContentRequest {
    let contents = request
        .messages
        .iter()
        .map(|message| Content {
            role: Some(wire_role(message.role).to_string()),
            parts: message
                .parts
                .iter()
                .map(|part| match part {
                    ContentPart::Text(text) => Part::text(text.clone()),
                    ContentPart::InlineData(attachment) => {
                        Part::inline(attachment.media_type.clone(), attachment.data.clone())
                    }
                })
                .collect(),
        })
        .collect();

    let system_instruction = request.system_instruction.as_ref().map(|text| Content {
        role: None,
        parts: vec![Part::text(text.clone())],
    });

    let mut config = GenerationConfig::default();
    if let ResponseMode::Json(schema) = &request.response_mode {
        config.response_mime_type = Some("application/json".to_string());
        config.response_schema = Some(schema.to_provider_json());
    }
    config.thinking_config = request.thinking_budget.map(|thinking_budget| ThinkingConfig {
        thinking_budget,
    });

    let has_config = config.response_mime_type.is_some() || config.thinking_config.is_some();

    GenerateContentRequest {
        contents,
        system_instruction,
        generation_config: has_config.then_some(config),
    }
}

fn wire_role(role: ChatRole) -> &'static str {
    match role {
        ChatRole::User => "user",
        ChatRole::Assistant => "model",
    }
}

/// Concatenated answer text of the first candidate. Reasoning parts are skipped.
pub fn response_text(response: &GenerateContentResponse) -> Option<String> {
    let content = response.candidates.first()?.content.as_ref()?;
    let text: String = content
        .parts
        .iter()
        .filter(|p| p.thought != Some(true))
        .filter_map(|p| p.text.as_deref())
        .collect();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn parse_retry_after_ms(headers: &reqwest::header::HeaderMap) -> Option<i64> {
    headers
        .get("retry-after")
        .and_then(|value| value.to_str().ok())
        .and_then(retry_after_seconds_to_ms)
}

/// Delay-seconds form only. The HTTP-date form is not sent by this provider
/// and yields `None`, as do negative and non-finite values.
fn retry_after_seconds_to_ms(value: &str) -> Option<i64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|seconds| seconds.is_finite() && *seconds >= 0.0)
        .map(|seconds| (seconds * 1000.0) as i64)
}

#[async_trait]
impl InferenceClient for GeminiClient {
    fn provider_id(&self) -> &str {
        PROVIDER_ID
    }

    async fn generate(
        &self,
        request: &InferenceRequest,
    ) -> Result<InferenceResponse, ProviderFailure> {
        let body = to_wire_request(request);
        let response = self
            .client
            .post(self.endpoint(&request.model))
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderFailure::message(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let retry_after_ms = parse_retry_after_ms(response.headers());

        if status.is_success() {
            let parsed: GenerateContentResponse = response.json().await.map_err(|e| {
                ProviderFailure::with_status(
                    status.as_u16(),
                    format!("Failed to parse response: {}", e),
                )
            })?;
            let finish_reason = parsed
                .candidates
                .first()
                .and_then(|c| c.finish_reason.clone());
            Ok(InferenceResponse {
                text: response_text(&parsed),
                finish_reason,
            })
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            let (code, message) = match serde_json::from_str::<ApiError>(&error_text) {
                Ok(api_error) => (api_error.error.status, api_error.error.message),
                Err(_) => (None, error_text),
            };

            Err(ProviderFailure {
                status: Some(status.as_u16()),
                code,
                message,
                retry_after_ms,
            })
        }
    }
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ResponseSchema;
    use crate::Message;
    use aerogate_core::{AeroError, Attachment, TaskKind, MEDIA_TYPE_PDF};
    use httpmock::prelude::*;
    use serde_json::json;
    use std::time::Duration;

    fn config(base_url: &str) -> GatewayConfig {
        GatewayConfig::default()
            .with_api_key("test-key")
            .with_base_url(base_url)
            .with_timeout(Duration::from_secs(5))
    }

    fn json_request() -> InferenceRequest {
        InferenceRequest {
            task: TaskKind::FetchEcnDetails,
            model: "gemini-test".to_string(),
            system_instruction: None,
            messages: vec![Message::user_text("ECN-1")],
            response_mode: ResponseMode::Json(ResponseSchema::object([(
                "id",
                ResponseSchema::string(),
            )])),
            thinking_budget: Some(0),
        }
    }

    #[test]
    fn test_missing_key_is_provider_not_configured() {
        let err = GeminiClient::new(&GatewayConfig::default()).unwrap_err();
        assert_eq!(
            err,
            AeroError::Gateway(GatewayError::ProviderNotConfigured {
                provider: "gemini".to_string()
            })
        );
        let blank = GatewayConfig::default().with_api_key("  ");
        assert!(GeminiClient::new(&blank).is_err());
    }

    #[test]
    fn test_retry_after_accepts_only_finite_non_negative_seconds() {
        assert_eq!(retry_after_seconds_to_ms("3"), Some(3_000));
        assert_eq!(retry_after_seconds_to_ms(" 1.5 "), Some(1_500));
        assert_eq!(retry_after_seconds_to_ms("0"), Some(0));
        assert_eq!(retry_after_seconds_to_ms("-5"), None);
        assert_eq!(retry_after_seconds_to_ms("NaN"), None);
        assert_eq!(retry_after_seconds_to_ms("inf"), None);
        assert_eq!(
            retry_after_seconds_to_ms("Wed, 21 Oct 2026 07:28:00 GMT"),
            None
        );
    }

    #[test]
    fn test_debug_redacts_key() {
        let client = GeminiClient::new(&config("http://localhost")).unwrap();
        let debug = format!("{:?}", client);
        assert!(!debug.contains("test-key"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_wire_request_shape() {
        let mut request = json_request();
        request.system_instruction = Some("be brief".to_string());
        request.messages = vec![
            Message::text(ChatRole::User, "hi"),
            Message::text(ChatRole::Assistant, "hello"),
            Message {
                role: ChatRole::User,
                parts: vec![
                    ContentPart::Text("parse this".to_string()),
                    ContentPart::InlineData(Attachment::from_bytes(MEDIA_TYPE_PDF, b"%PDF")),
                ],
            },
        ];
        let wire = serde_json::to_value(to_wire_request(&request)).unwrap();

        assert_eq!(wire["contents"][1]["role"], "model");
        assert_eq!(wire["contents"][2]["parts"][1]["inlineData"]["mimeType"], MEDIA_TYPE_PDF);
        assert_eq!(wire["systemInstruction"]["parts"][0]["text"], "be brief");
        assert!(wire["systemInstruction"].get("role").is_none());
        assert_eq!(wire["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(wire["generationConfig"]["responseSchema"]["type"], "OBJECT");
        assert_eq!(wire["generationConfig"]["thinkingConfig"]["thinkingBudget"], 0);
    }

    #[test]
    fn test_free_text_without_hints_omits_generation_config() {
        let mut request = json_request();
        request.response_mode = ResponseMode::FreeText;
        request.thinking_budget = None;
        let wire = serde_json::to_value(to_wire_request(&request)).unwrap();
        assert!(wire.get("generationConfig").is_none());
    }

    #[test]
    fn test_response_text_skips_thoughts_and_joins_parts() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"role": "model", "parts": [
                {"text": "thinking...", "thought": true},
                {"text": "{\"id\":"},
                {"text": "\"ECN-1\"}"}
            ]}, "finishReason": "STOP"}]
        }))
        .unwrap();
        assert_eq!(response_text(&response).as_deref(), Some("{\"id\":\"ECN-1\"}"));

        let empty: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(response_text(&empty), None);
    }

    #[tokio::test]
    async fn test_generate_success() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/models/gemini-test:generateContent")
                    .header("x-goog-api-key", "test-key");
                then.status(200).json_body(json!({
                    "candidates": [{"content": {"parts": [{"text": "{\"id\":\"ECN-1\"}"}]},
                                    "finishReason": "STOP"}]
                }));
            })
            .await;

        let client = GeminiClient::new(&config(&server.base_url())).unwrap();
        let response = client.generate(&json_request()).await.unwrap();
        mock.assert_async().await;
        assert_eq!(response.text.as_deref(), Some("{\"id\":\"ECN-1\"}"));
        assert_eq!(response.finish_reason.as_deref(), Some("STOP"));
    }

    #[tokio::test]
    async fn test_generate_rate_limited_carries_structured_fields() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/models/gemini-test:generateContent");
                then.status(429).header("retry-after", "3").json_body(json!({
                    "error": {"code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED"}
                }));
            })
            .await;

        let client = GeminiClient::new(&config(&server.base_url())).unwrap();
        let failure = client.generate(&json_request()).await.unwrap_err();
        assert_eq!(failure.status, Some(429));
        assert_eq!(failure.code.as_deref(), Some("RESOURCE_EXHAUSTED"));
        assert_eq!(failure.message, "Quota exceeded");
        assert_eq!(failure.retry_after_ms, Some(3_000));
    }

    #[tokio::test]
    async fn test_generate_non_json_error_body_kept_verbatim() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/models/gemini-test:generateContent");
                then.status(502).body("bad gateway");
            })
            .await;

        let client = GeminiClient::new(&config(&server.base_url())).unwrap();
        let failure = client.generate(&json_request()).await.unwrap_err();
        assert_eq!(failure.status, Some(502));
        assert_eq!(failure.code, None);
        assert_eq!(failure.message, "bad gateway");
    }
}
