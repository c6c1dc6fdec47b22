//! Provider failure classification
//!
//! Structured status and error codes decide first. Only when neither is
//! conclusive does [`sniff_message`] look at the raw message text; that
//! function is the single place substring matching happens.

use crate::ProviderFailure;
use aerogate_core::{GatewayError, TaskKind};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

static RATE_LIMIT_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b429\b|RESOURCE_EXHAUSTED|quota exceeded|too many requests")
        .expect("valid regex")
});

static AUTH_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b40[13]\b|PERMISSION_DENIED|UNAUTHENTICATED")
        .expect("valid regex")
});

static REVOKED_PHRASE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)API key not valid|API_KEY_INVALID|API key expired|\brevoked\b")
        .expect("valid regex")
});

/// Category recovered from message text alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SniffedCategory {
    RateLimited,
    Unauthorized,
}

#[derive(Debug, Deserialize)]
struct EmbeddedEnvelope {
    error: EmbeddedError,
}

#[derive(Debug, Deserialize)]
struct EmbeddedError {
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Map a provider failure to a task-attributed gateway error.
pub fn classify_failure(task: TaskKind, failure: ProviderFailure) -> GatewayError {
    let ProviderFailure {
        status,
        code,
        message,
        retry_after_ms,
    } = failure;

    let structured = status
        .and_then(category_for_status)
        .or_else(|| code.as_deref().and_then(category_for_code));
    let conclusive_upstream = status.is_some_and(|s| s >= 500)
        || code.as_deref().is_some_and(is_server_side_code);

    let category = match structured {
        Some(category) => Some(category),
        None if conclusive_upstream => None,
        None => sniff_message(&message),
    };

    match category {
        Some(SniffedCategory::RateLimited) => GatewayError::RateLimited {
            task,
            retry_after_ms,
        },
        Some(SniffedCategory::Unauthorized) => GatewayError::Unauthorized {
            task,
            message: embedded_message(&message).unwrap_or(message),
        },
        None => GatewayError::Upstream {
            task,
            status,
            message,
        },
    }
}

fn category_for_status(status: u16) -> Option<SniffedCategory> {
    match status {
        429 => Some(SniffedCategory::RateLimited),
        401 | 403 => Some(SniffedCategory::Unauthorized),
        _ => None,
    }
}

fn category_for_code(code: &str) -> Option<SniffedCategory> {
    match code {
        "RESOURCE_EXHAUSTED" => Some(SniffedCategory::RateLimited),
        "PERMISSION_DENIED" | "UNAUTHENTICATED" => Some(SniffedCategory::Unauthorized),
        _ => None,
    }
}

/// Codes that name a server-side condition, never a credential or quota.
fn is_server_side_code(code: &str) -> bool {
    matches!(
        code,
        "DEADLINE_EXCEEDED" | "INTERNAL" | "UNAVAILABLE" | "UNKNOWN" | "ABORTED"
    )
}

/// Last-resort classification from message text.
///
/// Tries an embedded `{"error": {...}}` object first, then marker patterns.
/// Rate limiting wins when both kinds of marker are present.
pub fn sniff_message(message: &str) -> Option<SniffedCategory> {
    if let Some(embedded) = embedded_error(message) {
        let from_embedded = embedded
            .code
            .and_then(category_for_status)
            .or_else(|| embedded.status.as_deref().and_then(category_for_code));
        if from_embedded.is_some() {
            return from_embedded;
        }
    }

    if RATE_LIMIT_MARKER.is_match(message) {
        Some(SniffedCategory::RateLimited)
    } else if AUTH_MARKER.is_match(message) || REVOKED_PHRASE.is_match(message) {
        Some(SniffedCategory::Unauthorized)
    } else {
        None
    }
}

/// Parse the JSON object embedded between the first `{` and the last `}`.
fn embedded_error(message: &str) -> Option<EmbeddedError> {
    let start = message.find('{')?;
    let end = message.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str::<EmbeddedEnvelope>(&message[start..=end])
        .ok()
        .map(|envelope| envelope.error)
}

fn embedded_message(message: &str) -> Option<String> {
    embedded_error(message).and_then(|e| e.message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aerogate_core::ErrorCategory;

    const TASK: TaskKind = TaskKind::AnalyzeChangeRequest;

    #[test]
    fn test_status_429_is_rate_limited() {
        let mut failure = ProviderFailure::with_status(429, "quota");
        failure.retry_after_ms = Some(2_000);
        let err = classify_failure(TASK, failure);
        assert_eq!(
            err,
            GatewayError::RateLimited {
                task: TASK,
                retry_after_ms: Some(2_000)
            }
        );
        assert!(err.to_string().starts_with("Triage Pipeline Failure: "));
    }

    #[test]
    fn test_status_403_and_401_are_unauthorized() {
        for status in [401, 403] {
            let err = classify_failure(TASK, ProviderFailure::with_status(status, "denied"));
            assert_eq!(err.category(), ErrorCategory::Unauthorized);
        }
    }

    #[test]
    fn test_code_used_when_status_inconclusive() {
        let failure = ProviderFailure::with_status(400, "bad").with_code("PERMISSION_DENIED");
        assert_eq!(
            classify_failure(TASK, failure).category(),
            ErrorCategory::Unauthorized
        );
        let failure = ProviderFailure::message("x").with_code("RESOURCE_EXHAUSTED");
        assert_eq!(
            classify_failure(TASK, failure).category(),
            ErrorCategory::RateLimited
        );
    }

    #[test]
    fn test_message_containing_429_is_rate_limited() {
        let err = classify_failure(
            TaskKind::ReconcileBoms,
            ProviderFailure::message("got status 429 from upstream"),
        );
        assert_eq!(err.category(), ErrorCategory::RateLimited);
        assert!(err.to_string().starts_with("BOM Reconciliation Failure: "));
    }

    #[test]
    fn test_message_containing_403_or_revoked_phrase_is_unauthorized() {
        for message in [
            "HTTP 403 Forbidden",
            "API key not valid. Please pass a valid API key.",
            "the key has been revoked",
        ] {
            let err = classify_failure(TaskKind::AuditorChat, ProviderFailure::message(message));
            assert_eq!(err.category(), ErrorCategory::Unauthorized, "{}", message);
            assert!(err.to_string().starts_with("Virtual Auditor Failure: "));
        }
    }

    #[test]
    fn test_embedded_json_error_is_read() {
        let message = r#"ApiError: {"error":{"code":403,"message":"Permission denied on key","status":"PERMISSION_DENIED"}}"#;
        assert_eq!(sniff_message(message), Some(SniffedCategory::Unauthorized));
        match classify_failure(TASK, ProviderFailure::message(message)) {
            GatewayError::Unauthorized { message, .. } => {
                assert_eq!(message, "Permission denied on key")
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_embedded_status_without_code() {
        let message = r#"{"error":{"status":"RESOURCE_EXHAUSTED","message":"try later"}}"#;
        assert_eq!(sniff_message(message), Some(SniffedCategory::RateLimited));
    }

    #[test]
    fn test_digits_inside_larger_numbers_do_not_match() {
        assert_eq!(sniff_message("request id 14290 failed"), None);
        assert_eq!(sniff_message("order 4031 rejected"), None);
    }

    #[test]
    fn test_server_deadline_is_upstream_not_unauthorized() {
        let failure = ProviderFailure::with_status(
            504,
            "Deadline expired before operation could complete.",
        )
        .with_code("DEADLINE_EXCEEDED");
        let err = classify_failure(TASK, failure);
        assert_eq!(err.category(), ErrorCategory::UpstreamGeneric);
        assert_eq!(
            err.to_string(),
            "Triage Pipeline Failure: Deadline expired before operation could complete."
        );

        let bare = ProviderFailure::message("Deadline expired before operation could complete.");
        assert_eq!(
            classify_failure(TASK, bare).category(),
            ErrorCategory::UpstreamGeneric
        );
    }

    #[test]
    fn test_server_side_status_or_code_skips_sniffing() {
        let failure = ProviderFailure::with_status(500, "upstream said 403 to us");
        assert_eq!(
            classify_failure(TASK, failure).category(),
            ErrorCategory::UpstreamGeneric
        );
        let failure = ProviderFailure::message("quota exceeded while INTERNAL").with_code("INTERNAL");
        assert_eq!(
            classify_failure(TASK, failure).category(),
            ErrorCategory::UpstreamGeneric
        );
    }

    #[test]
    fn test_expired_api_key_phrase_is_unauthorized() {
        let err = classify_failure(TASK, ProviderFailure::message("API key expired. Please renew."));
        assert_eq!(err.category(), ErrorCategory::Unauthorized);
    }

    #[test]
    fn test_anything_else_is_upstream_with_prefix() {
        let err = classify_failure(
            TaskKind::EvaluateCompliance,
            ProviderFailure::with_status(500, "internal error"),
        );
        assert_eq!(
            err,
            GatewayError::Upstream {
                task: TaskKind::EvaluateCompliance,
                status: Some(500),
                message: "internal error".to_string(),
            }
        );
        assert_eq!(
            err.to_string(),
            "Compliance Evaluation Failure: internal error"
        );
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Classification keeps the task it was given, whatever the failure.
        #[test]
        fn prop_classification_preserves_task(
            idx in 0usize..TaskKind::ALL.len(),
            status in proptest::option::of(100u16..600),
            message in "[ -~]{0,60}",
        ) {
            let task = TaskKind::ALL[idx];
            let failure = ProviderFailure { status, code: None, message, retry_after_ms: None };
            prop_assert_eq!(classify_failure(task, failure).task(), Some(task));
        }

        /// Messages with no digits, braces, or letters never sniff as anything.
        #[test]
        fn prop_punctuation_never_sniffs(message in "[ .,;:!?-]{0,40}") {
            prop_assert_eq!(sniff_message(&message), None);
        }
    }
}
