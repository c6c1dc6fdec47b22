//! Error types for aerogate operations

use crate::TaskKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// User-facing category of a gateway failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Provider quota or rate limit hit (HTTP 429).
    RateLimited,
    /// Credential missing, invalid, or revoked (HTTP 401/403).
    Unauthorized,
    /// The call succeeded but carried no text body.
    EmptyResponse,
    /// The body was not JSON of the declared shape.
    MalformedJson,
    /// Any other upstream failure.
    UpstreamGeneric,
    /// Rejected before any call was issued.
    InvalidRequest,
}

/// Inference gateway errors.
///
/// Every variant that originates from a task carries the [`TaskKind`], and its
/// message starts with that task's failure prefix.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("{}: API quota exceeded (429). The system is under heavy load. Please wait a few seconds before retrying.", task.failure_prefix())]
    RateLimited {
        task: TaskKind,
        retry_after_ms: Option<i64>,
    },

    #[error("{}: API key rejected (403). The credential is invalid or has been revoked: {message}", task.failure_prefix())]
    Unauthorized { task: TaskKind, message: String },

    #[error("{}: no response text", task.failure_prefix())]
    EmptyResponse { task: TaskKind },

    #[error("{}: malformed JSON in response: {reason}", task.failure_prefix())]
    MalformedJson { task: TaskKind, reason: String },

    #[error("{}: {message}", task.failure_prefix())]
    Upstream {
        task: TaskKind,
        status: Option<u16>,
        message: String,
    },

    #[error("No inference provider configured for {provider}: API key is not set")]
    ProviderNotConfigured { provider: String },

    #[error("{}: invalid input: {reason}", task.failure_prefix())]
    InvalidInput { task: TaskKind, reason: String },
}

impl GatewayError {
    /// The user-facing category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::RateLimited { .. } => ErrorCategory::RateLimited,
            Self::Unauthorized { .. } | Self::ProviderNotConfigured { .. } => {
                ErrorCategory::Unauthorized
            }
            Self::EmptyResponse { .. } => ErrorCategory::EmptyResponse,
            Self::MalformedJson { .. } => ErrorCategory::MalformedJson,
            Self::Upstream { .. } => ErrorCategory::UpstreamGeneric,
            Self::InvalidInput { .. } => ErrorCategory::InvalidRequest,
        }
    }

    /// The task the error originated from, if any.
    pub fn task(&self) -> Option<TaskKind> {
        match self {
            Self::RateLimited { task, .. }
            | Self::Unauthorized { task, .. }
            | Self::EmptyResponse { task }
            | Self::MalformedJson { task, .. }
            | Self::Upstream { task, .. }
            | Self::InvalidInput { task, .. } => Some(*task),
            Self::ProviderNotConfigured { .. } => None,
        }
    }
}

/// Validation errors for caller-supplied values and returned artifacts.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Edge {edge_id} references unknown node {node_id}")]
    DanglingEdge { edge_id: String, node_id: String },

    #[error("Attachment of {size} bytes exceeds the {limit} byte limit")]
    AttachmentTooLarge { size: usize, limit: usize },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Key-value history store errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Failed to encode history under {key}: {reason}")]
    EncodeFailed { key: String, reason: String },

    #[error("Failed to decode history under {key}: {reason}")]
    DecodeFailed { key: String, reason: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Master error type for all aerogate errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AeroError {
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl AeroError {
    /// The gateway category, when this is a gateway error.
    pub fn category(&self) -> Option<ErrorCategory> {
        match self {
            Self::Gateway(err) => Some(err.category()),
            _ => None,
        }
    }
}

/// Result type alias for aerogate operations.
pub type AeroResult<T> = Result<T, AeroError>;

// =============================================================================
// TESTS
// =============================================================================
