//! Binary attachments for document-ingestion tasks

use crate::ValidationError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

/// Media type for PDF uploads.
pub const MEDIA_TYPE_PDF: &str = "application/pdf";

/// Base64-encoded bytes tagged with a media type.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub media_type: String,
    /// Standard base64, no data-URL prefix.
    pub data: String,
}

impl Attachment {
    /// Wrap already-encoded data.
    pub fn new(media_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            media_type: media_type.into(),
            data: data.into(),
        }
    }

    /// Encode raw bytes.
    pub fn from_bytes(media_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self::new(media_type, STANDARD.encode(bytes))
    }

    /// Decode the payload.
    pub fn decode(&self) -> Result<Vec<u8>, ValidationError> {
        STANDARD
            .decode(self.data.as_bytes())
            .map_err(|e| ValidationError::InvalidValue {
                field: "attachment.data".to_string(),
                reason: format!("not valid base64: {}", e),
            })
    }

    /// Size of the decoded payload, computed from the encoded length.
    pub fn decoded_len(&self) -> usize {
        let len = self.data.len();
        let padding = self.data.bytes().rev().take_while(|b| *b == b'=').count();
        ((len / 4) * 3).saturating_sub(padding.min(2))
    }

    /// Reject empty, mistyped, undecodable, or oversized attachments.
    pub fn validate(&self, max_bytes: usize) -> Result<(), ValidationError> {
        if self.media_type.trim().is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "attachment.media_type".to_string(),
            });
        }
        if self.data.is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "attachment.data".to_string(),
            });
        }
        let size = self.decode()?.len();
        if size > max_bytes {
            return Err(ValidationError::AttachmentTooLarge {
                size,
                limit: max_bytes,
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for Attachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attachment")
            .field("media_type", &self.media_type)
            .field("encoded_len", &self.data.len())
            .finish()
    }
}

/// Document supplied to an ingestion task: extracted text or raw bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "content", rename_all = "snake_case")]
pub enum DocumentInput {
    Text(String),
    Binary(Attachment),
}

impl From<&str> for DocumentInput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for DocumentInput {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Attachment> for DocumentInput {
    fn from(attachment: Attachment) -> Self {
        Self::Binary(attachment)
    }
}
