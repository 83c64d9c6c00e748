use serde::{Deserialize, Serialize};

pub const DEFAULT_MIME_TYPE: &str = "image/png";

/// One inline-image fragment extracted from an upstream response:
/// raw base64 bytes plus a MIME type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineImage {
    pub data: String,
    pub mime_type: String,
}

impl InlineImage {
    pub fn new(data: impl Into<String>, mime_type: Option<&str>) -> Self {
        Self {
            data: data.into(),
            mime_type: mime_type.unwrap_or(DEFAULT_MIME_TYPE).to_string(),
        }
    }
}

/// A user-supplied image that conditions generation (style reference,
/// try-on subject or garment). The payload is opaque base64.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceImage {
    pub data: String,
    pub mime_type: String,
}

impl ReferenceImage {
    pub fn new(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            mime_type: mime_type.into(),
        }
    }

    pub fn png(data: impl Into<String>) -> Self {
        Self::new(data, DEFAULT_MIME_TYPE)
    }
}

/// A generated image as kept in history. Immutable once created; only its
/// membership in the history store changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: String,
    pub data: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    pub prompt: String,
    /// Creation time, epoch milliseconds.
    pub timestamp: i64,
    #[serde(rename = "aspectRatio", skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
    #[serde(rename = "stylePreset", skip_serializing_if = "Option::is_none")]
    pub style_preset: Option<String>,
}
