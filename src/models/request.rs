//! Uniform gateway data models
//!
//! This module defines the provider-agnostic request and response types
//! consumed by the invocation gateway. Every provider family is encoded
//! from, and decoded back into, these shapes.

use serde::{Deserialize, Serialize};

/// Conversation role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    /// Wire-level role string shared by all provider families
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

/// A file attached to a conversation message
///
/// Invariant: `size_bytes` equals the decoded byte length of `data_base64`.
/// The orchestrator verifies this before any encoder runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileAttachment {
    pub name: String,
    pub media_type: String,
    pub data_base64: String,
    pub size_bytes: u64,
}

impl FileAttachment {
    /// Image attachments are embedded as content blocks where the
    /// provider supports them; everything else is flattened to text.
    pub fn is_image(&self) -> bool {
        self.media_type.starts_with("image/")
    }
}

/// One turn of the conversation, order-significant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<FileAttachment>,
}

impl ConversationMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            attachments: Vec::new(),
        }
    }
}

/// Provider-agnostic invocation request
///
/// `model` is a logical model id; when absent or unrecognized the
/// gateway substitutes the default catalog entry rather than failing.
#[derive(Debug, Clone, Deserialize)]
pub struct InvocationRequest {
    #[serde(default)]
    pub model: Option<String>,
    pub messages: Vec<ConversationMessage>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub enable_thinking: bool,
}

/// Token counts consumed and produced by one invocation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Uniform result returned to the caller for every provider family
#[derive(Debug, Clone, Serialize)]
pub struct InvocationResult {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking: Option<String>,
    pub usage: TokenUsage,
    pub cost_usd: f64,
    pub duration_millis: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            "\"assistant\""
        );
    }

    #[test]
    fn test_request_defaults() {
        let request: InvocationRequest =
            serde_json::from_str(r#"{"messages":[{"role":"user","content":"hi"}]}"#).unwrap();
        assert!(request.model.is_none());
        assert!(request.temperature.is_none());
        assert!(request.max_tokens.is_none());
        assert!(!request.enable_thinking);
        assert!(request.messages[0].attachments.is_empty());
    }

    #[test]
    fn test_attachment_image_detection() {
        let attachment = FileAttachment {
            name: "photo.png".to_string(),
            media_type: "image/png".to_string(),
            data_base64: String::new(),
            size_bytes: 0,
        };
        assert!(attachment.is_image());

        let attachment = FileAttachment {
            name: "notes.txt".to_string(),
            media_type: "text/plain".to_string(),
            data_base64: String::new(),
            size_bytes: 0,
        };
        assert!(!attachment.is_image());
    }
}
