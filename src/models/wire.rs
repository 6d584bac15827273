//! Provider wire-format data models
//!
//! Response shapes for the three provider families as delivered by the
//! model-invocation service. Request payloads are built directly as JSON
//! by the encoders; only responses need typed deserialization here.

use serde::Deserialize;

/// Anthropic-family typed content block
///
/// Unknown block kinds deserialize to `Unknown` and are ignored by the
/// decoder rather than failing the whole response.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AnthropicContentBlock {
    Text { text: String },
    Thinking { thinking: String },
    #[serde(other)]
    Unknown,
}

/// Anthropic-family token usage
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct AnthropicUsage {
    #[serde(default)]
    pub input_tokens: u32,
    #[serde(default)]
    pub output_tokens: u32,
}

/// Anthropic-family buffered response
///
/// `completion` is the legacy single-string shape some older model
/// revisions still return; the decoder falls back to it when no content
/// blocks are present.
#[derive(Debug, Clone, Deserialize)]
pub struct AnthropicResponse {
    #[serde(default)]
    pub content: Vec<AnthropicContentBlock>,
    #[serde(default)]
    pub completion: Option<String>,
    #[serde(default)]
    pub usage: Option<AnthropicUsage>,
}

/// OpenAI-compatible streaming delta
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamDelta {
    #[serde(default)]
    pub content: Option<String>,
}

/// OpenAI-compatible per-choice message carrying reasoning text
#[derive(Debug, Clone, Deserialize)]
pub struct StreamMessage {
    #[serde(default)]
    pub reasoning_content: Option<String>,
}

/// OpenAI-compatible streaming choice
#[derive(Debug, Clone, Deserialize)]
pub struct StreamChoice {
    #[serde(default)]
    pub delta: StreamDelta,
    #[serde(default)]
    pub message: Option<StreamMessage>,
}

/// Invocation metrics trailer emitted on Bedrock-style streams
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct InvocationMetrics {
    #[serde(rename = "inputTokenCount", default)]
    pub input_token_count: u32,
    #[serde(rename = "outputTokenCount", default)]
    pub output_token_count: u32,
}

/// Meta/Llama-family streamed chunk
///
/// A chunk carries either a native `generation` delta, an
/// OpenAI-compatible `choices` delta, or invocation metrics; the fields
/// are all optional so one struct covers every observed shape.
#[derive(Debug, Clone, Deserialize)]
pub struct MetaChunk {
    #[serde(default)]
    pub generation: Option<String>,
    #[serde(default)]
    pub prompt_token_count: Option<u32>,
    #[serde(default)]
    pub generation_token_count: Option<u32>,
    #[serde(default)]
    pub choices: Vec<StreamChoice>,
    #[serde(rename = "amazon-bedrock-invocationMetrics", default)]
    pub invocation_metrics: Option<InvocationMetrics>,
}

/// DeepSeek-family token usage, cumulative per snapshot
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct DeepSeekUsage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
}

/// One newline-delimited JSON line of a DeepSeek-family stream
#[derive(Debug, Clone, Deserialize)]
pub struct DeepSeekLine {
    #[serde(default)]
    pub choices: Vec<StreamChoice>,
    #[serde(default)]
    pub usage: Option<DeepSeekUsage>,
}
