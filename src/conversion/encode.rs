//! Provider payload encoders
//!
//! Pure functions transforming the uniform conversation into each
//! provider family's wire payload. Malformed input is rejected by the
//! orchestrator before an encoder runs; encoders never fail on valid
//! input.

use crate::core::catalog::{ModelCatalogEntry, Provider};
use crate::models::request::{ConversationMessage, FileAttachment, Role};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use serde_json::{Value, json};

/// Anthropic Bedrock API version string
const ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";

/// Default sampling temperature per provider family
const ANTHROPIC_DEFAULT_TEMPERATURE: f64 = 0.7;
const META_DEFAULT_TEMPERATURE: f64 = 0.5;
const DEEPSEEK_DEFAULT_TEMPERATURE: f64 = 0.6;

/// Default nucleus sampling for the prompt-string and chat families
const DEFAULT_TOP_P: f64 = 0.9;

/// Default generation length for the Meta family when the caller is silent
const META_DEFAULT_MAX_GEN_LEN: u32 = 4096;

/// Minimum extended-reasoning budget accepted upstream
const MIN_THINKING_BUDGET: u32 = 1024;

/// Caller options forwarded to the encoders
#[derive(Debug, Clone, Copy)]
pub struct EncodeOptions {
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    pub enable_thinking: bool,
    /// Character limit for non-image attachments flattened to inline text
    pub attachment_text_limit: usize,
}

/// Build the wire payload for a catalog entry's provider family
pub fn encode(
    messages: &[ConversationMessage],
    entry: &ModelCatalogEntry,
    options: &EncodeOptions,
) -> Value {
    match entry.provider {
        Provider::Anthropic => encode_anthropic(messages, entry, options),
        Provider::Meta => encode_meta(messages, entry, options),
        Provider::DeepSeek => encode_deepseek(messages, entry, options),
    }
}

/// Anthropic-family payload
///
/// At most one leading system message moves into the `system` field.
/// Extended reasoning and temperature are mutually exclusive on the wire.
pub fn encode_anthropic(
    messages: &[ConversationMessage],
    entry: &ModelCatalogEntry,
    options: &EncodeOptions,
) -> Value {
    let (system, rest) = split_leading_system(messages);

    let wire_messages: Vec<Value> = rest
        .iter()
        .map(|message| anthropic_message(message, options.attachment_text_limit))
        .collect();

    let max_tokens = options.max_tokens.unwrap_or(entry.max_tokens);

    let mut payload = json!({
        "anthropic_version": ANTHROPIC_VERSION,
        "max_tokens": max_tokens,
        "messages": wire_messages,
    });

    if let Some(system) = system {
        payload["system"] = json!(system);
    }

    // The reasoning budget must sit strictly below the generation cap,
    // so a cap at or under the minimum budget falls back to plain
    // sampling instead of sending a payload the wire rejects.
    if options.enable_thinking && entry.supports_thinking && max_tokens > MIN_THINKING_BUDGET {
        payload["thinking"] = json!({
            "type": "enabled",
            "budget_tokens": thinking_budget(max_tokens),
        });
    } else {
        payload["temperature"] = json!(
            options
                .temperature
                .unwrap_or(ANTHROPIC_DEFAULT_TEMPERATURE)
        );
    }

    payload
}

/// Meta/Llama-family payload: one flattened prompt string
///
/// The trailing assistant header opens the turn the model continues.
pub fn encode_meta(
    messages: &[ConversationMessage],
    _entry: &ModelCatalogEntry,
    options: &EncodeOptions,
) -> Value {
    let mut prompt = String::from("<|begin_of_text|>");

    for message in messages {
        let text = text_with_inline_attachments(message, options.attachment_text_limit);
        prompt.push_str(&format!(
            "<|start_header_id|>{}<|end_header_id|>\n\n{}<|eot_id|>",
            message.role.as_str(),
            text
        ));
    }

    prompt.push_str("<|start_header_id|>assistant<|end_header_id|>\n\n");

    json!({
        "prompt": prompt,
        "max_gen_len": options.max_tokens.unwrap_or(META_DEFAULT_MAX_GEN_LEN),
        "temperature": options.temperature.unwrap_or(META_DEFAULT_TEMPERATURE),
        "top_p": DEFAULT_TOP_P,
    })
}

/// DeepSeek-family payload
///
/// The transport has no system role; a leading system message becomes a
/// synthetic user/assistant preamble pair ahead of the real conversation.
pub fn encode_deepseek(
    messages: &[ConversationMessage],
    entry: &ModelCatalogEntry,
    options: &EncodeOptions,
) -> Value {
    let mut wire_messages = Vec::with_capacity(messages.len() + 1);

    let rest = match messages.split_first() {
        Some((first, rest)) if first.role == Role::System => {
            wire_messages.push(json!({
                "role": "user",
                "content": format!("[System]: {}", first.content),
            }));
            wire_messages.push(json!({
                "role": "assistant",
                "content": "Understood.",
            }));
            rest
        }
        _ => messages,
    };

    for message in rest {
        let text = text_with_inline_attachments(message, options.attachment_text_limit);
        let (role, content) = match message.role {
            Role::System => ("user", format!("[System]: {}", text)),
            other => (other.as_str(), text),
        };
        wire_messages.push(json!({ "role": role, "content": content }));
    }

    json!({
        "messages": wire_messages,
        "max_tokens": options.max_tokens.unwrap_or(entry.max_tokens),
        "temperature": options.temperature.unwrap_or(DEEPSEEK_DEFAULT_TEMPERATURE),
        "top_p": DEFAULT_TOP_P,
    })
}

/// Split off a single leading system message, if any
fn split_leading_system(
    messages: &[ConversationMessage],
) -> (Option<String>, &[ConversationMessage]) {
    match messages.split_first() {
        Some((first, rest)) if first.role == Role::System => (Some(first.content.clone()), rest),
        _ => (None, messages),
    }
}

/// Build one Anthropic wire message
///
/// Image attachments become ordered content blocks, images first then
/// the text block; non-image attachments are flattened into the text.
fn anthropic_message(message: &ConversationMessage, attachment_limit: usize) -> Value {
    // Non-leading system turns are folded into user turns; the wire only
    // accepts user and assistant roles inside `messages`.
    let (role, base_text) = match message.role {
        Role::System => ("user", format!("[System]: {}", message.content)),
        other => (other.as_str(), message.content.clone()),
    };

    let text = prepend_inline_attachments(&base_text, &message.attachments, attachment_limit);

    let images: Vec<&FileAttachment> = message
        .attachments
        .iter()
        .filter(|attachment| attachment.is_image())
        .collect();

    if images.is_empty() {
        return json!({ "role": role, "content": text });
    }

    let mut blocks: Vec<Value> = images
        .iter()
        .map(|image| {
            json!({
                "type": "image",
                "source": {
                    "type": "base64",
                    "media_type": image.media_type,
                    "data": image.data_base64,
                },
            })
        })
        .collect();
    blocks.push(json!({ "type": "text", "text": text }));

    json!({ "role": role, "content": blocks })
}

/// Message text with non-image attachments flattened in (all providers)
fn text_with_inline_attachments(message: &ConversationMessage, limit: usize) -> String {
    prepend_inline_attachments(&message.content, &message.attachments, limit)
}

/// Prepend delimited inline context for each non-image attachment
fn prepend_inline_attachments(
    text: &str,
    attachments: &[FileAttachment],
    limit: usize,
) -> String {
    let inline: Vec<String> = attachments
        .iter()
        .filter(|attachment| !attachment.is_image())
        .map(|attachment| inline_attachment_text(attachment, limit))
        .collect();

    if inline.is_empty() {
        text.to_string()
    } else {
        format!("{}\n\n{}", inline.join("\n\n"), text)
    }
}

/// Delimited inline rendering of one non-image attachment
fn inline_attachment_text(attachment: &FileAttachment, limit: usize) -> String {
    let decoded = BASE64.decode(&attachment.data_base64).unwrap_or_default();
    let mut body = String::from_utf8_lossy(&decoded).into_owned();
    truncate_chars(&mut body, limit);
    format!(
        "--- attached file: {} ---\n{}\n--- end of file: {} ---",
        attachment.name, body, attachment.name
    )
}

/// Truncate to a character count without splitting a code point
fn truncate_chars(text: &mut String, limit: usize) {
    if let Some((index, _)) = text.char_indices().nth(limit) {
        text.truncate(index);
    }
}

/// Reasoning budget: everything above a reserved answer window, floored
/// at the upstream minimum
fn thinking_budget(max_tokens: u32) -> u32 {
    max_tokens.saturating_sub(MIN_THINKING_BUDGET).max(MIN_THINKING_BUDGET)
}
