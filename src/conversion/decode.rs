//! Provider response decoders
//!
//! Pure parsing of provider response bytes into the uniform result
//! shape. Buffered decoding consumes one complete body; stream decoding
//! consumes one chunk at a time against an explicit accumulator owned by
//! the orchestrator. Chunk-level parse failures are recovered locally;
//! only whole-response failures propagate.

use crate::core::error::GatewayError;
use crate::models::request::TokenUsage;
use crate::models::wire::{AnthropicContentBlock, AnthropicResponse, DeepSeekLine, MetaChunk};
use tracing::debug;

/// Uniform decoded response for buffered invocations
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedResponse {
    pub content: String,
    pub thinking: Option<String>,
    pub usage: TokenUsage,
}

/// Decode a buffered Anthropic-family response
///
/// Typed blocks accumulate by kind: `thinking` into the thinking text,
/// `text` into the content. When no blocks are present the legacy
/// single-string `completion` shape is used. Missing usage means zero.
pub fn decode_anthropic(raw: &[u8]) -> Result<DecodedResponse, GatewayError> {
    let response: AnthropicResponse = serde_json::from_slice(raw)
        .map_err(|e| GatewayError::DecodeFailure(format!("anthropic response: {}", e)))?;

    let mut content = String::new();
    let mut thinking = String::new();

    for block in &response.content {
        match block {
            AnthropicContentBlock::Text { text } => content.push_str(text),
            AnthropicContentBlock::Thinking { thinking: t } => thinking.push_str(t),
            AnthropicContentBlock::Unknown => {}
        }
    }

    if content.is_empty() {
        if let Some(completion) = response.completion {
            content = completion;
        }
    }

    let usage = response.usage.unwrap_or_default();

    Ok(DecodedResponse {
        content,
        thinking: if thinking.is_empty() {
            None
        } else {
            Some(thinking)
        },
        usage: TokenUsage {
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
        },
    })
}

/// Accumulator for a Meta/Llama-family stream
///
/// Usage counts are cumulative on the wire, so each metrics chunk
/// overwrites the running totals.
#[derive(Debug, Default)]
pub struct MetaStreamState {
    pub usage: TokenUsage,
}

/// Decode one Meta-family chunk, returning zero or more text deltas
///
/// A chunk carries a native `generation` delta, an OpenAI-compatible
/// `choices[0].delta.content` delta, or invocation metrics. Malformed
/// chunks are skipped; the stream continues.
pub fn decode_meta_chunk(chunk: &[u8], state: &mut MetaStreamState) -> Vec<String> {
    let parsed: MetaChunk = match serde_json::from_slice(chunk) {
        Ok(parsed) => parsed,
        Err(e) => {
            debug!("skipping malformed meta chunk: {}", e);
            return Vec::new();
        }
    };

    apply_meta_chunk(&parsed, state)
}

fn apply_meta_chunk(chunk: &MetaChunk, state: &mut MetaStreamState) -> Vec<String> {
    let mut deltas = Vec::new();

    if let Some(ref generation) = chunk.generation {
        if !generation.is_empty() {
            deltas.push(generation.clone());
        }
    }

    if let Some(content) = chunk
        .choices
        .first()
        .and_then(|choice| choice.delta.content.as_ref())
    {
        if !content.is_empty() {
            deltas.push(content.clone());
        }
    }

    if let Some(metrics) = chunk.invocation_metrics {
        state.usage.input_tokens = metrics.input_token_count;
        state.usage.output_tokens = metrics.output_token_count;
    }
    if let Some(count) = chunk.prompt_token_count {
        state.usage.input_tokens = count;
    }
    if let Some(count) = chunk.generation_token_count {
        state.usage.output_tokens = count;
    }

    deltas
}

/// Decode a buffered Meta-family response (single JSON body)
pub fn decode_meta(raw: &[u8]) -> Result<DecodedResponse, GatewayError> {
    let parsed: MetaChunk = serde_json::from_slice(raw)
        .map_err(|e| GatewayError::DecodeFailure(format!("meta response: {}", e)))?;

    let mut state = MetaStreamState::default();
    let content = apply_meta_chunk(&parsed, &mut state).concat();

    Ok(DecodedResponse {
        content,
        thinking: None,
        usage: state.usage,
    })
}

/// Accumulator for a DeepSeek-family stream
///
/// The transport delivers newline-delimited JSON; a line may span reads,
/// so incomplete trailing bytes are buffered until the next chunk. The
/// buffer holds raw bytes: chunk boundaries can fall inside a multibyte
/// character, so conversion happens per complete line, never per chunk.
#[derive(Debug, Default)]
pub struct DeepSeekStreamState {
    buffer: Vec<u8>,
    pub usage: TokenUsage,
    pub thinking: String,
}

/// Decode one DeepSeek-family chunk, returning zero or more text deltas
///
/// Each complete line is parsed independently; a parse failure skips
/// that line only. Usage snapshots overwrite the running totals.
pub fn decode_deepseek_chunk(chunk: &[u8], state: &mut DeepSeekStreamState) -> Vec<String> {
    state.buffer.extend_from_slice(chunk);

    let mut deltas = Vec::new();
    while let Some(position) = state.buffer.iter().position(|&byte| byte == b'\n') {
        let line: Vec<u8> = state.buffer.drain(..=position).collect();
        let line = String::from_utf8_lossy(&line);
        if let Some(delta) = decode_deepseek_line(line.trim(), state) {
            deltas.push(delta);
        }
    }
    deltas
}

/// Flush any final unterminated line once the stream has completed
pub fn finish_deepseek_stream(state: &mut DeepSeekStreamState) -> Vec<String> {
    let remainder = std::mem::take(&mut state.buffer);
    let remainder = String::from_utf8_lossy(&remainder);
    let mut deltas = Vec::new();
    if let Some(delta) = decode_deepseek_line(remainder.trim(), state) {
        deltas.push(delta);
    }
    deltas
}

fn decode_deepseek_line(line: &str, state: &mut DeepSeekStreamState) -> Option<String> {
    if line.is_empty() {
        return None;
    }

    let parsed: DeepSeekLine = match serde_json::from_str(line) {
        Ok(parsed) => parsed,
        Err(e) => {
            debug!("skipping malformed deepseek line: {}", e);
            return None;
        }
    };

    if let Some(usage) = parsed.usage {
        state.usage.input_tokens = usage.prompt_tokens;
        state.usage.output_tokens = usage.completion_tokens;
    }

    let choice = parsed.choices.first()?;

    if let Some(reasoning) = choice
        .message
        .as_ref()
        .and_then(|message| message.reasoning_content.as_ref())
    {
        state.thinking.push_str(reasoning);
    }

    choice
        .delta
        .content
        .as_ref()
        .filter(|content| !content.is_empty())
        .cloned()
}

/// Decode a buffered DeepSeek-family response (newline-delimited body)
pub fn decode_deepseek(raw: &[u8]) -> Result<DecodedResponse, GatewayError> {
    let mut state = DeepSeekStreamState::default();
    let mut content = decode_deepseek_chunk(raw, &mut state).concat();
    content.push_str(&finish_deepseek_stream(&mut state).concat());

    if content.is_empty() && state.thinking.is_empty() && state.usage == TokenUsage::default() {
        return Err(GatewayError::DecodeFailure(
            "deepseek response contained no recognizable lines".to_string(),
        ));
    }

    Ok(DecodedResponse {
        content,
        thinking: if state.thinking.is_empty() {
            None
        } else {
            Some(state.thinking)
        },
        usage: state.usage,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anthropic_text_blocks_concatenate() {
        let raw = br#"{"content":[{"type":"text","text":"Hello"},{"type":"text","text":" world"}],"usage":{"input_tokens":3,"output_tokens":4}}"#;
        let decoded = decode_anthropic(raw).unwrap();
        assert_eq!(decoded.content, "Hello world");
        assert_eq!(decoded.thinking, None);
        assert_eq!(decoded.usage.input_tokens, 3);
        assert_eq!(decoded.usage.output_tokens, 4);
    }

    #[test]
    fn test_anthropic_alternating_thinking_and_text() {
        let raw = br#"{"content":[
            {"type":"thinking","thinking":"a"},
            {"type":"text","text":"b"},
            {"type":"thinking","thinking":"c"},
            {"type":"text","text":"d"}
        ]}"#;
        let decoded = decode_anthropic(raw).unwrap();
        assert_eq!(decoded.thinking.as_deref(), Some("ac"));
        assert_eq!(decoded.content, "bd");
    }

    #[test]
    fn test_anthropic_legacy_completion_fallback() {
        let raw = br#"{"completion":"old style"}"#;
        let decoded = decode_anthropic(raw).unwrap();
        assert_eq!(decoded.content, "old style");
        assert_eq!(decoded.usage, TokenUsage::default());
    }

    #[test]
    fn test_anthropic_missing_usage_is_zero() {
        let raw = br#"{"content":[{"type":"text","text":"hi"}]}"#;
        let decoded = decode_anthropic(raw).unwrap();
        assert_eq!(decoded.usage.input_tokens, 0);
        assert_eq!(decoded.usage.output_tokens, 0);
    }

    #[test]
    fn test_anthropic_garbage_is_decode_failure() {
        assert!(matches!(
            decode_anthropic(b"not json"),
            Err(GatewayError::DecodeFailure(_))
        ));
    }

    #[test]
    fn test_meta_stream_deltas_and_final_usage() {
        let mut state = MetaStreamState::default();
        let mut deltas = Vec::new();
        for chunk in [
            br#"{"generation":"Hel"}"#.as_slice(),
            br#"{"generation":"lo"}"#.as_slice(),
            br#"{"amazon-bedrock-invocationMetrics":{"inputTokenCount":5,"outputTokenCount":2}}"#
                .as_slice(),
        ] {
            deltas.extend(decode_meta_chunk(chunk, &mut state));
        }
        assert_eq!(deltas, vec!["Hel", "lo"]);
        assert_eq!(state.usage.input_tokens, 5);
        assert_eq!(state.usage.output_tokens, 2);
    }

    #[test]
    fn test_meta_openai_compatible_delta() {
        let mut state = MetaStreamState::default();
        let deltas = decode_meta_chunk(
            br#"{"choices":[{"delta":{"content":"Hi"}}]}"#,
            &mut state,
        );
        assert_eq!(deltas, vec!["Hi"]);
    }

    #[test]
    fn test_meta_malformed_chunk_skipped() {
        let mut state = MetaStreamState::default();
        assert!(decode_meta_chunk(b"{broken", &mut state).is_empty());
        // Stream continues afterwards
        let deltas = decode_meta_chunk(br#"{"generation":"ok"}"#, &mut state);
        assert_eq!(deltas, vec!["ok"]);
    }

    #[test]
    fn test_meta_usage_overwrites_not_accumulates() {
        let mut state = MetaStreamState::default();
        decode_meta_chunk(
            br#"{"amazon-bedrock-invocationMetrics":{"inputTokenCount":3,"outputTokenCount":1}}"#,
            &mut state,
        );
        decode_meta_chunk(
            br#"{"amazon-bedrock-invocationMetrics":{"inputTokenCount":5,"outputTokenCount":2}}"#,
            &mut state,
        );
        assert_eq!(state.usage.input_tokens, 5);
        assert_eq!(state.usage.output_tokens, 2);
    }

    #[test]
    fn test_meta_native_token_counts() {
        let mut state = MetaStreamState::default();
        let deltas = decode_meta_chunk(
            br#"{"generation":"done","prompt_token_count":7,"generation_token_count":9}"#,
            &mut state,
        );
        assert_eq!(deltas, vec!["done"]);
        assert_eq!(state.usage.input_tokens, 7);
        assert_eq!(state.usage.output_tokens, 9);
    }

    #[test]
    fn test_meta_buffered_decode() {
        let decoded = decode_meta(
            br#"{"generation":"answer","prompt_token_count":4,"generation_token_count":2}"#,
        )
        .unwrap();
        assert_eq!(decoded.content, "answer");
        assert_eq!(decoded.usage.input_tokens, 4);
    }

    #[test]
    fn test_deepseek_malformed_line_skipped() {
        let mut state = DeepSeekStreamState::default();
        let chunk = concat!(
            r#"{"choices":[{"delta":{"content":"a"}}]}"#,
            "\n",
            "{this is not json}",
            "\n",
            r#"{"choices":[{"delta":{"content":"b"}}]}"#,
            "\n",
        );
        let deltas = decode_deepseek_chunk(chunk.as_bytes(), &mut state);
        assert_eq!(deltas, vec!["a", "b"]);
    }

    #[test]
    fn test_deepseek_line_split_across_chunks() {
        let mut state = DeepSeekStreamState::default();
        let first = decode_deepseek_chunk(br#"{"choices":[{"delta":{"con"#, &mut state);
        assert!(first.is_empty());
        let second = decode_deepseek_chunk(b"tent\":\"joined\"}}]}\n", &mut state);
        assert_eq!(second, vec!["joined"]);
    }

    #[test]
    fn test_deepseek_multibyte_character_split_across_chunks() {
        let mut state = DeepSeekStreamState::default();
        let line = "{\"choices\":[{\"delta\":{\"content\":\"café\"}}]}\n".as_bytes();
        // Split between the two bytes of 'é' ("}}]}\n trail after it)
        let split = line.len() - 7;
        let first = decode_deepseek_chunk(&line[..split], &mut state);
        assert!(first.is_empty());
        let second = decode_deepseek_chunk(&line[split..], &mut state);
        assert_eq!(second, vec!["café"]);
    }

    #[test]
    fn test_deepseek_usage_overwrites() {
        let mut state = DeepSeekStreamState::default();
        let chunk = concat!(
            r#"{"choices":[{"delta":{"content":"x"}}],"usage":{"prompt_tokens":2,"completion_tokens":1}}"#,
            "\n",
            r#"{"choices":[{"delta":{"content":"y"}}],"usage":{"prompt_tokens":2,"completion_tokens":5}}"#,
            "\n",
        );
        decode_deepseek_chunk(chunk.as_bytes(), &mut state);
        assert_eq!(state.usage.input_tokens, 2);
        assert_eq!(state.usage.output_tokens, 5);
    }

    #[test]
    fn test_deepseek_reasoning_accumulates() {
        let mut state = DeepSeekStreamState::default();
        let chunk = concat!(
            r#"{"choices":[{"delta":{"content":"x"},"message":{"reasoning_content":"first "}}]}"#,
            "\n",
            r#"{"choices":[{"delta":{},"message":{"reasoning_content":"second"}}]}"#,
            "\n",
        );
        decode_deepseek_chunk(chunk.as_bytes(), &mut state);
        assert_eq!(state.thinking, "first second");
    }

    #[test]
    fn test_deepseek_finish_flushes_unterminated_line() {
        let mut state = DeepSeekStreamState::default();
        let deltas =
            decode_deepseek_chunk(br#"{"choices":[{"delta":{"content":"tail"}}]}"#, &mut state);
        assert!(deltas.is_empty());
        let flushed = finish_deepseek_stream(&mut state);
        assert_eq!(flushed, vec!["tail"]);
    }

    #[test]
    fn test_deepseek_buffered_decode() {
        let body = concat!(
            r#"{"choices":[{"delta":{"content":"Hello"}}]}"#,
            "\n",
            r#"{"choices":[{"delta":{"content":" there"}}],"usage":{"prompt_tokens":6,"completion_tokens":3}}"#,
        );
        let decoded = decode_deepseek(body.as_bytes()).unwrap();
        assert_eq!(decoded.content, "Hello there");
        assert_eq!(decoded.usage.input_tokens, 6);
        assert_eq!(decoded.usage.output_tokens, 3);
    }

    #[test]
    fn test_deepseek_unrecognizable_body_fails() {
        assert!(matches!(
            decode_deepseek(b"complete nonsense"),
            Err(GatewayError::DecodeFailure(_))
        ));
    }
}
