//! Invocation orchestrator
//!
//! Drives one invocation end to end: validate the uniform request,
//! resolve the catalog entry, encode the wire payload, invoke the
//! transport (buffered or streamed), decode the response, and price the
//! usage. The transport is injected so tests can substitute a double.
//! The gateway holds no cross-request mutable state; any number of
//! invocations may run concurrently.

use crate::conversion::decode::{
    DeepSeekStreamState, MetaStreamState, decode_anthropic, decode_deepseek, decode_deepseek_chunk,
    decode_meta, decode_meta_chunk, finish_deepseek_stream,
};
use crate::conversion::encode::{EncodeOptions, encode};
use crate::core::catalog::{self, ModelCatalogEntry, Provider};
use crate::core::cost::cost_usd;
use crate::core::error::GatewayError;
use crate::core::transport::ModelTransport;
use crate::models::request::{InvocationRequest, InvocationResult, TokenUsage};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use futures::StreamExt;
use futures::stream::Stream;
use serde_json::Value;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Incremental output of a streaming invocation
///
/// Zero or more `Delta` items followed by exactly one `Done` carrying
/// the finalized result (full content, usage, cost, duration).
#[derive(Debug)]
pub enum StreamEvent {
    Delta(String),
    Done(InvocationResult),
}

/// Lazy event sequence; dropping it cancels the transport read
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, GatewayError>> + Send>>;

/// The invocation gateway
pub struct Gateway {
    transport: Arc<dyn ModelTransport>,
    default_entry: &'static ModelCatalogEntry,
    attachment_text_limit: usize,
}

impl Gateway {
    /// Create a gateway around an injected transport
    pub fn new(transport: Arc<dyn ModelTransport>, attachment_text_limit: usize) -> Self {
        Self {
            transport,
            default_entry: catalog::default_entry(),
            attachment_text_limit,
        }
    }

    /// Override the default model used for absent/unknown logical ids
    ///
    /// An id missing from the catalog leaves the built-in default in
    /// place; configuration validates the id beforehand.
    pub fn with_default_model(mut self, logical_id: &str) -> Self {
        match catalog::resolve(logical_id) {
            Some(entry) => self.default_entry = entry,
            None => warn!(
                "configured default model '{}' not in catalog, keeping '{}'",
                logical_id, self.default_entry.logical_id
            ),
        }
        self
    }

    /// Buffered invocation: one request, one uniform result
    pub async fn invoke(&self, request: InvocationRequest) -> Result<InvocationResult, GatewayError> {
        let entry = self.resolve_entry(request.model.as_deref());
        self.validate(&request, entry)?;

        let payload = encode(&request.messages, entry, &self.encode_options(&request));
        let started = Instant::now();

        if entry.supports_streaming {
            // Transport path follows the catalog flag; drain the stream
            // and hand back only the finalized result.
            let mut stream = self.open_stream(entry, payload, started).await?;
            let mut done = None;
            while let Some(event) = stream.next().await {
                if let StreamEvent::Done(result) = event? {
                    done = Some(result);
                }
            }
            done.ok_or_else(|| {
                GatewayError::TransportFailure("stream ended before completion".to_string())
            })
        } else {
            self.invoke_buffered(entry, &payload, started).await
        }
    }

    /// Streaming invocation: lazy sequence of text deltas, terminated by
    /// a final result or a typed failure
    ///
    /// Models without streaming support are invoked buffered and their
    /// whole content emitted as a single delta, so the caller-facing
    /// contract is uniform. Not resumable; issue a new call to restart.
    pub async fn invoke_stream(
        &self,
        request: InvocationRequest,
    ) -> Result<EventStream, GatewayError> {
        let entry = self.resolve_entry(request.model.as_deref());
        self.validate(&request, entry)?;

        let payload = encode(&request.messages, entry, &self.encode_options(&request));
        let started = Instant::now();

        if entry.supports_streaming {
            self.open_stream(entry, payload, started).await
        } else {
            let result = self.invoke_buffered(entry, &payload, started).await?;
            let stream = async_stream::stream! {
                yield Ok(StreamEvent::Delta(result.content.clone()));
                yield Ok(StreamEvent::Done(result));
            };
            Ok(Box::pin(stream))
        }
    }

    /// Unknown or absent logical ids fall back to the default entry;
    /// callers are never rejected for an unrecognized model id.
    fn resolve_entry(&self, model: Option<&str>) -> &'static ModelCatalogEntry {
        match model {
            Some(logical_id) => match catalog::resolve(logical_id) {
                Some(entry) => entry,
                None => {
                    warn!(
                        "unknown model id '{}', falling back to '{}'",
                        logical_id, self.default_entry.logical_id
                    );
                    self.default_entry
                }
            },
            None => self.default_entry,
        }
    }

    fn validate(
        &self,
        request: &InvocationRequest,
        entry: &ModelCatalogEntry,
    ) -> Result<(), GatewayError> {
        if request.messages.is_empty() {
            return Err(GatewayError::InvalidRequest(
                "conversation must contain at least one message".to_string(),
            ));
        }

        if let Some(max_tokens) = request.max_tokens {
            if max_tokens == 0 {
                return Err(GatewayError::InvalidRequest(
                    "max_tokens must be positive".to_string(),
                ));
            }
            if max_tokens > entry.max_tokens {
                return Err(GatewayError::InvalidRequest(format!(
                    "max_tokens {} exceeds the {} limit for model {}",
                    max_tokens, entry.max_tokens, entry.logical_id
                )));
            }
        }

        if let Some(temperature) = request.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(GatewayError::InvalidRequest(format!(
                    "temperature {} is outside the [0, 2] range",
                    temperature
                )));
            }
        }

        for message in &request.messages {
            for attachment in &message.attachments {
                let decoded = BASE64.decode(&attachment.data_base64).map_err(|e| {
                    GatewayError::InvalidRequest(format!(
                        "attachment '{}' is not valid base64: {}",
                        attachment.name, e
                    ))
                })?;
                if decoded.len() as u64 != attachment.size_bytes {
                    return Err(GatewayError::InvalidRequest(format!(
                        "attachment '{}' declares {} bytes but decodes to {}",
                        attachment.name,
                        attachment.size_bytes,
                        decoded.len()
                    )));
                }
            }
        }

        Ok(())
    }

    fn encode_options(&self, request: &InvocationRequest) -> EncodeOptions {
        EncodeOptions {
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            enable_thinking: request.enable_thinking,
            attachment_text_limit: self.attachment_text_limit,
        }
    }

    async fn invoke_buffered(
        &self,
        entry: &'static ModelCatalogEntry,
        payload: &Value,
        started: Instant,
    ) -> Result<InvocationResult, GatewayError> {
        debug!("invoking {} (buffered)", entry.wire_model_id);
        let raw = self.transport.invoke(entry.wire_model_id, payload).await?;

        let decoded = match entry.provider {
            Provider::Anthropic => decode_anthropic(&raw)?,
            Provider::Meta => decode_meta(&raw)?,
            Provider::DeepSeek => decode_deepseek(&raw)?,
        };

        if decoded.content.trim().is_empty() {
            return Err(GatewayError::EmptyResponse);
        }

        Ok(InvocationResult {
            cost_usd: cost_usd(decoded.usage, entry),
            content: decoded.content,
            thinking: decoded.thinking,
            usage: decoded.usage,
            duration_millis: started.elapsed().as_millis() as u64,
        })
    }

    async fn open_stream(
        &self,
        entry: &'static ModelCatalogEntry,
        payload: Value,
        started: Instant,
    ) -> Result<EventStream, GatewayError> {
        debug!("invoking {} (streaming)", entry.wire_model_id);
        let mut chunks = self
            .transport
            .invoke_stream(entry.wire_model_id, &payload)
            .await?;

        let stream = async_stream::stream! {
            let mut content = String::new();
            let mut thinking: Option<String> = None;
            let mut usage = TokenUsage::default();

            match entry.provider {
                Provider::Meta => {
                    let mut state = MetaStreamState::default();
                    while let Some(item) = chunks.next().await {
                        match item {
                            Ok(chunk) => {
                                for delta in decode_meta_chunk(&chunk, &mut state) {
                                    content.push_str(&delta);
                                    yield Ok(StreamEvent::Delta(delta));
                                }
                            }
                            Err(e) => {
                                yield Err(e.into());
                                return;
                            }
                        }
                    }
                    usage = state.usage;
                }
                Provider::DeepSeek => {
                    let mut state = DeepSeekStreamState::default();
                    while let Some(item) = chunks.next().await {
                        match item {
                            Ok(chunk) => {
                                for delta in decode_deepseek_chunk(&chunk, &mut state) {
                                    content.push_str(&delta);
                                    yield Ok(StreamEvent::Delta(delta));
                                }
                            }
                            Err(e) => {
                                yield Err(e.into());
                                return;
                            }
                        }
                    }
                    for delta in finish_deepseek_stream(&mut state) {
                        content.push_str(&delta);
                        yield Ok(StreamEvent::Delta(delta));
                    }
                    if !state.thinking.is_empty() {
                        thinking = Some(std::mem::take(&mut state.thinking));
                    }
                    usage = state.usage;
                }
                Provider::Anthropic => {
                    // This family streams no incremental shape we decode;
                    // buffer the chunked body and decode it whole.
                    let mut raw = Vec::new();
                    while let Some(item) = chunks.next().await {
                        match item {
                            Ok(chunk) => raw.extend_from_slice(&chunk),
                            Err(e) => {
                                yield Err(e.into());
                                return;
                            }
                        }
                    }
                    match decode_anthropic(&raw) {
                        Ok(decoded) => {
                            content = decoded.content;
                            thinking = decoded.thinking;
                            usage = decoded.usage;
                            if !content.is_empty() {
                                yield Ok(StreamEvent::Delta(content.clone()));
                            }
                        }
                        Err(e) => {
                            yield Err(e);
                            return;
                        }
                    }
                }
            }

            if content.trim().is_empty() {
                yield Err(GatewayError::EmptyResponse);
                return;
            }

            yield Ok(StreamEvent::Done(InvocationResult {
                cost_usd: cost_usd(usage, entry),
                content,
                thinking,
                usage,
                duration_millis: started.elapsed().as_millis() as u64,
            }));
        };

        Ok(Box::pin(stream))
    }
}
