//! Transport adapter for the remote model-invocation service
//!
//! Defines the transport contract (one request, one buffered response or
//! one ordered byte-chunk stream) and the HTTP implementation. The
//! transport is constructed explicitly and injected into the gateway so
//! tests can substitute a double.

use async_trait::async_trait;
use futures::stream::Stream;
use futures_util::StreamExt;
use reqwest::Client;
use serde_json::Value;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;

/// Ordered byte chunks terminated by stream end or an error item
pub type ByteChunkStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, TransportError>> + Send>>;

/// Transport-level failures, classified from the upstream error surface
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("validation rejected: {0}")]
    ValidationRejected(String),

    #[error("throttled: {0}")]
    Throttled(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Other(String),
}

/// Contract with the remote model-invocation service
#[async_trait]
pub trait ModelTransport: Send + Sync {
    /// Buffered call: one request, one complete response body
    async fn invoke(&self, wire_model_id: &str, body: &Value) -> Result<Vec<u8>, TransportError>;

    /// Streaming call: one request, one ordered chunk stream
    ///
    /// Dropping the returned stream releases the underlying connection;
    /// there is no way to resume, only to issue a new call.
    async fn invoke_stream(
        &self,
        wire_model_id: &str,
        body: &Value,
    ) -> Result<ByteChunkStream, TransportError>;
}

/// HTTP transport to the model-invocation service
pub struct HttpTransport {
    client: Client,
    api_key: String,
    base_url: String,
}

impl HttpTransport {
    /// Create a new HTTP transport
    ///
    /// # Arguments
    ///
    /// * `base_url` - Model-invocation service base URL
    /// * `api_key` - Bearer token for the service
    /// * `timeout` - Request timeout in seconds
    pub fn new(base_url: String, api_key: String, timeout: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_key,
            base_url,
        }
    }

    async fn send(
        &self,
        wire_model_id: &str,
        body: &Value,
        streaming: bool,
    ) -> Result<reqwest::Response, TransportError> {
        let action = if streaming {
            "invoke-with-response-stream"
        } else {
            "invoke"
        };
        let url = format!("{}/model/{}/{}", self.base_url, wire_model_id, action);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| TransportError::Other(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(classify_upstream_error(status.as_u16(), &error_text));
        }

        Ok(response)
    }
}

#[async_trait]
impl ModelTransport for HttpTransport {
    async fn invoke(&self, wire_model_id: &str, body: &Value) -> Result<Vec<u8>, TransportError> {
        let response = self.send(wire_model_id, body, false).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::Other(format!("Failed to read response body: {}", e)))?;
        Ok(bytes.to_vec())
    }

    async fn invoke_stream(
        &self,
        wire_model_id: &str,
        body: &Value,
    ) -> Result<ByteChunkStream, TransportError> {
        let response = self.send(wire_model_id, body, true).await?;

        // The response owns the connection; dropping the stream drops it.
        let stream = response.bytes_stream().map(|chunk| {
            chunk
                .map(|bytes| bytes.to_vec())
                .map_err(|e| TransportError::Other(e.to_string()))
        });

        Ok(Box::pin(stream))
    }
}

/// Classify an upstream error body into a typed transport error
///
/// The upstream surface uses exception-name strings; HTTP status codes
/// are the fallback signal when no name matches.
fn classify_upstream_error(status: u16, error_text: &str) -> TransportError {
    if error_text.contains("AccessDeniedException") {
        return TransportError::AccessDenied(
            "Access denied by the model-invocation service. Check the API key and model permissions."
                .to_string(),
        );
    }

    if error_text.contains("ThrottlingException") {
        return TransportError::Throttled(
            "Upstream throttled the request. Wait and try again.".to_string(),
        );
    }

    if error_text.contains("ResourceNotFoundException") {
        return TransportError::NotFound(
            "The wire model id is not available on the model-invocation service.".to_string(),
        );
    }

    if error_text.contains("ValidationException") {
        if error_text.contains("inference profile") {
            return TransportError::ValidationRejected(
                "This model requires an inference profile id rather than a bare model id."
                    .to_string(),
            );
        }
        return TransportError::ValidationRejected(error_text.to_string());
    }

    match status {
        403 => TransportError::AccessDenied(error_text.to_string()),
        404 => TransportError::NotFound(error_text.to_string()),
        429 => TransportError::Throttled(error_text.to_string()),
        _ => TransportError::Other(format!("upstream error (status {}): {}", status, error_text)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_access_denied() {
        let error = classify_upstream_error(
            400,
            r#"{"__type":"AccessDeniedException","message":"no"}"#,
        );
        assert!(matches!(error, TransportError::AccessDenied(_)));
    }

    #[test]
    fn test_classify_throttling() {
        let error = classify_upstream_error(400, "ThrottlingException: too many requests");
        assert!(matches!(error, TransportError::Throttled(_)));
    }

    #[test]
    fn test_classify_inference_profile_hint() {
        let error = classify_upstream_error(
            400,
            "ValidationException: Invocation of model ID x with on-demand throughput isn't supported. Use an inference profile.",
        );
        match error {
            TransportError::ValidationRejected(message) => {
                assert!(message.contains("inference profile"));
            }
            other => panic!("expected ValidationRejected, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_by_status_fallback() {
        assert!(matches!(
            classify_upstream_error(429, "slow down"),
            TransportError::Throttled(_)
        ));
        assert!(matches!(
            classify_upstream_error(404, "missing"),
            TransportError::NotFound(_)
        ));
        assert!(matches!(
            classify_upstream_error(500, "boom"),
            TransportError::Other(_)
        ));
    }
}
