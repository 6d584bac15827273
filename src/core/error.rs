//! Gateway error taxonomy
//!
//! Every failure surfaced to a caller is one of these typed variants
//! with a human-readable message; the gateway never panics a request
//! and never retries on the caller's behalf.

use crate::core::transport::TransportError;
use thiserror::Error;

/// Typed failure returned by the invocation gateway
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Malformed caller input: empty conversation, out-of-range
    /// temperature or token budget, attachment size mismatch.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Catalog entry references a provider with no encoder/decoder.
    #[error("unsupported provider: {0}")]
    UnsupportedProvider(String),

    #[error("access denied by upstream: {0}")]
    AccessDenied(String),

    /// The upstream service rejected the request payload.
    #[error("request rejected by upstream: {0}")]
    ValidationRejected(String),

    #[error("rate limited by upstream: {0}")]
    RateLimited(String),

    #[error("model not found upstream: {0}")]
    ModelNotFound(String),

    /// Network/connection-level failure.
    #[error("transport failure: {0}")]
    TransportFailure(String),

    /// Response bytes were not in any recognized shape.
    #[error("failed to decode upstream response: {0}")]
    DecodeFailure(String),

    /// Decoded content was blank. Reportable, not a crash.
    #[error("model returned an empty response")]
    EmptyResponse,
}

impl GatewayError {
    /// Stable machine-readable kind for error response bodies
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::InvalidRequest(_) => "invalid_request",
            GatewayError::UnsupportedProvider(_) => "unsupported_provider",
            GatewayError::AccessDenied(_) => "access_denied",
            GatewayError::ValidationRejected(_) => "validation_rejected",
            GatewayError::RateLimited(_) => "rate_limited",
            GatewayError::ModelNotFound(_) => "model_not_found",
            GatewayError::TransportFailure(_) => "transport_failure",
            GatewayError::DecodeFailure(_) => "decode_failure",
            GatewayError::EmptyResponse => "empty_response",
        }
    }
}

impl From<TransportError> for GatewayError {
    fn from(error: TransportError) -> Self {
        match error {
            TransportError::AccessDenied(message) => GatewayError::AccessDenied(message),
            TransportError::ValidationRejected(message) => GatewayError::ValidationRejected(message),
            TransportError::Throttled(message) => GatewayError::RateLimited(message),
            TransportError::NotFound(message) => GatewayError::ModelNotFound(message),
            TransportError::Other(message) => GatewayError::TransportFailure(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_mapping() {
        let error: GatewayError = TransportError::Throttled("slow down".to_string()).into();
        assert!(matches!(error, GatewayError::RateLimited(_)));
        assert_eq!(error.kind(), "rate_limited");

        let error: GatewayError = TransportError::NotFound("no such model".to_string()).into();
        assert!(matches!(error, GatewayError::ModelNotFound(_)));
    }

    #[test]
    fn test_messages_are_human_readable() {
        let error = GatewayError::InvalidRequest("conversation is empty".to_string());
        assert!(error.to_string().contains("conversation is empty"));
    }
}
