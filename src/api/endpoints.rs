//! API endpoint handlers
//!
//! HTTP surface of the invocation gateway: buffered and streaming
//! invocation endpoints plus service metadata and health checks.

use crate::core::catalog;
use crate::core::config::Config;
use crate::core::error::GatewayError;
use crate::core::orchestrator::{Gateway, StreamEvent};
use crate::models::request::InvocationRequest;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response, Sse},
    routing::{get, post},
};
use futures::StreamExt;
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub gateway: Arc<Gateway>,
}

/// Create the API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/v1/invoke", post(invoke))
        .route("/v1/invoke/stream", post(invoke_stream))
        .route("/health", get(health_check))
        .with_state(state)
}

/// Map a gateway error to an HTTP status code
fn status_for(error: &GatewayError) -> StatusCode {
    match error {
        GatewayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        GatewayError::UnsupportedProvider(_) => StatusCode::NOT_IMPLEMENTED,
        GatewayError::AccessDenied(_) => StatusCode::FORBIDDEN,
        GatewayError::ValidationRejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
        GatewayError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
        GatewayError::ModelNotFound(_) => StatusCode::NOT_FOUND,
        GatewayError::TransportFailure(_)
        | GatewayError::DecodeFailure(_)
        | GatewayError::EmptyResponse => StatusCode::BAD_GATEWAY,
    }
}

/// Build a JSON error response body from a gateway error
fn error_response(error: &GatewayError) -> Response {
    let body = json!({
        "error": {
            "kind": error.kind(),
            "message": error.to_string(),
        }
    });
    (status_for(error), Json(body)).into_response()
}

/// POST /v1/invoke - Buffered invocation
async fn invoke(
    State(state): State<AppState>,
    Json(request): Json<InvocationRequest>,
) -> Response {
    let request_id = uuid::Uuid::new_v4().to_string();
    info!(
        "Incoming invocation {}: model={:?}, messages={}",
        request_id,
        request.model,
        request.messages.len()
    );
    debug!("Full request payload: {:?}", request);

    match state.gateway.invoke(request).await {
        Ok(result) => {
            info!(
                "Invocation {} complete: {} input / {} output tokens, ${:.6}, {}ms",
                request_id,
                result.usage.input_tokens,
                result.usage.output_tokens,
                result.cost_usd,
                result.duration_millis
            );
            Json(result).into_response()
        }
        Err(e) => {
            error!("Invocation {} failed: {}", request_id, e);
            error_response(&e)
        }
    }
}

/// POST /v1/invoke/stream - Streaming invocation over SSE
///
/// Emits `delta` events as content arrives, one terminal `done` event
/// with the aggregated result, or an `error` event if the stream fails
/// after the response has started.
async fn invoke_stream(
    State(state): State<AppState>,
    Json(request): Json<InvocationRequest>,
) -> Response {
    let request_id = uuid::Uuid::new_v4().to_string();
    info!(
        "Incoming streaming invocation {}: model={:?}, messages={}",
        request_id,
        request.model,
        request.messages.len()
    );

    let event_stream = match state.gateway.invoke_stream(request).await {
        Ok(stream) => stream,
        Err(e) => {
            error!("Streaming invocation {} rejected: {}", request_id, e);
            return error_response(&e);
        }
    };

    let sse_stream = event_stream.map(move |item| {
        let event = match item {
            Ok(StreamEvent::Delta(text)) => axum::response::sse::Event::default()
                .event("delta")
                .data(json!({ "text": text }).to_string()),
            Ok(StreamEvent::Done(result)) => {
                info!(
                    "Streaming invocation {} complete: {} input / {} output tokens, ${:.6}",
                    request_id,
                    result.usage.input_tokens,
                    result.usage.output_tokens,
                    result.cost_usd
                );
                axum::response::sse::Event::default()
                    .event("done")
                    .data(json!(result).to_string())
            }
            Err(e) => {
                error!("Streaming invocation {} failed mid-stream: {}", request_id, e);
                axum::response::sse::Event::default().event("error").data(
                    json!({
                        "kind": e.kind(),
                        "message": e.to_string(),
                    })
                    .to_string(),
                )
            }
        };
        Ok::<_, Infallible>(event)
    });

    let mut response = Sse::new(sse_stream)
        .keep_alive(axum::response::sse::KeepAlive::default())
        .into_response();
    let headers = response.headers_mut();
    headers.insert("Cache-Control", "no-cache".parse().unwrap());
    headers.insert("Connection", "keep-alive".parse().unwrap());
    response
}

/// GET / - Root endpoint
async fn root(State(state): State<AppState>) -> impl IntoResponse {
    let models: Vec<_> = catalog::entries()
        .iter()
        .map(|entry| {
            json!({
                "id": entry.logical_id,
                "provider": entry.provider.name(),
                "streaming": entry.supports_streaming,
                "thinking": entry.supports_thinking,
            })
        })
        .collect();

    Json(json!({
        "message": "Model Invocation Gateway v1.0.0",
        "status": "running",
        "default_model": state
            .config
            .default_model
            .clone()
            .unwrap_or_else(|| catalog::default_model_id().to_string()),
        "models": models,
        "endpoints": {
            "invoke": "/v1/invoke",
            "invoke_stream": "/v1/invoke/stream",
            "health": "/health",
        },
    }))
}

/// GET /health - Health check endpoint
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "api_key_configured": !state.config.api_key.is_empty(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&GatewayError::InvalidRequest("bad".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&GatewayError::AccessDenied("no".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_for(&GatewayError::RateLimited("slow".to_string())),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            status_for(&GatewayError::ModelNotFound("gone".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(status_for(&GatewayError::EmptyResponse), StatusCode::BAD_GATEWAY);
        assert_eq!(
            status_for(&GatewayError::DecodeFailure("garbage".to_string())),
            StatusCode::BAD_GATEWAY
        );
    }
}
