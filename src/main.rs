//! Model Invocation Gateway
//!
//! HTTP service that accepts uniform conversation requests, translates
//! them to each model provider's native payload format, invokes the
//! model service, and decodes the response with token usage and cost.

mod api;
mod conversion;
mod core;
mod models;

use crate::api::endpoints::{AppState, create_router};
use crate::core::catalog;
use crate::core::config::Config;
use crate::core::logging::init_logging;
use crate::core::orchestrator::Gateway;
use crate::core::transport::HttpTransport;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Check for --help flag
    if std::env::args().any(|arg| arg == "--help") {
        print_help();
        return;
    }

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => {
            eprintln!("Configuration Error: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    init_logging(&config.log_level);

    // Print startup banner
    print_startup_banner(&config);

    // Create transport and gateway
    let transport = Arc::new(HttpTransport::new(
        config.base_url.clone(),
        config.api_key.clone(),
        config.request_timeout,
    ));

    let mut gateway = Gateway::new(transport, config.attachment_text_limit);
    if let Some(ref default_model) = config.default_model {
        gateway = gateway.with_default_model(default_model);
    }

    // Create application state
    let app_state = AppState {
        config: config.clone(),
        gateway: Arc::new(gateway),
    };

    // Create router
    let app = create_router(app_state);

    // Bind to address
    let addr = format!("{}:{}", config.host, config.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    info!("Server listening on http://{}", addr);

    // Run server
    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Print startup banner with configuration
fn print_startup_banner(config: &Config) {
    println!("Model Invocation Gateway v1.0.0");
    println!("Configuration loaded successfully");
    println!("   Base URL: {}", config.base_url);
    println!(
        "   Default Model: {}",
        config
            .default_model
            .as_deref()
            .unwrap_or(catalog::default_model_id())
    );
    println!("   Known Models: {}", catalog::entries().len());
    println!("   Request Timeout: {}s", config.request_timeout);
    println!("   Attachment Text Limit: {} chars", config.attachment_text_limit);
    println!("   Server: {}:{}", config.host, config.port);
    println!();
}

/// Print help message
fn print_help() {
    println!("Model Invocation Gateway v1.0.0");
    println!();
    println!("Usage: model-gateway [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --help    Display this help message");
    println!();
    println!("Environment variables:");
    println!("  CONFIG_PATH - Path to the TOML configuration file (default: config.toml)");
    println!();
    println!("Configuration file sections:");
    println!("  [transport] base_url, api_key, request_timeout");
    println!("  [models]    default");
    println!("  [server]    host, port, log_level");
    println!("  [request]   attachment_text_limit");
}
