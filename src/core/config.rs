//! Application configuration management
//!
//! Configuration is loaded from a TOML file and validated at startup so
//! the process fails fast when misconfigured.

use crate::core::catalog;
use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Default server port
const DEFAULT_PORT: u16 = 8088;

/// Default request timeout in seconds
const DEFAULT_REQUEST_TIMEOUT: u64 = 90;

/// Default character limit for non-image attachments flattened into
/// prompt text
const DEFAULT_ATTACHMENT_TEXT_LIMIT: usize = 50_000;

#[derive(Debug, Clone, Deserialize)]
pub struct TransportConfig {
    pub base_url: String,
    pub api_key: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RequestConfig {
    #[serde(default = "default_attachment_text_limit")]
    pub attachment_text_limit: usize,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            attachment_text_limit: default_attachment_text_limit(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelsConfig {
    /// Logical id substituted for absent/unknown model ids; must exist
    /// in the catalog. Falls back to the built-in default when unset.
    #[serde(default)]
    pub default: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT
}

fn default_attachment_text_limit() -> usize {
    DEFAULT_ATTACHMENT_TEXT_LIMIT
}

#[derive(Debug, Clone, Deserialize)]
struct TomlConfig {
    transport: TransportConfig,
    #[serde(default)]
    models: ModelsConfig,
    #[serde(default)]
    server: ServerConfig,
    #[serde(default)]
    request: RequestConfig,
}

/// Validated application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Model-invocation service base URL
    pub base_url: String,

    /// Bearer token for the model-invocation service
    pub api_key: String,

    /// Transport request timeout in seconds
    pub request_timeout: u64,

    /// Server bind host
    pub host: String,

    /// Server bind port
    pub port: u16,

    /// Logging level
    pub log_level: String,

    /// Character limit for flattened non-image attachments
    pub attachment_text_limit: usize,

    /// Optional default-model override
    pub default_model: Option<String>,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, required
    /// values are missing, or the default-model override is not in the
    /// catalog.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read configuration file")?;
        let parsed: TomlConfig =
            toml::from_str(&content).context("Failed to parse TOML configuration")?;

        if parsed.transport.api_key.trim().is_empty() {
            bail!("transport.api_key must not be empty");
        }
        if parsed.transport.base_url.trim().is_empty() {
            bail!("transport.base_url must not be empty");
        }
        if let Some(ref default_model) = parsed.models.default {
            if !catalog::is_valid(default_model) {
                bail!(
                    "models.default '{}' is not a known logical model id",
                    default_model
                );
            }
        }

        Ok(Config {
            base_url: parsed.transport.base_url.trim_end_matches('/').to_string(),
            api_key: parsed.transport.api_key,
            request_timeout: parsed.transport.request_timeout,
            host: parsed.server.host,
            port: parsed.server.port,
            log_level: parsed.server.log_level,
            attachment_text_limit: parsed.request.attachment_text_limit,
            default_model: parsed.models.default,
        })
    }

    /// Load configuration from `CONFIG_PATH`, defaulting to `config.toml`
    pub fn from_env() -> Result<Self> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        Self::from_file(config_path)
    }
}
