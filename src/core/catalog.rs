//! Provider catalog
//!
//! Static registry mapping logical model ids to provider family,
//! wire-level model id, capability flags, and per-1000-token pricing.
//! The table is fixed at compile time, never mutated at runtime, and
//! safe for concurrent reads from any number of in-flight invocations.

/// Provider families with an encoder/decoder pair
///
/// Dispatch over this enum is always an exhaustive match; adding a
/// variant forces every call site to handle it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Anthropic,
    Meta,
    DeepSeek,
}

impl Provider {
    pub fn name(self) -> &'static str {
        match self {
            Provider::Anthropic => "anthropic",
            Provider::Meta => "meta",
            Provider::DeepSeek => "deepseek",
        }
    }
}

/// One catalog entry for a logical model id
#[derive(Debug, Clone)]
pub struct ModelCatalogEntry {
    pub logical_id: &'static str,
    pub provider: Provider,
    pub wire_model_id: &'static str,
    pub max_tokens: u32,
    pub supports_streaming: bool,
    pub supports_thinking: bool,
    /// USD per 1000 input tokens
    pub input_price_per_1k: f64,
    /// USD per 1000 output tokens
    pub output_price_per_1k: f64,
}

const DEFAULT_MODEL_ID: &str = "claude-sonnet";

static CATALOG: &[ModelCatalogEntry] = &[
    ModelCatalogEntry {
        logical_id: "claude-sonnet",
        provider: Provider::Anthropic,
        wire_model_id: "anthropic.claude-3-7-sonnet-20250219-v1:0",
        max_tokens: 8192,
        supports_streaming: false,
        supports_thinking: true,
        input_price_per_1k: 0.003,
        output_price_per_1k: 0.015,
    },
    ModelCatalogEntry {
        logical_id: "claude-haiku",
        provider: Provider::Anthropic,
        wire_model_id: "anthropic.claude-3-5-haiku-20241022-v1:0",
        max_tokens: 4096,
        supports_streaming: false,
        supports_thinking: false,
        input_price_per_1k: 0.0008,
        output_price_per_1k: 0.004,
    },
    ModelCatalogEntry {
        logical_id: "llama3-70b",
        provider: Provider::Meta,
        wire_model_id: "meta.llama3-70b-instruct-v1:0",
        max_tokens: 4096,
        supports_streaming: true,
        supports_thinking: false,
        input_price_per_1k: 0.00265,
        output_price_per_1k: 0.0035,
    },
    ModelCatalogEntry {
        logical_id: "llama3-8b",
        provider: Provider::Meta,
        wire_model_id: "meta.llama3-8b-instruct-v1:0",
        max_tokens: 4096,
        supports_streaming: true,
        supports_thinking: false,
        input_price_per_1k: 0.0003,
        output_price_per_1k: 0.0006,
    },
    ModelCatalogEntry {
        logical_id: "deepseek-r1",
        provider: Provider::DeepSeek,
        wire_model_id: "us.deepseek.r1-v1:0",
        max_tokens: 8192,
        supports_streaming: true,
        supports_thinking: true,
        input_price_per_1k: 0.00135,
        output_price_per_1k: 0.0054,
    },
];

/// Look up a catalog entry by logical model id
pub fn resolve(logical_id: &str) -> Option<&'static ModelCatalogEntry> {
    CATALOG.iter().find(|entry| entry.logical_id == logical_id)
}

/// Whether a logical model id exists in the catalog
pub fn is_valid(logical_id: &str) -> bool {
    resolve(logical_id).is_some()
}

/// Logical id used when the caller omits a model
pub fn default_model_id() -> &'static str {
    DEFAULT_MODEL_ID
}

/// Catalog entry for the default model
pub fn default_entry() -> &'static ModelCatalogEntry {
    resolve(DEFAULT_MODEL_ID).expect("default model id must exist in the catalog")
}

/// All catalog entries, for status reporting
pub fn entries() -> &'static [ModelCatalogEntry] {
    CATALOG
}
