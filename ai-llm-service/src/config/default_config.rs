//! Chat model config resolved from environment variables.
//!
//! # Environment variables
//!
//! - `LLM_PROVIDER`                  = `azure` (default) or `openai`
//! - `AZURE_OPENAI_ENDPOINT`         = resource base URL (mandatory)
//! - `AZURE_OPENAI_API_KEY`          = key (mandatory)
//! - `AZURE_OPENAI_DEPLOYMENT_NAME`  = deployment / model (default `gpt-4o`)
//! - `AZURE_OPENAI_API_VERSION`      = Azure api-version (default `2024-02-01`)
//! - `LLM_MAX_TOKENS`                = optional max tokens (u32)
//! - `LLM_TEMPERATURE`               = sampling temperature (default 0.7)
//! - `LLM_TIMEOUT_SECS`              = request timeout (default 120)
//! - `LLM_PROMPT_COST_PER_1K` / `LLM_COMPLETION_COST_PER_1K` = price override (both or none)

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        AiLlmError, ConfigError, EnvLookup, must_var, opt_number, validate_http_endpoint,
        validate_range_f32, var_or,
    },
    pricing::ModelPricing,
};

pub const DEFAULT_DEPLOYMENT: &str = "gpt-4o";
pub const DEFAULT_API_VERSION: &str = "2024-02-01";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Builds the chat model config from the process environment.
pub fn config_azure_chat() -> Result<LlmModelConfig, AiLlmError> {
    config_chat_from(&|k| std::env::var(k).ok())
}

/// Builds the chat model config from an arbitrary lookup.
///
/// # Errors
/// - [`ConfigError::MissingVar`] for the endpoint or key
/// - [`ConfigError::UnsupportedProvider`] for an unknown `LLM_PROVIDER`
/// - [`ConfigError::InvalidNumber`] / [`ConfigError::OutOfRange`] for bad knobs
pub fn config_chat_from(lookup: EnvLookup<'_>) -> Result<LlmModelConfig, AiLlmError> {
    let provider_raw = var_or(lookup, "LLM_PROVIDER", "azure");
    let provider = LlmProvider::parse(&provider_raw)
        .ok_or_else(|| ConfigError::UnsupportedProvider(provider_raw.clone()))?;

    let endpoint = must_var(lookup, "AZURE_OPENAI_ENDPOINT")?;
    validate_http_endpoint("AZURE_OPENAI_ENDPOINT", &endpoint)?;
    let api_key = must_var(lookup, "AZURE_OPENAI_API_KEY")?;

    let model = var_or(lookup, "AZURE_OPENAI_DEPLOYMENT_NAME", DEFAULT_DEPLOYMENT);
    let api_version = var_or(lookup, "AZURE_OPENAI_API_VERSION", DEFAULT_API_VERSION);

    let max_tokens = opt_number::<u32>(lookup, "LLM_MAX_TOKENS", "expected u32")?;
    let temperature = opt_number::<f32>(lookup, "LLM_TEMPERATURE", "expected float")?
        .unwrap_or(DEFAULT_TEMPERATURE);
    validate_range_f32("temperature", temperature, 0.0, 2.0)?;
    let timeout_secs = opt_number::<u64>(lookup, "LLM_TIMEOUT_SECS", "expected u64")?
        .unwrap_or(DEFAULT_TIMEOUT_SECS);

    let prompt_price = opt_number::<f64>(lookup, "LLM_PROMPT_COST_PER_1K", "expected float")?;
    let completion_price =
        opt_number::<f64>(lookup, "LLM_COMPLETION_COST_PER_1K", "expected float")?;
    let pricing = match (prompt_price, completion_price) {
        (Some(p), Some(c)) => Some(ModelPricing {
            prompt_per_1k: p,
            completion_per_1k: c,
        }),
        (None, None) => None,
        _ => {
            return Err(ConfigError::MissingVar(
                "LLM_PROMPT_COST_PER_1K and LLM_COMPLETION_COST_PER_1K",
            )
            .into());
        }
    };

    Ok(LlmModelConfig {
        provider,
        model,
        endpoint,
        api_key: Some(api_key),
        api_version: Some(api_version),
        max_tokens,
        temperature: Some(temperature),
        top_p: None,
        timeout_secs: Some(timeout_secs),
        pricing,
    })
}
