use crate::{config::llm_provider::LlmProvider, pricing::ModelPricing};

/// Configuration for a chat model invocation.
///
/// # Fields
///
/// - `provider`: which backend serves the completions (Azure OpenAI or OpenAI).
/// - `model`: the deployment name on Azure, the model id on OpenAI (e.g. `"gpt-4o"`).
/// - `endpoint`: base URL of the resource (e.g. `https://my-res.openai.azure.com`).
/// - `api_key`: key used for authentication.
/// - `api_version`: Azure `api-version` query parameter (ignored by OpenAI).
/// - `max_tokens`: maximum number of tokens to generate (if supported).
/// - `temperature`: controls randomness (0.0 = deterministic).
/// - `top_p`: nucleus sampling cutoff.
/// - `timeout_secs`: optional request timeout in seconds.
/// - `pricing`: explicit per-1K-token prices; when `None` the built-in table is used.
///
/// # Examples
///
/// ```
/// use ai_llm_service::config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider};
///
/// let cfg = LlmModelConfig {
///     provider: LlmProvider::AzureOpenAI,
///     model: "gpt-4o".to_string(),
///     endpoint: "https://my-res.openai.azure.com".to_string(),
///     api_key: Some("secret".to_string()),
///     api_version: Some("2024-02-01".to_string()),
///     max_tokens: None,
///     temperature: Some(0.7),
///     top_p: None,
///     timeout_secs: Some(120),
///     pricing: None,
/// };
/// assert_eq!(cfg.model, "gpt-4o");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LlmModelConfig {
    /// The provider/backend.
    pub provider: LlmProvider,

    /// Deployment (Azure) or model (OpenAI) identifier.
    pub model: String,

    /// Base URL of the inference resource.
    pub endpoint: String,

    /// API key for authentication.
    pub api_key: Option<String>,

    /// Azure `api-version`.
    pub api_version: Option<String>,

    /// Maximum number of tokens to generate.
    pub max_tokens: Option<u32>,

    /// Sampling temperature.
    pub temperature: Option<f32>,

    /// Nucleus sampling parameter.
    pub top_p: Option<f32>,

    /// Optional request timeout (in seconds).
    pub timeout_secs: Option<u64>,

    /// Price override used for cost estimates.
    pub pricing: Option<ModelPricing>,
}
