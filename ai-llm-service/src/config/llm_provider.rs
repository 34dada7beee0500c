/// Represents the provider (backend) that serves chat completions.
///
/// Both variants speak the OpenAI chat-completions wire format; they differ
/// in URL layout and in how the API key is sent.
///
/// # Examples
///
/// ```
/// use ai_llm_service::config::llm_provider::LlmProvider;
///
/// assert_eq!(LlmProvider::parse("azure"), Some(LlmProvider::AzureOpenAI));
/// assert_eq!(LlmProvider::parse("OpenAI"), Some(LlmProvider::OpenAI));
/// assert_eq!(LlmProvider::parse("ollama"), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LlmProvider {
    /// Azure OpenAI deployment:
    /// `{endpoint}/openai/deployments/{deployment}/chat/completions?api-version=...`,
    /// key sent in the `api-key` header.
    AzureOpenAI,
    /// Public OpenAI API: `{endpoint}/v1/chat/completions`, Bearer auth.
    OpenAI,
}

impl LlmProvider {
    /// Parses a provider name as found in `LLM_PROVIDER` (case-insensitive).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "azure" | "azure_openai" | "azure-openai" | "azureopenai" => Some(Self::AzureOpenAI),
            "openai" | "chatgpt" => Some(Self::OpenAI),
            _ => None,
        }
    }
}
