//! Typed error for the rag-chain crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RagChainError {
    /// Chat-completion failures (rewrite or answer step).
    #[error("LLM error: {0}")]
    Llm(#[from] ai_llm_service::AiLlmError),

    /// HTTP/transport errors when calling the search service.
    #[error("search transport error: {0}")]
    SearchTransport(#[from] reqwest::Error),

    /// Search service answered with a non-success status.
    #[error("search returned HTTP {status}: {snippet}")]
    SearchStatus { status: u16, snippet: String },

    /// Search payload could not be decoded.
    #[error("search decode error: {0}")]
    SearchDecode(String),

    /// Invalid or missing configuration.
    #[error("config error: {0}")]
    Config(String),
}
