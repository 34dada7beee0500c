//! Conversational RAG pipeline.
//!
//! A question is made standalone using the session's prior turns, grounded
//! with documents from Azure AI Search and answered by one chat completion.
//! Usage (tokens and USD cost) is returned together with the answer.

pub mod cfg;
pub mod chain;
pub mod error;
pub mod memory;
pub mod prompt;
pub mod retrieve;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use cfg::RagChainConfig;
pub use chain::RagChain;
pub use error::RagChainError;
pub use memory::{ConversationMemory, Turn};
pub use retrieve::{RetrievedDoc, SearchRetriever};

/// Token and cost accounting for one chat request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageMetadata {
    pub total_tokens: u64,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_cost_usd: f64,
    /// Completions that contributed to the totals.
    pub successful_requests: u32,
}

/// Answer text together with the usage that produced it.
#[derive(Clone, Debug, PartialEq)]
pub struct RagAnswer {
    pub answer: String,
    pub usage: UsageMetadata,
}

/// The pipeline as seen by the HTTP layer.
#[async_trait]
pub trait ChatPipeline: Send + Sync {
    /// Generates an answer and reports the usage of the same generation.
    async fn answer_with_usage(
        &self,
        question: &str,
        session_id: &str,
    ) -> Result<RagAnswer, RagChainError>;

    async fn answer(&self, question: &str, session_id: &str) -> Result<String, RagChainError> {
        Ok(self.answer_with_usage(question, session_id).await?.answer)
    }

    /// Drops the in-process history of `session_id`.
    async fn forget(&self, session_id: &str) -> bool;

    /// Drops in-process histories unused for longer than `max_idle`.
    /// Returns how many were dropped.
    async fn evict_idle(&self, _max_idle: Duration) -> usize {
        0
    }
}
