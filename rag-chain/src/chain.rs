//! Conversational retrieval chain.
//!
//! Flow for one question (all under the session's lock):
//! 1. rewrite the question against prior turns, skipped on the first turn
//! 2. retrieve supporting documents for the standalone question
//! 3. generate the grounded answer with one completion
//! 4. append the turn to the session history

use std::time::{Duration, Instant};

use ai_llm_service::{ChatCompletion, ChatMessage, LlmModelConfig, OpenAiService, pricing_for};
use async_trait::async_trait;
use tracing::{debug, info};

use crate::{
    ChatPipeline, RagAnswer, UsageMetadata,
    cfg::RagChainConfig,
    error::RagChainError,
    memory::{ConversationMemory, Turn},
    prompt::{build_answer_prompt, build_rewrite_messages},
    retrieve::SearchRetriever,
};

pub struct RagChain {
    llm: OpenAiService,
    retriever: SearchRetriever,
    memory: ConversationMemory,
}

impl RagChain {
    pub fn new(llm_cfg: LlmModelConfig, rag_cfg: &RagChainConfig) -> Result<Self, RagChainError> {
        Ok(Self {
            llm: OpenAiService::new(llm_cfg)?,
            retriever: SearchRetriever::new(rag_cfg)?,
            memory: ConversationMemory::new(rag_cfg.memory_max_turns),
        })
    }

    /// In-process conversation memory.
    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    fn tally(&self, usage: &mut UsageMetadata, c: &ChatCompletion) {
        let pricing = self
            .llm
            .config()
            .pricing
            .unwrap_or_else(|| pricing_for(&c.model));
        usage.prompt_tokens += c.usage.prompt_tokens;
        usage.completion_tokens += c.usage.completion_tokens;
        usage.total_tokens += c.usage.total_tokens;
        usage.total_cost_usd += pricing.cost(&c.usage);
        usage.successful_requests += 1;
    }
}

#[async_trait]
impl ChatPipeline for RagChain {
    async fn answer_with_usage(
        &self,
        question: &str,
        session_id: &str,
    ) -> Result<RagAnswer, RagChainError> {
        let started = Instant::now();
        let handle = self.memory.session(session_id).await;
        let mut history = handle.lock().await;
        let mut usage = UsageMetadata::default();

        let standalone = if history.is_empty() {
            question.trim().to_string()
        } else {
            let rewritten = self
                .llm
                .chat(&build_rewrite_messages(&history, question))
                .await?;
            self.tally(&mut usage, &rewritten);
            debug!(session_id, standalone = %rewritten.content, "question rewritten");
            rewritten.content.trim().to_string()
        };

        let docs = self.retriever.retrieve(&standalone).await?;
        let prompt = build_answer_prompt(&docs, question);
        let completion = self.llm.chat(&[ChatMessage::user(prompt)]).await?;
        self.tally(&mut usage, &completion);

        self.memory.record(
            &mut history,
            Turn {
                question: question.to_string(),
                answer: completion.content.clone(),
            },
        );

        info!(
            session_id,
            docs = docs.len(),
            turns = history.len(),
            total_tokens = usage.total_tokens,
            latency_ms = started.elapsed().as_millis(),
            "answer generated"
        );
        Ok(RagAnswer {
            answer: completion.content,
            usage,
        })
    }

    async fn forget(&self, session_id: &str) -> bool {
        self.memory.forget(session_id).await
    }

    async fn evict_idle(&self, max_idle: Duration) -> usize {
        self.memory.evict_idle(max_idle).await
    }
}
