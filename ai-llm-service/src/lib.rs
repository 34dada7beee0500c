//! Shared chat-completion service used by the RAG pipeline.
//!
//! - [`services::open_ai_service::OpenAiService`] talks to Azure OpenAI or OpenAI.
//! - [`pricing`] turns token usage into a USD estimate.
//! - [`config`] resolves the model config from the environment.

pub mod config;
pub mod error_handler;
pub mod pricing;
pub mod services;

pub use config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider};
pub use error_handler::AiLlmError;
pub use pricing::{ModelPricing, TokenUsage, pricing_for};
pub use services::open_ai_service::{ChatCompletion, ChatMessage, ChatRole, OpenAiService};
