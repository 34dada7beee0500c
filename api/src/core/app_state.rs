use std::sync::Arc;

use chat_log_store::{LogStore, open_store};
use rag_chain::{ChatPipeline, RagChain};

use crate::{core::settings::AppSettings, error_handler::AppError};

/// Shared state for all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<AppSettings>,
    /// Question answering with per-session memory.
    pub pipeline: Arc<dyn ChatPipeline>,
    /// Interaction log table.
    pub store: Arc<dyn LogStore>,
}

impl AppState {
    pub fn new(
        settings: Arc<AppSettings>,
        pipeline: Arc<dyn ChatPipeline>,
        store: Arc<dyn LogStore>,
    ) -> Self {
        Self {
            settings,
            pipeline,
            store,
        }
    }

    /// Wires the production pipeline and store from `settings` and makes
    /// sure the log table exists.
    pub async fn from_settings(settings: Arc<AppSettings>) -> Result<Self, AppError> {
        let store = open_store(&settings.store).map_err(AppError::StoreInit)?;
        store.initialize().await.map_err(AppError::StoreInit)?;

        let pipeline = RagChain::new(settings.llm.clone(), &settings.rag)
            .map_err(AppError::PipelineInit)?;

        Ok(Self::new(settings, Arc::new(pipeline), store))
    }
}
