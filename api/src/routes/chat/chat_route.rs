//! POST /api/chat: answers a question and logs the interaction.

use std::{sync::Arc, time::Instant};

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::HeaderMap,
};
use chat_log_store::{NewInteractionLog, retention::DEFAULT_MAX_AGE_HOURS};
use chrono::Utc;
use rag_chain::RagAnswer;
use tracing::{debug, error, info};

use crate::{
    core::{app_state::AppState, background::spawn_retention_sweep},
    error_handler::{AppError, AppResult},
    routes::{
        chat::chat_request::{ChatRequest, ChatResponse},
        request_id,
    },
};

/// Handler: POST /api/chat
///
/// One pipeline call yields both the answer and its usage; the row is
/// written before the response and a retention sweep is spawned without
/// being awaited.
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:8000/api/chat \
///   -H 'content-type: application/json' \
///   -d '{"session_id":"abc","user_question":"¿Cómo gestiono mi inventario?"}'
/// ```
pub async fn chat_route(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> AppResult<Json<ChatResponse>> {
    let Json(body) = payload?;
    let request_id = request_id(&headers);

    if body.session_id.trim().is_empty() {
        return Err(AppError::BadRequest("session_id must not be empty".into()));
    }
    if body.user_question.trim().is_empty() {
        return Err(AppError::BadRequest("user_question must not be empty".into()));
    }

    debug!(%request_id, session_id = %body.session_id, "chat_route: start");
    let started = Instant::now();

    let RagAnswer { answer, usage } = state
        .pipeline
        .answer_with_usage(&body.user_question, &body.session_id)
        .await
        .map_err(|e| {
            error!(%request_id, session_id = %body.session_id, error = %e, "chat_route: pipeline failed");
            AppError::from(e)
        })?;

    let saved = state
        .store
        .insert(NewInteractionLog {
            session_id: body.session_id,
            total_tokens: token_count(usage.total_tokens),
            prompt_tokens: token_count(usage.prompt_tokens),
            completion_tokens: token_count(usage.completion_tokens),
            total_cost_usd: usage.total_cost_usd,
            user_question: body.user_question,
            llm_answer: answer,
            date_processed: Utc::now(),
        })
        .await
        .map_err(|e| {
            error!(%request_id, error = %e, "chat_route: log insert failed");
            AppError::from(e)
        })?;

    spawn_retention_sweep(
        Arc::clone(&state.store),
        Arc::clone(&state.pipeline),
        DEFAULT_MAX_AGE_HOURS,
    );

    info!(
        %request_id,
        session_id = %saved.session_id,
        log_id = %saved.id,
        total_tokens = saved.total_tokens,
        latency_ms = started.elapsed().as_millis(),
        "chat_route: answered"
    );

    Ok(Json(ChatResponse {
        llm_answer: saved.llm_answer,
    }))
}

/// Token counts are stored as signed integers; larger values saturate.
fn token_count(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}
