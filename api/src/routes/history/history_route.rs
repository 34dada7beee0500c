use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
};
use tracing::{debug, error, info};

use crate::{
    core::app_state::AppState,
    error_handler::{AppError, AppResult},
    routes::{
        history::history_response::{HistoryResponse, MessageResponse},
        request_id,
    },
};

fn no_history(session_id: &str) -> AppError {
    AppError::NotFound(format!("No history found for session {session_id}"))
}

/// Handler: GET /api/chat/history/{session_id}
pub async fn get_history_route(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(session_id): Path<String>,
) -> AppResult<Json<HistoryResponse>> {
    let request_id = request_id(&headers);

    let logs = state
        .store
        .query_by_session(&session_id)
        .await
        .map_err(|e| {
            error!(%request_id, %session_id, error = %e, "get_history_route: query failed");
            AppError::from(e)
        })?;

    if logs.is_empty() {
        debug!(%request_id, %session_id, "get_history_route: nothing stored");
        return Err(no_history(&session_id));
    }

    debug!(%request_id, %session_id, rows = logs.len(), "get_history_route: success");
    Ok(Json(HistoryResponse { session_id, logs }))
}

/// Handler: DELETE /api/chat/history/{session_id}
///
/// Also drops the session's in-process conversation memory.
pub async fn delete_history_route(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(session_id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let request_id = request_id(&headers);

    let deleted = state
        .store
        .delete_by_session(&session_id)
        .await
        .map_err(|e| {
            error!(%request_id, %session_id, error = %e, "delete_history_route: delete failed");
            AppError::from(e)
        })?;
    let forgot = state.pipeline.forget(&session_id).await;

    if deleted == 0 {
        debug!(%request_id, %session_id, forgot, "delete_history_route: nothing stored");
        return Err(no_history(&session_id));
    }

    info!(%request_id, %session_id, deleted, forgot, "delete_history_route: history removed");
    Ok(Json(MessageResponse {
        message: format!("History for session {session_id} deleted successfully"),
    }))
}
