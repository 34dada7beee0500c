use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use chat_log_store::retention::{self, DEFAULT_MAX_AGE_HOURS};
use serde::Deserialize;
use tracing::{error, info};

use crate::{
    core::app_state::AppState,
    error_handler::{AppError, AppResult},
    routes::history::history_response::MessageResponse,
};

#[derive(Debug, Deserialize)]
pub struct CleanupParams {
    /// Rows older than this many hours are deleted.
    #[serde(default = "default_max_age")]
    pub max_age_hours: u32,
}

fn default_max_age() -> u32 {
    DEFAULT_MAX_AGE_HOURS
}

/// Handler: POST /api/chat/cleanup?max_age_hours=N
///
/// Runs the retention sweep inline; succeeds even when nothing was deleted.
pub async fn cleanup_route(
    State(state): State<Arc<AppState>>,
    params: Result<Query<CleanupParams>, QueryRejection>,
) -> AppResult<Json<MessageResponse>> {
    let Query(CleanupParams { max_age_hours }) = params?;

    let deleted = retention::sweep(state.store.as_ref(), max_age_hours)
        .await
        .map_err(|e| {
            error!(max_age_hours, error = %e, "cleanup_route: sweep failed");
            AppError::from(e)
        })?;

    info!(max_age_hours, deleted, "cleanup_route: done");
    Ok(Json(MessageResponse {
        message: format!("Conversations older than {max_age_hours} hours deleted successfully"),
    }))
}
