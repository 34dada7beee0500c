use std::sync::Arc;

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::error;

use crate::{
    core::app_state::AppState,
    error_handler::{AppError, AppResult},
};

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    /// Distinct session ids present in the log table.
    pub active_sessions: u64,
    pub service_status: &'static str,
    pub timestamp: DateTime<Utc>,
}

/// Handler: GET /api/chat/stats
pub async fn stats_route(State(state): State<Arc<AppState>>) -> AppResult<Json<StatsResponse>> {
    let active_sessions = state.store.count_distinct_sessions().await.map_err(|e| {
        error!(error = %e, "stats_route: count failed");
        AppError::from(e)
    })?;

    Ok(Json(StatsResponse {
        active_sessions,
        service_status: "healthy",
        timestamp: Utc::now(),
    }))
}
