use std::sync::Arc;

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::{
    core::app_state::AppState,
    error_handler::{AppError, AppResult},
};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Handler: GET /health (chat service liveness)
pub async fn chat_health_route() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "chat-service",
        version: None,
        environment: None,
        timestamp: Utc::now(),
    })
}

/// Handler: GET /api/health
///
/// 503 when the database URL does not resolve to a backend. Settings loaded
/// from the environment fill a blank `DATABASE_URL` with the SQLite default,
/// so in practice this fires only for hand-built settings or a URL without
/// a file path. The database itself is not contacted.
pub async fn api_health_route(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<HealthResponse>> {
    if let Err(e) = state.settings.store.backend() {
        warn!(error = %e, "api_health_route: database configuration is incomplete");
        return Err(AppError::Unavailable(
            "database configuration is incomplete".into(),
        ));
    }

    Ok(Json(HealthResponse {
        status: "healthy",
        service: "ai-chatbot-backend",
        version: Some(state.settings.version),
        environment: Some(state.settings.environment.clone()),
        timestamp: Utc::now(),
    }))
}
