//! HTTP façade of the chatbot backend.
//!
//! Routes (all JSON):
//! - `POST   /api/chat`
//! - `GET    /api/chat/history/{session_id}`
//! - `DELETE /api/chat/history/{session_id}`
//! - `GET    /api/chat/stats`
//! - `POST   /api/chat/cleanup?max_age_hours=N`
//! - `GET    /health`, `GET /api/health`, `GET /`

pub mod core;
pub mod error_handler;
pub mod middleware_layer;
pub mod routes;

use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post},
};
use tokio::signal;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::{
    core::{app_state::AppState, settings::AppSettings},
    error_handler::AppError,
    middleware_layer::json_extractor::json_error_mapper,
    routes::{
        chat::chat_route::chat_route,
        health::{
            health_route::{api_health_route, chat_health_route},
            root_route::root_route,
        },
        history::history_route::{delete_history_route, get_history_route},
        maintenance::{cleanup_route::cleanup_route, stats_route::stats_route},
    },
};

/// Builds the application router over `state`.
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.settings.cors_origins);

    Router::new()
        .route("/", get(root_route))
        .route("/health", get(chat_health_route))
        .route("/api/health", get(api_health_route))
        .route("/api/chat", post(chat_route))
        .route(
            "/api/chat/history/{session_id}",
            get(get_history_route).delete(delete_history_route),
        )
        .route("/api/chat/stats", get(stats_route))
        .route("/api/chat/cleanup", post(cleanup_route))
        .layer(middleware::from_fn(json_error_mapper))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::mirror_request()
    } else {
        let list: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(v) => Some(v),
                Err(_) => {
                    warn!(origin = %o, "ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(list)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// Wires the production state and serves until Ctrl+C.
pub async fn start(settings: AppSettings) -> Result<(), AppError> {
    let settings = Arc::new(settings);
    let state = AppState::from_settings(Arc::clone(&settings)).await?;
    info!(
        app = %settings.app_name,
        environment = %settings.environment,
        store = state.store.backend_name(),
        model = %settings.llm.model,
        index = %settings.rag.index_name,
        "application state ready"
    );

    let addr = settings.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(AppError::Bind)?;
    info!(%addr, "listening");

    // Start server with graceful shutdown on Ctrl+C
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    info!("server stopped");
    Ok(())
}

/// Returns a future that resolves when Ctrl+C is pressed
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
