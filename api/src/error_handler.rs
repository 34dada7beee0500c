use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chat_log_store::StorageError;
use rag_chain::RagChainError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::core::settings::SettingsError;

/// Public application error type.
///
/// Upstream and storage variants keep their source for the server log; the
/// client only ever sees a fixed message for them.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / config ---
    #[error(transparent)]
    Config(#[from] SettingsError),

    #[error("failed to open log store")]
    StoreInit(#[source] StorageError),

    #[error("failed to build RAG pipeline")]
    PipelineInit(#[source] RagChainError),

    // --- IO / network / server ---
    #[error("failed to bind listener")]
    Bind(#[source] std::io::Error),

    #[error("server error")]
    Server(#[source] std::io::Error),

    // --- Request / routing ---
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("the assistant could not answer right now, please try again later")]
    Upstream(#[source] RagChainError),

    #[error("the request could not be completed because of a storage failure")]
    Storage(#[source] StorageError),

    #[error("{0}")]
    Unavailable(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,

            // startup-only
            AppError::Config(_) | AppError::StoreInit(_) | AppError::PipelineInit(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }

            AppError::Upstream(_)
            | AppError::Storage(_)
            | AppError::Bind(_)
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::StoreInit(_) => "STORE_INIT_ERROR",
            AppError::PipelineInit(_) => "PIPELINE_INIT_ERROR",
            AppError::Bind(_) => "BIND_ERROR",
            AppError::Server(_) => "SERVER_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Upstream(_) => "UPSTREAM_ERROR",
            AppError::Storage(_) => "STORAGE_ERROR",
            AppError::Unavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }
}

#[derive(Serialize)]
pub(crate) struct ErrorBody<'a> {
    pub error: &'a str,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            let detail = std::error::Error::source(&self)
                .map(ToString::to_string)
                .unwrap_or_default();
            error!(code = self.error_code(), %detail, "request failed");
        }
        let body = ErrorBody {
            error: self.error_code(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;

impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(err: axum::extract::rejection::JsonRejection) -> Self {
        AppError::BadRequest(err.body_text())
    }
}

impl From<axum::extract::rejection::QueryRejection> for AppError {
    fn from(err: axum::extract::rejection::QueryRejection) -> Self {
        AppError::BadRequest(err.body_text())
    }
}

impl From<RagChainError> for AppError {
    fn from(err: RagChainError) -> Self {
        AppError::Upstream(err)
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        AppError::Storage(err)
    }
}
