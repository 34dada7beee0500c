use chat_log_store::InteractionLog;
use serde::Serialize;

/// Response body for `GET /api/chat/history/{session_id}`.
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub session_id: String,
    /// Stored rows of the session, in no particular order.
    pub logs: Vec<InteractionLog>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}
