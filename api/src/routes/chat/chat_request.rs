use serde::{Deserialize, Serialize};

/// Request body for `POST /api/chat`.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Caller-chosen conversation id.
    pub session_id: String,
    pub user_question: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub llm_answer: String,
}
