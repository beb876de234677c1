//! REST API route handlers.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::WebError;
use crate::state::{AppState, ToolSummary};

/// User identifier used when a request does not name one.
pub const DEFAULT_WEB_USER: &str = "web";

// ---------------------------------------------------------------------------
// POST /chat
// ---------------------------------------------------------------------------

/// Request payload for `/chat`.
#[derive(Debug, Deserialize)]
pub struct ChatBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Response payload for `/chat`.
#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub response: String,
}

/// Run one turn for the requesting user.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ChatBody>,
) -> Result<Json<ChatReply>, WebError> {
    if body.message.trim().is_empty() {
        return Err(WebError::BadRequest("message must not be empty".into()));
    }

    let user_id = body
        .user_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .unwrap_or(DEFAULT_WEB_USER);

    tracing::debug!(user_id, len = body.message.len(), "chat request");
    let response = state.pool.chat(user_id, &body.message).await?;
    Ok(Json(ChatReply { response }))
}

// ---------------------------------------------------------------------------
// GET /health
// ---------------------------------------------------------------------------

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

// ---------------------------------------------------------------------------
// GET /api/tools
// ---------------------------------------------------------------------------

/// Response payload for `/api/tools`.
#[derive(Debug, Serialize)]
pub struct ToolsResponse {
    pub count: usize,
    pub tools: Vec<ToolSummary>,
}

/// List the tools offered to the model.
pub async fn tools(State(state): State<Arc<AppState>>) -> Json<ToolsResponse> {
    Json(ToolsResponse {
        count: state.tools.len(),
        tools: state.tools.as_ref().clone(),
    })
}
