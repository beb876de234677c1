//! HTTP error mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use clawd_agent::AgentError;
use clawd_store::StoreError;

/// Errors a handler can return.  Rendered as `{"error": "..."}`.
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    /// The request is unusable as sent.
    #[error("{0}")]
    BadRequest(String),

    /// The agent failed (storage, invalid user identifier).
    #[error(transparent)]
    Agent(#[from] AgentError),
}

impl WebError {
    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Agent(AgentError::Store(StoreError::InvalidArgument(_))) => {
                StatusCode::BAD_REQUEST
            }
            Self::Agent(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
