//! The seam between the turn loop and the model endpoint.

use async_trait::async_trait;

use crate::llm::types::{ChatRequest, ReplyMessage};

/// One blocking (from the caller's view) request/response exchange with a
/// language model.
///
/// Implementations never fail: transport errors, timeouts and bad statuses
/// are reported as a reply whose content starts with `Error: `, so the turn
/// loop has a single code path.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send `request` and return the first choice's message.
    async fn complete(&self, request: &ChatRequest) -> ReplyMessage;
}
