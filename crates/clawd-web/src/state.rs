//! Shared application state for the web server.

use std::sync::Arc;

use clawd_agent::{AgentPool, ToolRegistry};
use serde::Serialize;

/// Name and description of one tool, as listed by `GET /api/tools`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolSummary {
    pub name: String,
    pub description: String,
}

impl ToolSummary {
    /// Summaries for every tool in `registry`, in registration order.
    pub fn from_registry(registry: &ToolRegistry) -> Vec<Self> {
        registry
            .descriptors()
            .iter()
            .map(|d| Self {
                name: d.function.name.clone(),
                description: d.function.description.clone(),
            })
            .collect()
    }
}

/// Shared state accessible from every Axum handler.
#[derive(Clone)]
pub struct AppState {
    /// One agent per user identifier.
    pub pool: Arc<AgentPool>,
    /// Tools offered to every agent.
    pub tools: Arc<Vec<ToolSummary>>,
}
