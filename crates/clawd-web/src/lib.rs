//! HTTP chat API for Clawd.
//!
//! - `POST /chat` -- `{message, user_id?}` -> `{response}`.
//! - `GET /health` -- liveness.
//! - `GET /api/tools` -- the tools offered to the model.
//!
//! Every user identifier gets its own agent from the shared
//! [`clawd_agent::AgentPool`].

pub mod api;
pub mod error;
pub mod server;
pub mod state;

pub use error::WebError;
pub use server::WebServer;
pub use state::{AppState, ToolSummary};

/// Web server configuration.
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// The address to bind the HTTP server to.
    pub bind_addr: String,
    /// The port to listen on.
    pub port: u16,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".into(),
            port: 8080,
        }
    }
}
