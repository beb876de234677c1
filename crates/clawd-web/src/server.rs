//! Router composition and startup.

use std::sync::Arc;

use axum::Router;
use axum::http::Method;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use clawd_agent::AgentPool;

use crate::WebConfig;
use crate::api;
use crate::state::{AppState, ToolSummary};

/// The Clawd HTTP server.
pub struct WebServer {
    config: WebConfig,
    state: Arc<AppState>,
}

impl WebServer {
    /// Create a server over `pool`.  `tools` is what `/api/tools` reports.
    pub fn new(config: WebConfig, pool: Arc<AgentPool>, tools: Vec<ToolSummary>) -> Self {
        let state = Arc::new(AppState {
            pool,
            tools: Arc::new(tools),
        });
        Self { config, state }
    }

    /// Return the `host:port` string this server will bind to.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.config.bind_addr, self.config.port)
    }

    /// Build the router with all routes registered.
    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any);

        Router::new()
            .route("/chat", post(api::chat))
            .route("/health", get(api::health))
            .route("/api/tools", get(api::tools))
            .layer(cors)
            .with_state(Arc::clone(&self.state))
    }

    /// Bind the configured address and serve until shut down.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound or the server fails.
    pub async fn start(self) -> std::io::Result<()> {
        let listener = TcpListener::bind(self.addr()).await?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener.
    pub async fn serve(self, listener: TcpListener) -> std::io::Result<()> {
        let router = self.router();
        tracing::info!(addr = %listener.local_addr()?, "starting web server");
        axum::serve(listener, router).await
    }
}
