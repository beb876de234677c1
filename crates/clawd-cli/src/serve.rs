//! Subcommand: `clawd serve` -- HTTP chat API.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use clawd_agent::{AgentPool, ClawdConfig};
use clawd_web::api::DEFAULT_WEB_USER;
use clawd_web::{ToolSummary, WebConfig, WebServer};

use crate::helpers::{build_agent, build_backend, build_base_tools};

/// Serve the chat API on `bind:port` until interrupted.
pub async fn cmd_serve(config: ClawdConfig, bind: String, port: u16) -> Result<()> {
    let backend = build_backend(&config)?;
    let base_tools = build_base_tools(&config)?;

    let config = Arc::new(config);
    let pool = {
        let config = Arc::clone(&config);
        Arc::new(AgentPool::new(move |user_id| {
            build_agent(&config, &base_tools, Arc::clone(&backend), user_id)
        }))
    };

    // The default web user's agent also tells us the full tool list,
    // including the per-user memory tools.
    let tools = {
        let agent = pool
            .get_or_create(DEFAULT_WEB_USER)
            .context("failed to create the default web agent")?;
        let agent = agent.lock().await;
        ToolSummary::from_registry(agent.tools())
    };

    info!(
        memory_dir = %config.memory.dir.display(),
        tool_count = tools.len(),
        "chat API ready"
    );

    let server = WebServer::new(WebConfig { bind_addr: bind, port }, pool, tools);
    println!("  Clawd API listening on http://{}", server.addr());
    server.start().await.context("web server failed")?;
    Ok(())
}
