//! Shared setup for the subcommands: tracing, config, tools and agents.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use clawd_adapters::{BuiltinOptions, register_builtin_tools, register_memory_tools};
use clawd_agent::{Agent, ChatBackend, ClawdConfig, LlmClient, ToolRegistry};
use clawd_store::MemoryStore;

// ---------------------------------------------------------------------------
// Tracing
// ---------------------------------------------------------------------------

/// Install the global subscriber.  `RUST_LOG` overrides `default_level`.
pub fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Load `.env`, then the layered config.
pub fn load_config(path: Option<&Path>) -> Result<ClawdConfig> {
    if let Ok(env_file) = dotenvy::dotenv() {
        info!(path = %env_file.display(), "loaded .env");
    }
    ClawdConfig::load(path).context("failed to load configuration")
}

// ---------------------------------------------------------------------------
// Runtime pieces
// ---------------------------------------------------------------------------

/// The HTTP backend described by `[llm]`.
pub fn build_backend(config: &ClawdConfig) -> Result<Arc<dyn ChatBackend>> {
    let client =
        LlmClient::new(config.llm_client_config()).context("failed to create LLM client")?;
    info!(
        url = %client.endpoint(),
        model = config.llm.model.as_deref().unwrap_or("(server default)"),
        "LLM client ready"
    );
    Ok(Arc::new(client))
}

/// The stateless built-in tools described by `[tools]`.
pub fn build_base_tools(config: &ClawdConfig) -> Result<ToolRegistry> {
    let root_dir = match &config.tools.root_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("failed to get current directory")?,
    };
    let options = BuiltinOptions {
        root_dir,
        enable_shell: config.tools.enable_shell,
        enable_web: config.tools.enable_web,
    };

    let mut registry = ToolRegistry::new();
    register_builtin_tools(&mut registry, &options).context("failed to register built-in tools")?;
    Ok(registry)
}

/// An agent for `user_id`: its own memory, the base tools plus memory tools
/// bound to that memory.
pub fn build_agent(
    config: &ClawdConfig,
    base_tools: &ToolRegistry,
    backend: Arc<dyn ChatBackend>,
    user_id: &str,
) -> clawd_agent::Result<Agent> {
    let memory =
        MemoryStore::open_with_limit(&config.memory.dir, user_id, config.memory.history_limit)?;
    let mut agent = Agent::new(memory, base_tools.clone(), backend, config.agent_config());
    let shared = Arc::clone(agent.memory());
    register_memory_tools(agent.tools_mut(), shared);
    Ok(agent)
}

/// Everything `chat` and `ask` need for a single user.
pub fn single_agent(config: &ClawdConfig, user_id: &str) -> Result<Agent> {
    let backend = build_backend(config)?;
    let tools = build_base_tools(config)?;
    build_agent(config, &tools, backend, user_id)
        .with_context(|| format!("failed to open memory for user `{user_id}`"))
}
