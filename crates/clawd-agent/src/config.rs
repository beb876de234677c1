//! Layered configuration.
//!
//! Built-in defaults, then an optional TOML file, then `CLAWD_*` environment
//! variables.  A missing file is not an error; a malformed one is.
//!
//! ```toml
//! [llm]
//! base_url = "http://localhost:8000/v1"
//! model = "glm-4-flash"
//! temperature = 0.7
//!
//! [memory]
//! dir = "data/memory"
//! history_limit = 100
//!
//! [agent]
//! context_window = 6
//!
//! [tools]
//! enable_shell = false
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::agent::AgentConfig;
use crate::error::{AgentError, Result};
use crate::llm::{DEFAULT_BASE_URL, LlmClientConfig};
use crate::prompt::{DEFAULT_SYSTEM_PROMPT, MEMORY_CONTEXT_PLACEHOLDER};

/// Default config file location, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/clawd.toml";

/// Environment variable overriding `llm.base_url`.
pub const ENV_LLM_URL: &str = "CLAWD_LLM_URL";
/// Environment variable overriding `llm.model`.
pub const ENV_MODEL: &str = "CLAWD_MODEL";
/// Environment variable overriding `llm.api_key`.
pub const ENV_API_KEY: &str = "CLAWD_API_KEY";
/// Environment variable overriding `memory.dir`.
pub const ENV_MEMORY_DIR: &str = "CLAWD_MEMORY_DIR";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClawdConfig {
    pub llm: LlmSection,
    pub memory: MemorySection,
    pub agent: AgentSection,
    pub tools: ToolsSection,
}

/// `[llm]`: the chat-completion endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    pub base_url: String,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            model: None,
            api_key: None,
            temperature: 0.7,
            max_tokens: 1000,
            timeout_secs: 120,
        }
    }
}

/// `[memory]`: where per-user memory lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemorySection {
    pub dir: PathBuf,
    pub history_limit: usize,
}

impl Default for MemorySection {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data/memory"),
            history_limit: clawd_store::DEFAULT_HISTORY_LIMIT,
        }
    }
}

/// `[agent]`: turn shaping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSection {
    /// History entries sent to the model per request.
    pub context_window: usize,
    /// Must contain `{memory_context}`.
    pub system_prompt: String,
    /// Reply used when the model produced no text at all.
    pub fallback_reply: String,
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            context_window: 6,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_owned(),
            fallback_reply: "I couldn't generate a response.".to_owned(),
        }
    }
}

/// `[tools]`: built-in tool switches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsSection {
    /// Root for the file tools; the working directory when unset.
    pub root_dir: Option<PathBuf>,
    pub enable_shell: bool,
    pub enable_web: bool,
}

impl Default for ToolsSection {
    fn default() -> Self {
        Self {
            root_dir: None,
            enable_shell: true,
            enable_web: true,
        }
    }
}

impl ClawdConfig {
    /// Load from `path` (or [`DEFAULT_CONFIG_PATH`]), apply environment
    /// overrides and validate.
    ///
    /// # Errors
    ///
    /// [`AgentError::ConfigError`] when the file exists but cannot be read or
    /// parsed, or when the result fails validation.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));

        let mut config = match std::fs::read_to_string(path) {
            Ok(content) => {
                let config = Self::from_toml_str(&content)?;
                info!(path = %path.display(), "configuration loaded from file");
                config
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "configuration file does not exist, using defaults");
                Self::default()
            }
            Err(e) => {
                return Err(AgentError::ConfigError {
                    reason: format!("failed to read {}: {e}", path.display()),
                });
            }
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document.  Missing keys take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| AgentError::ConfigError {
            reason: format!("failed to parse TOML config: {e}"),
        })
    }

    /// Apply `CLAWD_*` overrides.  `lookup` abstracts the environment so
    /// tests do not have to mutate process state.  Empty values are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_LLM_URL) {
            self.llm.base_url = url;
        }
        if let Some(model) = get(ENV_MODEL) {
            self.llm.model = Some(model);
        }
        if let Some(key) = get(ENV_API_KEY) {
            self.llm.api_key = Some(key);
        }
        if let Some(dir) = get(ENV_MEMORY_DIR) {
            self.memory.dir = PathBuf::from(dir);
        }
    }

    /// Reject values the runtime cannot work with.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| {
            Err(AgentError::ConfigError {
                reason: reason.to_owned(),
            })
        };

        if self.agent.context_window == 0 {
            return invalid("agent.context_window must be at least 1");
        }
        if self.memory.history_limit == 0 {
            return invalid("memory.history_limit must be at least 1");
        }
        if !self.agent.system_prompt.contains(MEMORY_CONTEXT_PLACEHOLDER) {
            return invalid("agent.system_prompt must contain {memory_context}");
        }
        if self.agent.fallback_reply.trim().is_empty() {
            return invalid("agent.fallback_reply must not be empty");
        }
        if self.llm.base_url.trim().is_empty() {
            return invalid("llm.base_url must not be empty");
        }
        Ok(())
    }

    /// Settings for [`crate::llm::LlmClient`].
    pub fn llm_client_config(&self) -> LlmClientConfig {
        LlmClientConfig {
            base_url: self.llm.base_url.clone(),
            api_key: self.llm.api_key.clone(),
            model: self.llm.model.clone(),
            timeout: Duration::from_secs(self.llm.timeout_secs),
        }
    }

    /// Settings for [`crate::agent::Agent`].
    pub fn agent_config(&self) -> AgentConfig {
        AgentConfig {
            context_window: self.agent.context_window,
            temperature: self.llm.temperature,
            max_tokens: self.llm.max_tokens,
            system_prompt: self.agent.system_prompt.clone(),
            fallback_reply: self.agent.fallback_reply.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
