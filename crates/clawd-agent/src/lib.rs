//! Agent runtime for Clawd.
//!
//! Composes per-user memory ([`clawd_store`]), a tool registry and a
//! chat-completion backend into a single turn loop.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │ MemoryStore  │   │ ToolRegistry │   │ ChatBackend  │
//! │ (facts, log) │   │ (name->tool) │   │ (LlmClient)  │
//! └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!        └──────────────────┼──────────────────┘
//!                     ┌─────┴─────┐     ┌───────────────┐
//!                     │   Agent   │────>│ FactExtractor │
//!                     │ (chat())  │     └───────────────┘
//!                     └─────┬─────┘
//!                     ┌─────┴─────┐
//!                     │ AgentPool │  one agent per user id
//!                     └───────────┘
//! ```
//!
//! ## Modules
//!
//! - [`agent`] -- The turn loop.
//! - [`llm`] -- Wire types, the backend trait and the HTTP client.
//! - [`tools`] -- Tool handlers and the registry.
//! - [`extract`] -- Heuristic fact extraction.
//! - [`pool`] -- Per-user agents.
//! - [`config`] -- Layered TOML/environment configuration.
//! - [`prompt`] -- The system prompt template.
//! - [`error`] -- Agent error types.

pub mod agent;
pub mod config;
pub mod error;
pub mod extract;
pub mod llm;
pub mod pool;
pub mod prompt;
pub mod tools;

// Re-export the most commonly used types at the crate root.
pub use agent::{Agent, AgentConfig, SharedMemory};
pub use config::{AgentSection, ClawdConfig, LlmSection, MemorySection, ToolsSection};
pub use error::{AgentError, Result, ToolError};
pub use extract::{ExtractedFact, FactExtractor, HeuristicExtractor};
pub use llm::{
    ChatBackend, ChatRequest, LlmClient, LlmClientConfig, Message, ReplyMessage, Role, ToolCall,
    ToolDescriptor,
};
pub use pool::{AgentFactory, AgentPool};
pub use prompt::{DEFAULT_SYSTEM_PROMPT, render_system_prompt};
pub use tools::{AsyncFnTool, FnTool, ToolArgs, ToolHandler, ToolRegistry};
