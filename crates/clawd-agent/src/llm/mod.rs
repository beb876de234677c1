//! LLM integration layer.
//!
//! - [`types`] -- Messages, tool descriptors, requests and replies.
//! - [`backend`] -- The [`ChatBackend`] trait the turn loop talks to.
//! - [`client`] -- HTTP client for OpenAI-compatible endpoints.

pub mod backend;
pub mod client;
pub mod types;

// Re-export the most commonly used types for convenience.
pub use backend::ChatBackend;
pub use client::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT, LlmClient, LlmClientConfig, parse_reply};
pub use types::{ChatRequest, FunctionSpec, Message, ReplyMessage, Role, ToolCall, ToolDescriptor};
