//! Adapter error types.
//!
//! Built-in tools fail through [`AdapterError`]; the conversion into
//! [`ToolError`] is what the agent renders as `Tool error: <message>`.

use clawd_agent::ToolError;

/// Unified error type for the built-in tools.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// An I/O operation failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The parameters supplied to a tool are unusable.
    #[error("invalid parameters for tool `{tool_name}`: {reason}")]
    InvalidParams { tool_name: String, reason: String },

    /// A tool invocation failed.
    #[error("execution failed for tool `{tool_name}`: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    /// An outbound HTTP request failed.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The shared memory store rejected an operation.
    #[error("memory error: {0}")]
    Store(#[from] clawd_store::StoreError),

    /// Adapter setup failed.
    #[error("configuration error: {0}")]
    ConfigError(String),
}

/// Convenience alias used throughout the adapters crate.
pub type Result<T> = std::result::Result<T, AdapterError>;

impl From<AdapterError> for ToolError {
    fn from(err: AdapterError) -> Self {
        match err {
            AdapterError::InvalidParams { tool_name, reason } => ToolError::InvalidArgument {
                name: tool_name,
                reason,
            },
            other => ToolError::failed(other.to_string()),
        }
    }
}
