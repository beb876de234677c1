//! Agent error types.
//!
//! All agent subsystems surface errors through [`AgentError`].  Tool handlers
//! report failures through the narrower [`ToolError`], which the turn loop
//! renders into the tool result text instead of propagating.

/// Unified error type for the agent runtime.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    // -- LLM errors ----------------------------------------------------------
    /// An HTTP request to the model endpoint failed or returned a non-success
    /// status.
    #[error("llm request failed: {reason}")]
    LlmRequestFailed { reason: String },

    /// The model endpoint answered with a non-success HTTP status.
    #[error("llm endpoint returned {status}: {body}")]
    LlmStatus { status: u16, body: String },

    /// The model response could not be parsed into the expected format.
    #[error("llm response parse error: {reason}")]
    LlmParseFailed { reason: String },

    // -- Configuration errors ------------------------------------------------
    /// Configuration validation or loading failed.
    #[error("config error: {reason}")]
    ConfigError { reason: String },

    // -- Storage -------------------------------------------------------------
    /// Persisting or loading memory failed.  Never masked.
    #[error("memory store error: {0}")]
    Store(#[from] clawd_store::StoreError),

    // -- Serialization -------------------------------------------------------
    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout the agent crate.
pub type Result<T> = std::result::Result<T, AgentError>;

/// Failure reported by a tool handler.
///
/// The display form is what the model sees after the `Tool error: ` prefix,
/// so messages are written for a reader, not for a log.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// A required argument was not supplied.
    #[error("missing required argument `{0}`")]
    MissingArgument(String),

    /// An argument was supplied with the wrong type or an unusable value.
    #[error("invalid argument `{name}`: {reason}")]
    InvalidArgument { name: String, reason: String },

    /// The tool ran but could not complete.
    #[error("{0}")]
    Failed(String),
}

impl ToolError {
    /// Shorthand for [`ToolError::Failed`].
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed(reason.into())
    }
}

impl From<clawd_store::StoreError> for ToolError {
    fn from(err: clawd_store::StoreError) -> Self {
        Self::Failed(err.to_string())
    }
}
