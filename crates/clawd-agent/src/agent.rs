//! The turn loop.
//!
//! One [`Agent`] owns one user's memory.  [`Agent::chat`] drives a turn:
//!
//! 1. persist the user message,
//! 2. send the system prompt (with memory context) plus the recent window,
//! 3. if the model asks for tools, run them, fold the tagged results into a
//!    synthetic user message and ask once more without tools,
//! 4. persist the reply and let the fact extractor update memory.
//!
//! Backend and tool failures never abort a turn; they surface as text.  Only
//! storage failures propagate.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::join_all;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use clawd_store::{HistoryRole, MemoryStore};

use crate::error::Result;
use crate::extract::{FactExtractor, HeuristicExtractor};
use crate::llm::{ChatBackend, ChatRequest, Message, ReplyMessage, ToolCall};
use crate::prompt::{DEFAULT_SYSTEM_PROMPT, render_system_prompt};
use crate::tools::{ToolArgs, ToolHandler, ToolRegistry};

/// A memory store shared between the agent and the tools that read or write
/// it.  Never held across a backend call or a tool invocation.
pub type SharedMemory = Arc<Mutex<MemoryStore>>;

/// Per-turn settings.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// History entries sent per request.
    pub context_window: usize,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Template with a `{memory_context}` placeholder.
    pub system_prompt: String,
    /// Reply used when the model produced no usable text.
    pub fallback_reply: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            context_window: 6,
            temperature: 0.7,
            max_tokens: 1000,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_owned(),
            fallback_reply: "I couldn't generate a response.".to_owned(),
        }
    }
}

/// A conversational agent bound to one user's memory.
pub struct Agent {
    user_id: String,
    memory: SharedMemory,
    tools: ToolRegistry,
    backend: Arc<dyn ChatBackend>,
    extractor: Box<dyn FactExtractor>,
    config: AgentConfig,
}

impl Agent {
    /// Create an agent using the heuristic fact extractor.
    pub fn new(
        memory: MemoryStore,
        tools: ToolRegistry,
        backend: Arc<dyn ChatBackend>,
        config: AgentConfig,
    ) -> Self {
        let user_id = memory.user_id().to_owned();
        info!(user_id = %user_id, tool_count = tools.len(), "agent created");
        Self {
            user_id,
            memory: Arc::new(Mutex::new(memory)),
            tools,
            backend,
            extractor: Box::new(HeuristicExtractor),
            config,
        }
    }

    /// Replace the fact extractor.
    pub fn with_extractor(mut self, extractor: impl FactExtractor + 'static) -> Self {
        self.extractor = Box::new(extractor);
        self
    }

    /// Register a tool on this agent's registry.
    pub fn register_tool(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        handler: Arc<dyn ToolHandler>,
        parameters: Option<serde_json::Value>,
    ) {
        self.tools.register(name, description, handler, parameters);
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// The memory handle, for tools that operate on this user's store.
    pub fn memory(&self) -> &SharedMemory {
        &self.memory
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn tools_mut(&mut self) -> &mut ToolRegistry {
        &mut self.tools
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Run one turn and return a non-empty reply.
    ///
    /// # Errors
    ///
    /// Only [`crate::AgentError::Store`]: a failed memory write is never
    /// masked.  Backend and tool failures are folded into the reply.
    #[instrument(
        skip(self, user_input),
        fields(user_id = %self.user_id, turn_id = %Uuid::now_v7())
    )]
    pub async fn chat(&self, user_input: &str) -> Result<String> {
        let mut window = {
            let mut memory = self.memory.lock().await;
            memory.add_message(HistoryRole::User, user_input, None)?;
            memory
                .get_recent_history(self.config.context_window)
                .iter()
                .map(|entry| match entry.role {
                    HistoryRole::User => Message::user(&entry.content),
                    HistoryRole::Assistant => Message::assistant(&entry.content),
                })
                .collect::<Vec<_>>()
        };

        let mut reply = self.request(&window, true).await;

        if !reply.tool_calls.is_empty() {
            info!(
                tool_count = reply.tool_calls.len(),
                tools = ?reply.tool_calls.iter().map(|c| &c.name).collect::<Vec<_>>(),
                "model requested tool calls"
            );

            let results = self.run_tool_round(&reply.tool_calls).await;
            window.push(Message::assistant(reply.content_text()));
            window.push(Message::user(results));

            reply = self.request(&window, false).await;
            if !reply.tool_calls.is_empty() {
                // One tool round per turn.
                debug!(
                    ignored = reply.tool_calls.len(),
                    "follow-up tool calls not executed"
                );
            }
        }

        let text = final_text(&reply, &self.config.fallback_reply);

        {
            let mut memory = self.memory.lock().await;
            memory.add_message(HistoryRole::Assistant, &text, None)?;
            for fact in self.extractor.extract(user_input, &text) {
                debug!(category = %fact.category, key = %fact.key, "fact extracted");
                memory.remember(&fact.category, &fact.key, &fact.value)?;
            }
        }

        info!(reply_len = text.len(), "turn completed");
        Ok(text)
    }

    /// Build and send one request.  The system prompt is rendered fresh so
    /// facts written by tools are visible on the follow-up call.
    async fn request(&self, window: &[Message], with_tools: bool) -> ReplyMessage {
        let context = self.memory.lock().await.get_context();

        let mut messages = Vec::with_capacity(window.len() + 1);
        messages.push(Message::system(render_system_prompt(
            &self.config.system_prompt,
            &context,
        )));
        messages.extend_from_slice(window);

        let request = ChatRequest {
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            tools: if with_tools {
                self.tools.descriptors().to_vec()
            } else {
                Vec::new()
            },
        };

        debug!(
            messages = request.messages.len(),
            tools = request.tools.len(),
            "calling backend"
        );
        self.backend.complete(&request).await
    }

    /// Run every call concurrently and fold the results in call order.
    async fn run_tool_round(&self, calls: &[ToolCall]) -> String {
        let lines = join_all(calls.iter().map(|call| self.execute_tool(call))).await;
        format!("Tool results:\n{}", lines.join("\n"))
    }

    async fn execute_tool(&self, call: &ToolCall) -> String {
        let result = match self.tools.handler(&call.name) {
            None => {
                warn!(tool = %call.name, "unknown tool requested");
                format!("Tool '{}' not found", call.name)
            }
            Some(handler) => {
                let outcome = AssertUnwindSafe(handler.call(decode_arguments(call)))
                    .catch_unwind()
                    .await;
                match outcome {
                    Ok(Ok(output)) => {
                        debug!(tool = %call.name, output_len = output.len(), "tool succeeded");
                        output
                    }
                    Ok(Err(e)) => {
                        warn!(tool = %call.name, error = %e, "tool failed");
                        format!("Tool error: {e}")
                    }
                    Err(payload) => {
                        let reason = panic_message(&*payload);
                        warn!(tool = %call.name, reason, "tool panicked");
                        format!("Tool error: tool panicked: {reason}")
                    }
                }
            }
        };
        format!("[{}]: {result}", call.name)
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("user_id", &self.user_id)
            .field("tools", &self.tools)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        *msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "unknown panic"
    }
}

/// Decode a call's JSON argument string.  Anything that is not a JSON object
/// degrades to no arguments.
fn decode_arguments(call: &ToolCall) -> ToolArgs {
    match serde_json::from_str::<serde_json::Value>(&call.arguments) {
        Ok(serde_json::Value::Object(map)) => map,
        Ok(other) => {
            warn!(tool = %call.name, arguments = %other, "tool arguments are not an object");
            ToolArgs::new()
        }
        Err(e) => {
            warn!(tool = %call.name, error = %e, "malformed tool arguments");
            ToolArgs::new()
        }
    }
}

/// Content, else the last non-empty reasoning line, else `fallback`.
fn final_text(reply: &ReplyMessage, fallback: &str) -> String {
    let content = reply.content_text();
    if !content.trim().is_empty() {
        return content.to_owned();
    }

    reply
        .reasoning
        .as_deref()
        .and_then(|reasoning| {
            reasoning
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .last()
        })
        .map_or_else(|| fallback.to_owned(), str::to_owned)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
