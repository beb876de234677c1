//! Memory tools -- let the model read and write the user's own memory.
//!
//! - `remember_fact` -- upsert a fact.
//! - `recall_fact` -- one fact, or a whole category.
//! - `search_history` -- case-insensitive search over past messages.
//! - `add_task` / `complete_task` -- maintain the active task list, numbered
//!   from 1 the way `recall_fact` renders it.
//!
//! The tools share the agent's [`SharedMemory`] handle, so writes show up in
//! the next system prompt and are flushed like any other mutation.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use clawd_agent::tools::{optional_str, require_str};
use clawd_agent::{SharedMemory, ToolArgs, ToolError, ToolHandler, ToolRegistry};
use clawd_store::FactCategory;

/// Matches returned by `search_history`, most recent last.
const MAX_SEARCH_RESULTS: usize = 10;
/// Characters shown per matching message.
const MAX_SNIPPET_CHARS: usize = 200;

#[derive(Debug, Clone, Copy)]
enum MemoryOp {
    Remember,
    Recall,
    Search,
    AddTask,
    CompleteTask,
}

struct MemoryTool {
    memory: SharedMemory,
    op: MemoryOp,
}

#[async_trait]
impl ToolHandler for MemoryTool {
    async fn call(&self, args: ToolArgs) -> Result<String, ToolError> {
        match self.op {
            MemoryOp::Remember => {
                let category = require_str(&args, "category")?;
                let key = require_str(&args, "key")?;
                let value = require_str(&args, "value")?;
                self.memory.lock().await.remember(category, key, value)?;
                debug!(category, key, "fact remembered by tool");
                Ok(format!("Remembered {category}/{key}"))
            }
            MemoryOp::Recall => {
                let category = require_str(&args, "category")?;
                let memory = self.memory.lock().await;
                Ok(match optional_str(&args, "key") {
                    Some(key) => memory.recall(category, key).map_or_else(
                        || format!("Nothing remembered for {category}/{key}"),
                        str::to_owned,
                    ),
                    None => render_category(category, memory.recall_category(category)),
                })
            }
            MemoryOp::Search => {
                let query = require_str(&args, "query")?;
                let memory = self.memory.lock().await;
                let hits = memory.search_history(query);
                if hits.is_empty() {
                    return Ok(format!("No messages matching '{query}'"));
                }
                let skip = hits.len().saturating_sub(MAX_SEARCH_RESULTS);
                Ok(hits
                    .into_iter()
                    .skip(skip)
                    .map(|entry| {
                        let snippet: String =
                            entry.content.chars().take(MAX_SNIPPET_CHARS).collect();
                        format!(
                            "[{}] {}: {snippet}",
                            entry.timestamp.format("%Y-%m-%d %H:%M"),
                            entry.role
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n"))
            }
            MemoryOp::AddTask => {
                let task = require_str(&args, "task")?;
                let mut memory = self.memory.lock().await;
                memory.add_task(task)?;
                let number = memory.tasks().len();
                debug!(number, "task added by tool");
                Ok(format!("Added task #{number}: {task}"))
            }
            MemoryOp::CompleteTask => {
                let number = task_number(&args)?;
                let done = self.memory.lock().await.complete_task(number - 1)?;
                Ok(match done {
                    Some(task) => format!("Completed task #{number}: {task}"),
                    None => format!("No task #{number}"),
                })
            }
        }
    }
}

/// The 1-based `number` argument, given as a JSON number or a numeric string.
fn task_number(args: &ToolArgs) -> Result<usize, ToolError> {
    let invalid = |reason: &str| ToolError::InvalidArgument {
        name: "number".into(),
        reason: reason.into(),
    };
    let raw = match args.get("number") {
        None | Some(Value::Null) => return Err(ToolError::MissingArgument("number".into())),
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        Some(_) => None,
    };
    match raw.and_then(|n| usize::try_from(n).ok()) {
        Some(0) | None => Err(invalid("expected a task number starting at 1")),
        Some(n) => Ok(n),
    }
}

fn render_category(category: &str, facts: Option<&FactCategory>) -> String {
    match facts {
        Some(facts) if !facts.is_empty() => match facts {
            FactCategory::Keyed(map) => map
                .iter()
                .map(|(key, fact)| format!("{key}: {}", fact.value))
                .collect::<Vec<_>>()
                .join("\n"),
            FactCategory::List(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| format!("{}. {item}", i + 1))
                .collect::<Vec<_>>()
                .join("\n"),
        },
        _ => format!("Nothing remembered in {category}"),
    }
}

/// Register the memory tools against `memory`.
pub fn register(registry: &mut ToolRegistry, memory: SharedMemory) {
    let tool = |op| {
        Arc::new(MemoryTool {
            memory: Arc::clone(&memory),
            op,
        })
    };

    registry.register(
        "remember_fact",
        "Remember a fact about the user or the world",
        tool(MemoryOp::Remember),
        Some(json!({
            "type": "object",
            "properties": {
                "category": {"type": "string", "description": "Category, e.g. user, preferences, world"},
                "key": {"type": "string", "description": "Fact name"},
                "value": {"type": "string", "description": "Fact value"}
            },
            "required": ["category", "key", "value"]
        })),
    );
    registry.register(
        "recall_fact",
        "Recall a remembered fact, or every fact in a category",
        tool(MemoryOp::Recall),
        Some(json!({
            "type": "object",
            "properties": {
                "category": {"type": "string", "description": "Category to read"},
                "key": {"type": "string", "description": "Fact name; omit for the whole category"}
            },
            "required": ["category"]
        })),
    );
    registry.register(
        "search_history",
        "Search past conversation messages",
        tool(MemoryOp::Search),
        Some(json!({
            "type": "object",
            "properties": {
                "query": {"type": "string", "description": "Text to look for"}
            },
            "required": ["query"]
        })),
    );
    registry.register(
        "add_task",
        "Add an item to the user's active task list",
        tool(MemoryOp::AddTask),
        Some(json!({
            "type": "object",
            "properties": {
                "task": {"type": "string", "description": "What needs doing"}
            },
            "required": ["task"]
        })),
    );
    registry.register(
        "complete_task",
        "Remove a finished item from the active task list",
        tool(MemoryOp::CompleteTask),
        Some(json!({
            "type": "object",
            "properties": {
                "number": {"type": "integer", "description": "Task number, starting at 1"}
            },
            "required": ["number"]
        })),
    );
}
