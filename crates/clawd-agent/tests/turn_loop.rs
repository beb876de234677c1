//! End-to-end turn tests against a scripted backend.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use clawd_agent::{
    Agent, AgentConfig, AgentError, AgentPool, ChatBackend, ChatRequest, ReplyMessage, Role, ToolArgs,
    ToolCall, ToolError, ToolRegistry, tools::require_str,
};
use clawd_store::{HistoryRole, MemoryStore, StoreError};

/// Replays canned replies in order and records every request.
#[derive(Default)]
struct ScriptedBackend {
    replies: Mutex<VecDeque<ReplyMessage>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedBackend {
    fn new(replies: impl IntoIterator<Item = ReplyMessage>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::default(),
        })
    }

    fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn complete(&self, request: &ChatRequest) -> ReplyMessage {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| ReplyMessage::text("(script exhausted)"))
    }
}

fn echo_registry() -> ToolRegistry {
    let mut tools = ToolRegistry::new();
    tools.register_fn(
        "echo",
        "Echo the argument back",
        Some(json!({
            "type": "object",
            "properties": {"x": {"type": "string"}},
            "required": ["x"]
        })),
        |args: ToolArgs| Ok(require_str(&args, "x")?.to_owned()),
    );
    tools
}

fn agent_with(
    dir: &tempfile::TempDir,
    tools: ToolRegistry,
    backend: Arc<ScriptedBackend>,
) -> Agent {
    let memory = MemoryStore::open(dir.path(), "tester").unwrap();
    Agent::new(memory, tools, backend, AgentConfig::default())
}

fn last_message(request: &ChatRequest) -> &str {
    &request.messages.last().unwrap().content
}

#[tokio::test]
async fn plain_reply_is_returned_and_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let backend = ScriptedBackend::new([ReplyMessage::text("Hello, human.")]);
    let agent = agent_with(&dir, ToolRegistry::new(), backend.clone());

    let reply = agent.chat("Hi there").await.unwrap();
    assert_eq!(reply, "Hello, human.");

    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].messages[0].role, Role::System);
    assert!(requests[0].messages[0].content.starts_with("You are Clawd"));
    assert_eq!(last_message(&requests[0]), "Hi there");
    assert!(requests[0].tools.is_empty());

    let memory = agent.memory().lock().await;
    let history = memory.history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].role, HistoryRole::User);
    assert_eq!(history[1].content, "Hello, human.");
}

#[tokio::test]
async fn echo_tool_round_folds_tagged_results() {
    let dir = tempfile::tempdir().unwrap();
    let backend = ScriptedBackend::new([
        ReplyMessage::tool_calls(vec![ToolCall::new("echo", r#"{"x":"hi"}"#)]),
        ReplyMessage::text("The tool said hi."),
    ]);
    let agent = agent_with(&dir, echo_registry(), backend.clone());

    let reply = agent.chat("please echo hi").await.unwrap();
    assert_eq!(reply, "The tool said hi.");

    let requests = backend.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].tools.len(), 1);
    assert!(requests[1].tools.is_empty(), "follow-up call must not offer tools");

    let follow_up = &requests[1].messages;
    let n = follow_up.len();
    assert_eq!(follow_up[n - 2].role, Role::Assistant);
    assert_eq!(follow_up[n - 2].content, "");
    assert_eq!(follow_up[n - 1].role, Role::User);
    assert!(follow_up[n - 1].content.starts_with("Tool results:\n"));
    assert!(follow_up[n - 1].content.contains("[echo]: hi"));

    // Tool exchange stays out of durable history.
    let memory = agent.memory().lock().await;
    assert_eq!(memory.history().len(), 2);
}

#[tokio::test]
async fn results_keep_call_order() {
    let dir = tempfile::tempdir().unwrap();
    let mut tools = echo_registry();
    tools.register_async("slow", "Slow tool", None, |_args: ToolArgs| async {
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        Ok::<_, ToolError>("late".to_owned())
    });
    let backend = ScriptedBackend::new([
        ReplyMessage::tool_calls(vec![
            ToolCall::new("slow", "{}"),
            ToolCall::new("echo", r#"{"x":"fast"}"#),
        ]),
        ReplyMessage::text("ok"),
    ]);
    let agent = agent_with(&dir, tools, backend.clone());

    agent.chat("go").await.unwrap();
    let requests = backend.requests();
    assert_eq!(
        last_message(&requests[1]),
        "Tool results:\n[slow]: late\n[echo]: fast"
    );
}

#[tokio::test]
async fn unknown_tool_and_tool_errors_become_text() {
    let dir = tempfile::tempdir().unwrap();
    let backend = ScriptedBackend::new([
        ReplyMessage::tool_calls(vec![
            ToolCall::new("nope", "{}"),
            ToolCall::new("echo", "this is not json"),
        ]),
        ReplyMessage::text("Sorry about that."),
    ]);
    let agent = agent_with(&dir, echo_registry(), backend.clone());

    let reply = agent.chat("break things").await.unwrap();
    assert_eq!(reply, "Sorry about that.");

    let folded = last_message(&backend.requests()[1]).to_owned();
    assert!(folded.contains("[nope]: Tool 'nope' not found"));
    // Malformed arguments degrade to none, so `x` is missing.
    assert!(folded.contains("[echo]: Tool error: missing required argument `x`"));
}

#[tokio::test]
async fn second_round_tool_calls_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let backend = ScriptedBackend::new([
        ReplyMessage::tool_calls(vec![ToolCall::new("echo", r#"{"x":"1"}"#)]),
        ReplyMessage {
            content: Some("final".into()),
            tool_calls: vec![ToolCall::new("echo", r#"{"x":"2"}"#)],
            reasoning: None,
        },
    ]);
    let agent = agent_with(&dir, echo_registry(), backend.clone());

    assert_eq!(agent.chat("twice?").await.unwrap(), "final");
    assert_eq!(backend.requests().len(), 2);
}

#[tokio::test]
async fn backend_error_text_is_the_reply() {
    let dir = tempfile::tempdir().unwrap();
    let backend = ScriptedBackend::new([ReplyMessage::error(503)]);
    let agent = agent_with(&dir, ToolRegistry::new(), backend);

    let reply = agent.chat("anyone there?").await.unwrap();
    assert_eq!(reply, "Error: 503");

    let memory = agent.memory().lock().await;
    assert_eq!(memory.history()[1].content, "Error: 503");
}

#[tokio::test]
async fn empty_reply_never_yields_empty_text() {
    let dir = tempfile::tempdir().unwrap();
    let backend = ScriptedBackend::new([
        ReplyMessage {
            content: None,
            tool_calls: vec![],
            reasoning: Some("Let me think.\nIt is sunny.\n".into()),
        },
        ReplyMessage::default(),
    ]);
    let agent = agent_with(&dir, ToolRegistry::new(), backend);

    assert_eq!(agent.chat("weather?").await.unwrap(), "It is sunny.");
    assert_eq!(
        agent.chat("and tomorrow?").await.unwrap(),
        "I couldn't generate a response."
    );
}

#[tokio::test]
async fn facts_are_extracted_and_reach_the_next_prompt() {
    let dir = tempfile::tempdir().unwrap();
    let backend = ScriptedBackend::new([
        ReplyMessage::text("Nice to meet you."),
        ReplyMessage::text("Noted."),
    ]);
    let agent = agent_with(&dir, ToolRegistry::new(), backend.clone());

    agent.chat("My name is Grace!").await.unwrap();
    let long = format!("I prefer {}", "tea ".repeat(40));
    agent.chat(&long).await.unwrap();

    {
        let memory = agent.memory().lock().await;
        assert_eq!(memory.recall("user", "name"), Some("Grace"));
        let noted = memory.recall("preferences", "noted").unwrap();
        assert_eq!(noted.chars().count(), 100);
        assert!(long.starts_with(noted));
    }

    let system = &backend.requests()[1].messages[0].content;
    assert!(system.contains("name: Grace"));
}

#[tokio::test]
async fn window_is_bounded_by_context_window() {
    let dir = tempfile::tempdir().unwrap();
    let backend = ScriptedBackend::new((0..5).map(|i| ReplyMessage::text(format!("r{i}"))));
    let agent = agent_with(&dir, ToolRegistry::new(), backend.clone());

    for i in 0..5 {
        agent.chat(&format!("m{i}")).await.unwrap();
    }

    let requests = backend.requests();
    // System message plus at most six history entries.
    assert_eq!(requests[4].messages.len(), 7);
    let window: Vec<_> = requests[4].messages[1..]
        .iter()
        .map(|m| m.content.as_str())
        .collect();
    assert_eq!(window, ["r1", "m2", "r2", "m3", "r3", "m4"]);
}

#[tokio::test]
async fn history_survives_a_new_agent() {
    let dir = tempfile::tempdir().unwrap();
    let backend = ScriptedBackend::new([ReplyMessage::text("first"), ReplyMessage::text("second")]);

    agent_with(&dir, ToolRegistry::new(), backend.clone())
        .chat("one")
        .await
        .unwrap();
    agent_with(&dir, ToolRegistry::new(), backend.clone())
        .chat("two")
        .await
        .unwrap();

    let window: Vec<_> = backend.requests()[1].messages[1..]
        .iter()
        .map(|m| m.content.clone())
        .collect();
    assert_eq!(window, ["one", "first", "two"]);
}

#[tokio::test]
async fn pool_isolates_users() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().to_path_buf();
    let backend = ScriptedBackend::new([ReplyMessage::text("a"), ReplyMessage::text("b")]);
    let shared: Arc<dyn ChatBackend> = backend.clone();

    let pool = AgentPool::new(move |user_id| {
        let memory = MemoryStore::open(&root, user_id)?;
        Ok(Agent::new(
            memory,
            ToolRegistry::new(),
            Arc::clone(&shared),
            AgentConfig::default(),
        ))
    });

    pool.chat("alice", "I am Alice").await.unwrap();
    pool.chat("bob", "hello").await.unwrap();
    assert_eq!(pool.len(), 2);

    let alice = pool.get_or_create("alice").unwrap();
    assert_eq!(
        alice.lock().await.memory().lock().await.recall("user", "name"),
        Some("Alice")
    );
    let bob = pool.get_or_create("bob").unwrap();
    assert_eq!(bob.lock().await.memory().lock().await.recall("user", "name"), None);

    assert!(pool.get_or_create("../escape").is_err());
    assert_eq!(pool.len(), 2);
}

#[tokio::test]
async fn unwritable_history_fails_the_turn_before_the_backend_call() {
    let dir = tempfile::tempdir().unwrap();
    let backend = ScriptedBackend::new([ReplyMessage::text("never sent")]);
    let agent = agent_with(&dir, ToolRegistry::new(), backend.clone());

    // A directory where the history document should be makes every save fail.
    std::fs::create_dir(dir.path().join("tester_history.json")).unwrap();

    let err = agent.chat("hello").await.unwrap_err();
    assert!(matches!(err, AgentError::Store(StoreError::Io { .. })), "{err:?}");
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn storage_failure_after_the_tool_round_is_not_masked() {
    let dir = tempfile::tempdir().unwrap();
    let history_path = dir.path().join("tester_history.json");

    let mut tools = ToolRegistry::new();
    tools.register_fn("break_disk", "Swap the history file for a directory", None, {
        let history_path = history_path.clone();
        move |_args: ToolArgs| {
            std::fs::remove_file(&history_path).map_err(|e| ToolError::failed(e.to_string()))?;
            std::fs::create_dir(&history_path).map_err(|e| ToolError::failed(e.to_string()))?;
            Ok("done".to_owned())
        }
    });

    let backend = ScriptedBackend::new([
        ReplyMessage::tool_calls(vec![ToolCall::new("break_disk", "{}")]),
        ReplyMessage::text("all good"),
    ]);
    let agent = agent_with(&dir, tools, backend.clone());

    let err = agent.chat("go").await.unwrap_err();
    assert!(matches!(err, AgentError::Store(StoreError::Io { .. })), "{err:?}");
    assert_eq!(backend.requests().len(), 2);
    assert!(history_path.is_dir());
}

#[tokio::test]
async fn panicking_tool_becomes_error_text() {
    let dir = tempfile::tempdir().unwrap();
    let mut tools = echo_registry();
    tools.register_fn(
        "explode",
        "Always panics",
        None,
        |_args: ToolArgs| -> Result<String, ToolError> { panic!("kaboom") },
    );

    let backend = ScriptedBackend::new([
        ReplyMessage::tool_calls(vec![
            ToolCall::new("explode", "{}"),
            ToolCall::new("echo", r#"{"x": "still here"}"#),
        ]),
        ReplyMessage::text("recovered"),
    ]);
    let agent = agent_with(&dir, tools, backend.clone());

    assert_eq!(agent.chat("boom").await.unwrap(), "recovered");
    assert_eq!(
        last_message(&backend.requests()[1]),
        "Tool results:\n[explode]: Tool error: tool panicked: kaboom\n[echo]: still here"
    );
}
