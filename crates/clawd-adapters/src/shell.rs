//! Shell tool -- run a whitelisted, read-only command.
//!
//! The command line is split on whitespace and executed directly (no shell),
//! so pipes, redirects and `;` chains are never interpreted.  Only the
//! programs in [`ALLOWED_COMMANDS`] may run.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, warn};

use clawd_agent::tools::require_str;
use clawd_agent::{ToolArgs, ToolError, ToolHandler, ToolRegistry};

use crate::error::{AdapterError, Result};

/// Programs `run_command` may start.
pub const ALLOWED_COMMANDS: [&str; 8] = ["ls", "pwd", "date", "whoami", "echo", "cat", "head", "tail"];

/// Wall-clock limit per command.
pub const COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// Characters of output returned.
pub const MAX_OUTPUT_CHARS: usize = 2_000;

/// Runs whitelisted commands in a fixed working directory.
#[derive(Debug, Clone)]
pub struct ShellTool {
    working_dir: PathBuf,
    timeout: Duration,
}

impl ShellTool {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            timeout: COMMAND_TIMEOUT,
        }
    }

    /// Set the per-command timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run `command` and return stdout (stderr when stdout is empty).
    pub async fn run(&self, command: &str) -> Result<String> {
        let mut parts = command.split_whitespace();
        let program = parts.next().unwrap_or_default();

        if !ALLOWED_COMMANDS.contains(&program) {
            warn!(program, "command rejected");
            return Ok(format!("Command not allowed: {program}"));
        }

        debug!(command, working_dir = %self.working_dir.display(), "running command");

        let child = tokio::process::Command::new(program)
            .args(parts)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| AdapterError::ExecutionFailed {
                tool_name: "run_command".into(),
                reason: format!("failed to spawn `{program}`: {e}"),
            })?;

        // On timeout the child is dropped and killed via `kill_on_drop`.
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(output) => output?,
            Err(_) => {
                warn!(command, timeout_secs = self.timeout.as_secs(), "command timed out");
                return Ok("Command timed out".to_owned());
            }
        };

        let stream = if output.stdout.is_empty() {
            &output.stderr
        } else {
            &output.stdout
        };
        let text = String::from_utf8_lossy(stream);
        if text.is_empty() {
            return Ok("No output".to_owned());
        }
        Ok(text.chars().take(MAX_OUTPUT_CHARS).collect())
    }
}

#[async_trait]
impl ToolHandler for ShellTool {
    async fn call(&self, args: ToolArgs) -> std::result::Result<String, ToolError> {
        Ok(self.run(require_str(&args, "command")?).await?)
    }
}

/// Register `run_command`.
pub fn register(registry: &mut ToolRegistry, shell: ShellTool) {
    registry.register(
        "run_command",
        "Run a safe shell command (ls, pwd, date, whoami, echo, cat, head, tail)",
        std::sync::Arc::new(shell),
        Some(json!({
            "type": "object",
            "properties": {
                "command": {"type": "string", "description": "Shell command to run"}
            },
            "required": ["command"]
        })),
    );
}
