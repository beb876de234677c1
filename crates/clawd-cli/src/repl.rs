//! Subcommand: `clawd chat` -- interactive REPL.

use std::io::{self, Write as _};

use anyhow::{Context, Result};
use tracing::info;

use clawd_agent::{Agent, ClawdConfig};

use crate::helpers::single_agent;

/// Entries shown by `/history`.
const HISTORY_SHOWN: usize = 10;
/// Characters shown per `/history` entry.
const HISTORY_PREVIEW_CHARS: usize = 100;

/// A slash command typed at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Quit,
    Memory,
    Forget,
    Tools,
    History,
    Unknown(String),
}

impl ReplCommand {
    /// Parse a line starting with `/`; anything else is a chat message.
    pub fn parse(line: &str) -> Option<Self> {
        if !line.starts_with('/') {
            return None;
        }
        let cmd = line.to_lowercase();
        Some(match cmd.as_str() {
            "/quit" | "/exit" | "/q" => Self::Quit,
            "/memory" => Self::Memory,
            "/forget" => Self::Forget,
            "/tools" => Self::Tools,
            "/history" => Self::History,
            _ => Self::Unknown(cmd),
        })
    }
}

/// Run the interactive REPL for `user_id`.
pub async fn cmd_chat(config: &ClawdConfig, user_id: &str) -> Result<()> {
    let agent = single_agent(config, user_id)?;
    print_banner(&agent).await;

    let stdin = io::stdin();
    let mut line_buf = String::new();

    loop {
        print!("You: ");
        io::stdout().flush().ok();

        line_buf.clear();
        match stdin.read_line(&mut line_buf) {
            Ok(0) => {
                println!("\nGoodbye!");
                info!("EOF received, exiting");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                eprintln!("  Error reading input: {e}");
                continue;
            }
        }

        let input = line_buf.trim();
        if input.is_empty() {
            continue;
        }

        if let Some(command) = ReplCommand::parse(input) {
            if command == ReplCommand::Quit {
                println!("Goodbye!");
                break;
            }
            run_command(&agent, command).await?;
            continue;
        }

        print!("Clawd: ");
        io::stdout().flush().ok();
        match agent.chat(input).await {
            Ok(reply) => println!("{reply}"),
            Err(e) => println!("Error: {e}"),
        }
        println!();
    }

    Ok(())
}

async fn print_banner(agent: &Agent) {
    println!();
    println!("  Clawd v{}", env!("CARGO_PKG_VERSION"));
    println!("  Memory + Tools + Intelligence");
    println!("  User: {}", agent.user_id());
    println!("  Commands: /memory /forget /tools /history /quit");
    println!();

    let names: Vec<_> = agent.tools().names().collect();
    println!("Loaded {} tools: {}", names.len(), names.join(", "));
    let context = agent.memory().lock().await.get_context();
    println!("Memory context:\n{}\n", or_empty(&context));
    println!("Ready! Type your message or /quit to exit.\n");
}

async fn run_command(agent: &Agent, command: ReplCommand) -> Result<()> {
    match command {
        ReplCommand::Quit => {}
        ReplCommand::Memory => {
            let memory = agent.memory().lock().await;
            let facts =
                serde_json::to_string_pretty(memory.facts()).context("failed to render facts")?;
            println!("\n=== Memory Contents ===");
            println!("Facts: {facts}");
            println!("History: {} messages", memory.history().len());
            println!("Context:\n{}\n", or_empty(&memory.get_context()));
        }
        ReplCommand::Forget => {
            agent
                .memory()
                .lock()
                .await
                .clear()
                .context("failed to clear memory")?;
            println!("Memory cleared.\n");
        }
        ReplCommand::Tools => {
            println!("\n=== Available Tools ===");
            for descriptor in agent.tools().descriptors() {
                println!("  {} - {}", descriptor.name(), descriptor.function.description);
            }
            println!();
        }
        ReplCommand::History => {
            println!("\n=== Recent History ===");
            let memory = agent.memory().lock().await;
            for entry in memory.get_recent_history(HISTORY_SHOWN) {
                println!("  [{}]: {}", entry.role, preview(&entry.content));
            }
            println!();
        }
        ReplCommand::Unknown(cmd) => println!("Unknown command: {cmd}"),
    }
    Ok(())
}

fn or_empty(text: &str) -> &str {
    if text.is_empty() { "(empty)" } else { text }
}

fn preview(content: &str) -> String {
    if content.chars().count() > HISTORY_PREVIEW_CHARS {
        let head: String = content.chars().take(HISTORY_PREVIEW_CHARS).collect();
        format!("{head}...")
    } else {
        content.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slash_commands_parse_case_insensitively() {
        assert_eq!(ReplCommand::parse("/QUIT"), Some(ReplCommand::Quit));
        assert_eq!(ReplCommand::parse("/exit"), Some(ReplCommand::Quit));
        assert_eq!(ReplCommand::parse("/q"), Some(ReplCommand::Quit));
        assert_eq!(ReplCommand::parse("/Memory"), Some(ReplCommand::Memory));
        assert_eq!(ReplCommand::parse("/forget"), Some(ReplCommand::Forget));
        assert_eq!(ReplCommand::parse("/tools"), Some(ReplCommand::Tools));
        assert_eq!(ReplCommand::parse("/history"), Some(ReplCommand::History));
    }

    #[test]
    fn unknown_and_plain_input() {
        assert_eq!(
            ReplCommand::parse("/Dance"),
            Some(ReplCommand::Unknown("/dance".into()))
        );
        assert_eq!(ReplCommand::parse("hello /quit"), None);
    }

    #[test]
    fn preview_truncates_long_entries() {
        assert_eq!(preview("short"), "short");
        let long = "ж".repeat(150);
        let shown = preview(&long);
        assert!(shown.ends_with("..."));
        assert_eq!(shown.chars().count(), HISTORY_PREVIEW_CHARS + 3);
    }
}
