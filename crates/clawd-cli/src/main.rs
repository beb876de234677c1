//! CLI entry point for Clawd.
//!
//! This binary provides the `clawd` command with subcommands for chatting
//! interactively, asking a single question and serving the HTTP API.

mod cli;
mod helpers;
mod repl;
mod serve;

use anyhow::{Context, Result};
use clap::Parser;

use cli::{Cli, Commands};
use helpers::{init_tracing, load_config, single_agent};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Interactive output owns the terminal; keep logs to warnings there.
    let default_level = match cli.command {
        Commands::Serve { .. } => "info",
        Commands::Chat { .. } | Commands::Ask { .. } => "warn",
    };
    init_tracing(default_level);

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Chat { user } => repl::cmd_chat(&config, &user).await,
        Commands::Ask { message, user } => cmd_ask(&config, &user, &message.join(" ")).await,
        Commands::Serve { bind, port } => serve::cmd_serve(config, bind, port).await,
    }
}

/// Subcommand: `clawd ask` -- one turn, reply on stdout.
async fn cmd_ask(config: &clawd_agent::ClawdConfig, user_id: &str, message: &str) -> Result<()> {
    let agent = single_agent(config, user_id)?;
    let reply = agent.chat(message).await.context("turn failed")?;
    println!("{reply}");
    Ok(())
}
