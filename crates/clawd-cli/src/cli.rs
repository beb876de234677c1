//! CLI argument definitions for Clawd.
//!
//! All `clap` structures live here so that `main.rs` stays focused on
//! dispatching subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Clawd -- a conversational agent with memory and tools.
#[derive(Parser)]
#[command(
    name = "clawd",
    version,
    about = "Clawd -- a conversational agent with memory and tools",
    long_about = "Chats through any OpenAI-compatible endpoint, remembers facts about \
                  each user across sessions, and can call built-in tools."
)]
pub struct Cli {
    /// Path to the TOML config file (default: config/clawd.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the interactive chat REPL.
    Chat {
        /// User identifier whose memory is used.
        #[arg(long, short, default_value = "main")]
        user: String,
    },

    /// Send one message and print the reply.
    Ask {
        /// The message; multiple words are joined with spaces.
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,

        /// User identifier whose memory is used.
        #[arg(long, short, default_value = "main")]
        user: String,
    },

    /// Start the HTTP chat API.
    Serve {
        /// Address to bind the HTTP server to.
        #[arg(long, default_value = "0.0.0.0")]
        bind: String,

        /// Port to listen on.
        #[arg(long, short, default_value_t = 8080)]
        port: u16,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ask_joins_words_and_keeps_global_config() {
        let cli = Cli::parse_from(["clawd", "ask", "what", "time?", "--config", "x.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
        match cli.command {
            Commands::Ask { message, user } => {
                assert_eq!(message.join(" "), "what time?");
                assert_eq!(user, "main");
            }
            _ => panic!("expected ask"),
        }
    }

    #[test]
    fn serve_defaults() {
        let cli = Cli::parse_from(["clawd", "serve"]);
        match cli.command {
            Commands::Serve { bind, port } => {
                assert_eq!(bind, "0.0.0.0");
                assert_eq!(port, 8080);
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn ask_requires_a_message() {
        assert!(Cli::try_parse_from(["clawd", "ask"]).is_err());
    }
}
