//! CLI argument definitions.

use std::net::IpAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// ragchat - Ask a hosted RAG endpoint about events and guests
#[derive(Parser, Debug)]
#[command(name = "ragchat")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (defaults to <config_dir>/ragchat/config.toml)
    #[arg(long, global = true, env = "RAGCHAT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Answer endpoint URL
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Upper bound on each call to the endpoint, in seconds
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    /// Subcommand to execute (defaults to `chat`)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Log level used when `RUST_LOG` is unset. The server is chattier than the REPL.
    pub const fn default_log_level(&self) -> &'static str {
        match self.command {
            Some(Commands::Serve { .. }) => "info",
            _ => "warn",
        }
    }
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start an interactive chat session
    Chat {
        /// Print the sources behind each answer
        #[arg(long)]
        show_sources: bool,
    },

    /// Ask a single question and print the answer
    Ask {
        /// Continue an existing conversation
        #[arg(short, long)]
        conversation_id: Option<String>,

        /// Print the reply as JSON
        #[arg(long)]
        json: bool,

        /// Print the sources behind the answer
        #[arg(long)]
        show_sources: bool,

        /// Question to ask
        #[arg(trailing_var_arg = true, required = true)]
        question: Vec<String>,
    },

    /// Serve the session API for browser widgets
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: IpAddr,

        /// Port to listen on
        #[arg(short, long, default_value = "58232")]
        port: u16,

        /// Drop sessions unused for this many seconds
        #[arg(long, default_value = "1800")]
        idle_timeout_secs: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_chat() {
        let cli = Cli::try_parse_from(["ragchat"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.default_log_level(), "warn");
    }

    #[test]
    fn ask_joins_trailing_words() {
        let cli = Cli::try_parse_from([
            "ragchat",
            "ask",
            "--conversation-id",
            "abc123",
            "where",
            "is",
            "the",
            "party?",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Ask {
                conversation_id,
                question,
                ..
            }) => {
                assert_eq!(conversation_id.as_deref(), Some("abc123"));
                assert_eq!(question.join(" "), "where is the party?");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "ragchat",
            "serve",
            "--port",
            "9000",
            "--endpoint",
            "http://localhost:3003/rag/chat",
        ])
        .unwrap();
        assert_eq!(cli.endpoint.as_deref(), Some("http://localhost:3003/rag/chat"));
        assert_eq!(cli.default_log_level(), "info");
    }
}
