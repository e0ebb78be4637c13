//! CLI command execution.

use std::io::Write;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::BufReader;

use crate::chat::SessionController;
use crate::config::ChatConfig;
use crate::server;

use super::args::{Cli, Commands};
use super::repl::run_repl;

// === CLI Options ===

/// Options for a one-shot question.
#[derive(Debug, Clone, Default)]
pub struct AskOptions {
    /// Conversation to continue. Blank values are ignored.
    pub conversation_id: Option<String>,
    /// Print the reply as JSON instead of plain text.
    pub json: bool,
    /// Print the sources behind the answer.
    pub show_sources: bool,
}

// === Command Execution ===

pub async fn execute(cli: Cli) -> Result<()> {
    let config = ChatConfig::load(cli.config.as_deref())?
        .override_with(cli.endpoint.clone(), cli.timeout_secs);
    config.validate()?;

    match cli.command {
        None => chat(&config, config.show_sources).await,
        Some(Commands::Chat { show_sources }) => {
            chat(&config, show_sources || config.show_sources).await
        }
        Some(Commands::Ask {
            conversation_id,
            json,
            show_sources,
            question,
        }) => {
            let opts = AskOptions {
                conversation_id,
                json,
                show_sources: show_sources || config.show_sources,
            };
            let question = question.join(" ");
            let mut stdout = std::io::stdout();
            let mut stderr = std::io::stderr();
            run_ask(&config, &question, &opts, &mut stdout, &mut stderr).await
        }
        Some(Commands::Serve {
            host,
            port,
            idle_timeout_secs,
        }) => {
            server::start_server(
                &config,
                SocketAddr::new(host, port),
                Duration::from_secs(idle_timeout_secs),
            )
            .await
        }
    }
}

async fn chat(config: &ChatConfig, show_sources: bool) -> Result<()> {
    let mut controller = SessionController::new(config.client()?);
    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();

    run_repl(&mut controller, stdin, &mut stdout, show_sources).await
}

/// Ask one question. The answer goes to `out`; the conversation id goes to
/// `err` so it can be reused without polluting piped output.
pub async fn run_ask<O, E>(
    config: &ChatConfig,
    question: &str,
    opts: &AskOptions,
    out: &mut O,
    err: &mut E,
) -> Result<()>
where
    O: Write,
    E: Write,
{
    let client = config.client()?;
    let conversation_id = opts
        .conversation_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty());
    let mut controller = match conversation_id {
        Some(id) => SessionController::with_conversation_id(client, id),
        None => SessionController::new(client),
    };

    let turn = controller
        .submit(question)
        .await
        .context("Failed to get response from the API")?;

    if opts.json {
        let body = serde_json::json!({
            "answer": turn.content(),
            "conversationId": controller.conversation_id(),
            "sources": turn.sources(),
        });
        writeln!(out, "{}", serde_json::to_string_pretty(&body)?)?;
        return Ok(());
    }

    writeln!(out, "{}", turn.content())?;

    if opts.show_sources && !turn.sources().is_empty() {
        writeln!(out, "\nSources:")?;
        for (idx, source) in turn.sources().iter().enumerate() {
            writeln!(out, "  [{}] {}", idx + 1, source.content.trim())?;
        }
    }

    if let Some(id) = controller.conversation_id() {
        writeln!(err, "Conversation ID: {id}")?;
    }

    Ok(())
}
