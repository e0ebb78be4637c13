//! Interactive chat loop.

use std::io::Write;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::chat::{sample, samples, ApiError, SessionController};
use crate::models::Turn;

const PROMPT: &str = "> ";
const FAILURE_NOTICE: &str = "Failed to get response from the API. Please try again.";
const EMPTY_CHAT_ONLY: &str =
    "Starter questions are only available in an empty chat. Use /clear first.";

/// Longest source excerpt printed under an answer.
const SOURCE_PREVIEW_CHARS: usize = 120;

/// One line of REPL input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    /// Plain text: ask it.
    Ask(String),
    /// `/N`: ask starter question N.
    Sample(usize),
    Samples,
    Retry,
    Info,
    Clear,
    Help,
    Quit,
    /// Blank line.
    Empty,
    /// A slash command we don't know.
    Unknown(String),
}

impl ReplCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }

        let Some(command) = line.strip_prefix('/') else {
            return Self::Ask(line.to_string());
        };

        match command.to_lowercase().as_str() {
            "samples" => Self::Samples,
            "retry" => Self::Retry,
            "info" => Self::Info,
            "clear" | "reset" => Self::Clear,
            "help" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            other => other
                .parse::<usize>()
                .map_or_else(|_| Self::Unknown(line.to_string()), Self::Sample),
        }
    }
}

/// Run the chat loop until `/quit` or end of input.
pub async fn run_repl<R, W>(
    controller: &mut SessionController,
    input: R,
    out: &mut W,
    show_sources: bool,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();

    writeln!(out, "Ask me anything about events and guests! Type /help for commands.")?;
    print_samples(out)?;

    loop {
        write!(out, "{PROMPT}")?;
        out.flush()?;

        let Some(line) = lines.next_line().await.context("Failed to read input")? else {
            writeln!(out)?;
            break;
        };

        match ReplCommand::parse(&line) {
            ReplCommand::Empty => {}
            ReplCommand::Ask(question) => {
                writeln!(out, "Thinking...")?;
                let result = controller.submit(&question).await;
                report(out, result, show_sources)?;
            }
            ReplCommand::Sample(number) => {
                if !controller.transcript().is_empty() {
                    writeln!(out, "{EMPTY_CHAT_ONLY}")?;
                    continue;
                }
                match sample(number) {
                    Some(sample) => {
                        writeln!(out, "{}", sample.question)?;
                        writeln!(out, "Thinking...")?;
                        let result = controller.submit(sample.question).await;
                        report(out, result, show_sources)?;
                    }
                    None => writeln!(out, "No starter question #{number}. Try /samples.")?,
                }
            }
            ReplCommand::Samples => {
                if controller.transcript().is_empty() {
                    print_samples(out)?;
                } else {
                    writeln!(out, "{EMPTY_CHAT_ONLY}")?;
                }
            }
            ReplCommand::Retry => {
                if controller.pending_question().is_some() {
                    writeln!(out, "Thinking...")?;
                }
                let result = controller.retry().await;
                report(out, result, show_sources)?;
            }
            ReplCommand::Info => print_info(out, controller)?,
            ReplCommand::Clear => {
                controller.reset();
                writeln!(out, "Chat history cleared.")?;
                print_samples(out)?;
            }
            ReplCommand::Help => print_help(out)?,
            ReplCommand::Quit => break,
            ReplCommand::Unknown(command) => {
                writeln!(out, "Unknown command: {command}. Type /help for commands.")?;
            }
        }
    }

    Ok(())
}

fn report<W: Write>(out: &mut W, result: Result<Turn, ApiError>, show_sources: bool) -> Result<()> {
    match result {
        Ok(turn) => {
            writeln!(out, "{}", turn.content())?;
            if show_sources {
                print_sources(out, &turn)?;
            }
        }
        Err(err @ ApiError::Transport(_)) => {
            writeln!(out, "{FAILURE_NOTICE}")?;
            writeln!(out, "API Error: {err}")?;
            writeln!(out, "Type /retry to send the question again.")?;
        }
        Err(err) => writeln!(out, "{err}")?,
    }
    writeln!(out)?;
    Ok(())
}

fn print_sources<W: Write>(out: &mut W, turn: &Turn) -> Result<()> {
    if turn.sources().is_empty() {
        return Ok(());
    }

    writeln!(out, "Sources:")?;
    for (idx, source) in turn.sources().iter().enumerate() {
        let flat = source.content.split_whitespace().collect::<Vec<_>>().join(" ");
        let preview = if flat.chars().count() > SOURCE_PREVIEW_CHARS {
            let cut: String = flat.chars().take(SOURCE_PREVIEW_CHARS).collect();
            format!("{cut}...")
        } else {
            flat
        };
        writeln!(out, "  [{}] {preview}", idx + 1)?;
    }
    Ok(())
}

fn print_samples<W: Write>(out: &mut W) -> Result<()> {
    writeln!(out, "Try asking:")?;
    for (idx, sample) in samples().enumerate() {
        writeln!(out, "  /{}  {}", idx + 1, sample.label)?;
    }
    Ok(())
}

fn print_info<W: Write>(out: &mut W, controller: &SessionController) -> Result<()> {
    writeln!(out, "Messages: {}", controller.message_count())?;
    if let Some(id) = controller.conversation_id() {
        let short: String = id.chars().take(8).collect();
        writeln!(out, "Conversation ID: {short}...")?;
    }
    Ok(())
}

fn print_help<W: Write>(out: &mut W) -> Result<()> {
    writeln!(out, "Commands:")?;
    writeln!(out, "  /samples   Show starter questions")?;
    writeln!(out, "  /<N>       Ask starter question N")?;
    writeln!(out, "  /retry     Re-send the last unanswered question")?;
    writeln!(out, "  /info      Show message count and conversation ID")?;
    writeln!(out, "  /clear     Clear chat history")?;
    writeln!(out, "  /quit      Exit")?;
    Ok(())
}
