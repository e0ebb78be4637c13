//! CLI argument parsing and command execution.

mod args;
mod commands;
mod repl;

pub use args::{Cli, Commands};
pub use commands::{execute, run_ask, AskOptions};
pub use repl::{run_repl, ReplCommand};
