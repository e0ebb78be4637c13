//! ragchat - chat with a hosted RAG answer endpoint.
//!
//! Architecture:
//! - `chat` holds the session controller and the HTTP client for the endpoint
//! - `cli` drives one controller from a terminal (REPL or one-shot)
//! - `server` hosts many isolated controllers behind a small JSON API
//! - Nothing is persisted: sessions live only as long as the process

pub mod chat;
pub mod cli;
pub mod config;
pub mod models;
pub mod server;
