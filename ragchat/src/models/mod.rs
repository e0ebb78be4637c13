//! Data models for chat sessions.

mod session;
mod turn;

pub use session::{Session, SessionState};
pub use turn::{Role, SourceDocument, Turn};
