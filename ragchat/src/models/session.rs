//! Session model holding the transcript and the continuation token.

use serde::Serialize;

use super::Turn;

/// Observable lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// No turns and no token.
    Empty,
    /// Turns recorded, but the endpoint has not issued a token yet.
    Active,
    /// Turns recorded and a token is held.
    Correlated,
}

/// Ephemeral conversation state owned by one chat session.
#[derive(Debug, Clone, Default)]
pub struct Session {
    transcript: Vec<Turn>,
    conversation_id: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session that continues an existing conversation.
    pub fn with_conversation_id(conversation_id: impl Into<String>) -> Self {
        Self {
            transcript: Vec::new(),
            conversation_id: Some(conversation_id.into()),
        }
    }

    pub fn transcript(&self) -> &[Turn] {
        &self.transcript
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    pub fn len(&self) -> usize {
        self.transcript.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transcript.is_empty()
    }

    pub fn state(&self) -> SessionState {
        match (self.transcript.is_empty(), self.conversation_id.is_some()) {
            (true, false) => SessionState::Empty,
            (_, true) => SessionState::Correlated,
            (false, false) => SessionState::Active,
        }
    }

    /// The trailing user turn that has not been answered yet, if any.
    pub fn pending_question(&self) -> Option<&str> {
        self.transcript
            .last()
            .filter(|turn| turn.is_user())
            .map(Turn::content)
    }

    pub(crate) fn push(&mut self, turn: Turn) {
        self.transcript.push(turn);
    }

    /// Replace the token only when the endpoint actually sent one.
    pub(crate) fn adopt_conversation_id(&mut self, conversation_id: Option<String>) {
        if let Some(id) = conversation_id.filter(|id| !id.is_empty()) {
            self.conversation_id = Some(id);
        }
    }

    pub(crate) fn clear(&mut self) {
        self.transcript.clear();
        self.conversation_id = None;
    }
}
