//! Chat session controller.
//!
//! Owns one [`Session`] and drives the request/response cycle against the
//! remote endpoint. The controller takes `&mut self` for every call that
//! reaches the network, so a session can never have two calls in flight.

use tracing::warn;

use super::client::RagClient;
use super::error::ApiError;
use crate::models::{Session, SessionState, Turn};

/// Answer recorded when the endpoint replies without one.
pub const FALLBACK_ANSWER: &str = "Sorry, I couldn't generate a response.";

/// Drives one conversation against the remote endpoint.
#[derive(Debug, Clone)]
pub struct SessionController {
    client: RagClient,
    session: Session,
}

impl SessionController {
    /// Start an empty session.
    pub fn new(client: RagClient) -> Self {
        Self {
            client,
            session: Session::new(),
        }
    }

    /// Start a session that continues a conversation the endpoint already knows.
    pub fn with_conversation_id(client: RagClient, conversation_id: impl Into<String>) -> Self {
        Self {
            client,
            session: Session::with_conversation_id(conversation_id),
        }
    }

    /// Record a question, ask the endpoint, and record its answer.
    ///
    /// On a transport failure the question stays in the transcript with no
    /// answer after it; see [`Self::retry`].
    pub async fn submit(&mut self, question: &str) -> Result<Turn, ApiError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ApiError::EmptyQuestion);
        }

        self.session.push(Turn::user(question));
        self.answer(question).await
    }

    /// Re-send the trailing unanswered question without recording it twice.
    pub async fn retry(&mut self) -> Result<Turn, ApiError> {
        let question = self
            .session
            .pending_question()
            .ok_or(ApiError::NothingToRetry)?
            .to_string();

        self.answer(&question).await
    }

    /// Drop the transcript and the continuation token.
    pub fn reset(&mut self) {
        self.session.clear();
    }

    async fn answer(&mut self, question: &str) -> Result<Turn, ApiError> {
        let reply = self
            .client
            .ask(question, self.session.conversation_id())
            .await
            .inspect_err(|e| warn!(error = %e, "endpoint call failed"))?;

        self.session.adopt_conversation_id(reply.conversation_id);

        let turn = Turn::assistant(
            reply.answer.unwrap_or_else(|| FALLBACK_ANSWER.to_string()),
            reply.sources.unwrap_or_default(),
        );
        self.session.push(turn.clone());
        Ok(turn)
    }

    pub fn transcript(&self) -> &[Turn] {
        self.session.transcript()
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.session.conversation_id()
    }

    pub fn message_count(&self) -> usize {
        self.session.len()
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn pending_question(&self) -> Option<&str> {
        self.session.pending_question()
    }

    pub const fn client(&self) -> &RagClient {
        &self.client
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn offline_controller() -> SessionController {
        // Port 9 (discard) is never contacted: every case below fails before the call.
        let client = RagClient::new("http://127.0.0.1:9/rag/chat", Duration::from_secs(1)).unwrap();
        SessionController::new(client)
    }

    #[tokio::test]
    async fn blank_question_is_rejected_without_recording() {
        let mut controller = offline_controller();
        let err = controller.submit("   \n").await.unwrap_err();
        assert!(matches!(err, ApiError::EmptyQuestion));
        assert_eq!(controller.state(), SessionState::Empty);
    }

    #[tokio::test]
    async fn retry_needs_a_pending_question() {
        let mut controller = offline_controller();
        let err = controller.retry().await.unwrap_err();
        assert!(matches!(err, ApiError::NothingToRetry));
    }

    #[test]
    fn seeded_conversation_id_is_held() {
        let client = RagClient::new("http://127.0.0.1:9/rag/chat", Duration::from_secs(1)).unwrap();
        let mut controller = SessionController::with_conversation_id(client, "abc123");
        assert_eq!(controller.conversation_id(), Some("abc123"));

        controller.reset();
        assert_eq!(controller.conversation_id(), None);
        assert_eq!(controller.state(), SessionState::Empty);
    }
}
