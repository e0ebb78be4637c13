//! HTTP client for the hosted RAG chat endpoint.

use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use super::error::TransportFailure;
use crate::models::SourceDocument;

/// Endpoint the chatbot was deployed against.
pub const DEFAULT_ENDPOINT: &str = "https://tnimcwsknw.us-east-1.awsapprunner.com/rag/chat";

/// Upper bound on a single outbound call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Body of `POST /rag/chat`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest<'a> {
    pub question: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<&'a str>,
    /// Metadata filter for the endpoint's vector search.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<&'a Map<String, Value>>,
}

/// Response of `POST /rag/chat`. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub sources: Option<Vec<SourceDocument>>,
}

/// Thin wrapper around a `reqwest::Client` bound to one endpoint.
#[derive(Debug, Clone)]
pub struct RagClient {
    http: reqwest::Client,
    endpoint: String,
    timeout: Duration,
    filter: Option<Map<String, Value>>,
}

impl RagClient {
    /// Build a client whose every call is bounded by `timeout`.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
            timeout,
            filter: None,
        })
    }

    /// Attach a metadata filter sent with every question. Empty filters are dropped.
    #[must_use]
    pub fn with_filter(mut self, filter: Map<String, Value>) -> Self {
        self.filter = (!filter.is_empty()).then_some(filter);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send one question, with the continuation token if the session holds one.
    pub async fn ask(
        &self,
        question: &str,
        conversation_id: Option<&str>,
    ) -> Result<ChatReply, TransportFailure> {
        let body = ChatRequest {
            question,
            conversation_id,
            filter: self.filter.as_ref(),
        };

        debug!(endpoint = %self.endpoint, ?conversation_id, "sending question");

        let resp = self
            .http
            .post(&self.endpoint)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| self.classify(e, TransportFailure::Network))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(TransportFailure::Status(status));
        }

        let reply: ChatReply = resp
            .json()
            .await
            .map_err(|e| self.classify(e, TransportFailure::Decode))?;

        debug!(
            answered = reply.answer.is_some(),
            conversation_id = ?reply.conversation_id,
            "received answer"
        );
        Ok(reply)
    }

    fn classify(
        &self,
        err: reqwest::Error,
        otherwise: fn(reqwest::Error) -> TransportFailure,
    ) -> TransportFailure {
        if err.is_timeout() {
            TransportFailure::Timeout(self.timeout)
        } else {
            otherwise(err)
        }
    }
}
