//! Turn model representing one message in a conversation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a turn's author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Question typed by the user.
    User,
    /// Answer produced by the remote endpoint.
    Assistant,
}

impl Role {
    /// Convert role to its wire/display string.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    /// Parse role from a string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Self::User),
            "assistant" => Some(Self::Assistant),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A source document the endpoint cited for an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDocument {
    /// Retrieved passage.
    #[serde(default)]
    pub content: String,
    /// Arbitrary metadata attached to the passage.
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// One message in the transcript. Immutable once created.
#[derive(Debug, Clone, Serialize)]
pub struct Turn {
    role: Role,
    content: String,
    created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    sources: Vec<SourceDocument>,
}

impl Turn {
    /// Create a user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            created_at: Utc::now(),
            sources: Vec::new(),
        }
    }

    /// Create an assistant turn with the sources it was grounded on.
    pub fn assistant(content: impl Into<String>, sources: Vec<SourceDocument>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            created_at: Utc::now(),
            sources,
        }
    }

    pub const fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn sources(&self) -> &[SourceDocument] {
        &self.sources
    }

    pub const fn is_user(&self) -> bool {
        matches!(self.role, Role::User)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_str() {
        assert_eq!(Role::from_str(Role::User.as_str()), Some(Role::User));
        assert_eq!(Role::from_str("assistant"), Some(Role::Assistant));
        assert_eq!(Role::from_str("system"), None);
    }

    #[test]
    fn serializes_role_lowercase_and_omits_empty_sources() {
        let value = serde_json::to_value(Turn::user("hello")).unwrap();
        assert_eq!(value["role"], "user");
        assert_eq!(value["content"], "hello");
        assert!(value.get("sources").is_none());
    }

    #[test]
    fn assistant_turn_keeps_sources() {
        let source = SourceDocument {
            content: "ETHGlobal Brussels".to_string(),
            metadata: serde_json::Map::new(),
        };
        let turn = Turn::assistant("try ETHGlobal", vec![source.clone()]);
        assert!(!turn.is_user());
        assert_eq!(turn.sources(), &[source]);
    }
}
