//! The response shape produced by the automation backend.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A result for one conversation turn.
///
/// Arrives from the automation backend (poll or push) or is synthesized
/// locally when polling gives up. Field names follow the backend's JSON
/// (`camelCase`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
    /// Reply text.
    pub response: String,

    /// Follow-up prompts offered to the user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,

    /// Exercises recommended alongside the reply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exercises: Option<Vec<String>>,

    /// Owner of the conversation.
    #[serde(default)]
    pub user_id: String,

    /// Conversation the reply belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,

    /// ISO-8601 creation time.
    #[serde(default)]
    pub timestamp: String,
}

impl WebhookResponse {
    /// Key used to find the waiter: the conversation id when present and
    /// non-empty, otherwise the user id.
    #[must_use]
    pub fn correlation_key(&self) -> &str {
        self.conversation_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .unwrap_or(self.user_id.as_str())
    }
}

/// Where a processed response came from; recorded alongside persisted responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    /// Observed by polling an endpoint.
    Poll,
    /// Published on the in-process event bus.
    EventBus,
    /// Read from a shared key-value store.
    SharedStore,
    /// Handed to the service directly by application code.
    Direct,
}

impl ResponseSource {
    /// Tag string stored with persisted responses.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Poll => "poll",
            Self::EventBus => "event_bus",
            Self::SharedStore => "shared_store",
            Self::Direct => "direct",
        }
    }
}

impl fmt::Display for ResponseSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
