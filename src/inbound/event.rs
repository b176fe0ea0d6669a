//! Inbound event shape.

use serde::{Deserialize, Serialize};

use crate::correlation::WebhookResponse;

/// Key under which a pushed response is written to a [`SharedStore`](super::SharedStore).
pub const STORAGE_KEY: &str = "webhook_response";

/// An event received on the in-process bus.
///
/// Serializes as `{"type": "webhook_response", "payload": {...}}`. Events with
/// any other type deserialize as [`InboundEvent::Other`] and are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum InboundEvent {
    /// A response from the automation backend.
    WebhookResponse(WebhookResponse),
    /// Any event type this engine does not handle.
    #[serde(other)]
    Other,
}

impl From<WebhookResponse> for InboundEvent {
    fn from(response: WebhookResponse) -> Self {
        Self::WebhookResponse(response)
    }
}
