//! In-process broadcast of inbound events.

use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::{Stream, StreamExt};

use super::InboundEvent;
use crate::correlation::WebhookResponse;

/// Broadcast bus for events pushed within this process.
///
/// Every subscriber sees every event published after it subscribed. A
/// subscriber that falls more than the capacity behind skips the oldest
/// events and a warning is logged.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<InboundEvent>,
}

impl EventBus {
    /// Default number of events buffered per subscriber.
    pub const DEFAULT_CAPACITY: usize = 64;

    /// Creates a bus buffering up to `capacity` events per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event. Returns the number of subscribers it reached.
    pub fn publish(&self, event: InboundEvent) -> usize {
        self.sender.send(event).unwrap_or_else(|_| {
            tracing::debug!("Inbound event dropped: no subscribers");
            0
        })
    }

    /// Publishes a response as a `webhook_response` event.
    pub fn publish_response(&self, response: WebhookResponse) -> usize {
        self.publish(InboundEvent::WebhookResponse(response))
    }

    /// Subscribes to events published from now on.
    ///
    /// The stream ends when every handle to the bus has been dropped.
    pub fn subscribe(&self) -> impl Stream<Item = InboundEvent> + Send + Unpin + 'static {
        BroadcastStream::new(self.sender.subscribe()).filter_map(|item| match item {
            Ok(event) => Some(event),
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                tracing::warn!("Inbound subscriber lagged, {skipped} event(s) skipped");
                None
            }
        })
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
