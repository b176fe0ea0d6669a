//! Feeds pushed responses into the correlator.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_stream::{Stream, StreamExt};

use super::{InboundEvent, STORAGE_KEY, SharedStore, StoreError};
use crate::correlation::{
    NoopSink, Resolution, ResponseCorrelator, ResponseSink, ResponseSource, WebhookResponse,
};

/// Bridges out-of-band transports to [`ResponseCorrelator::process_webhook_response`].
///
/// The adapter holds no state of its own; any number of adapters may feed
/// the same correlator.
#[derive(Debug)]
pub struct InboundTransportAdapter<K = NoopSink> {
    correlator: Arc<ResponseCorrelator<K>>,
}

impl<K> Clone for InboundTransportAdapter<K> {
    fn clone(&self) -> Self {
        Self {
            correlator: Arc::clone(&self.correlator),
        }
    }
}

impl<K> InboundTransportAdapter<K> {
    /// Creates an adapter feeding `correlator`.
    #[must_use]
    pub const fn new(correlator: Arc<ResponseCorrelator<K>>) -> Self {
        Self { correlator }
    }
}

impl<K: ResponseSink> InboundTransportAdapter<K> {
    /// Processes one bus event. Returns `None` for event types that are ignored.
    pub async fn handle_event(&self, event: InboundEvent) -> Option<Resolution> {
        match event {
            InboundEvent::WebhookResponse(response) => Some(
                self.correlator
                    .process_webhook_response(response, ResponseSource::EventBus)
                    .await,
            ),
            InboundEvent::Other => {
                tracing::debug!("Ignoring inbound event of unhandled type");
                None
            }
        }
    }

    /// Processes events until the stream ends.
    ///
    /// Returns the number of responses processed.
    pub async fn run<St>(&self, mut events: St) -> usize
    where
        St: Stream<Item = InboundEvent> + Unpin,
    {
        let mut processed = 0;
        while let Some(event) = events.next().await {
            if self.handle_event(event).await.is_some() {
                processed += 1;
            }
        }
        tracing::debug!("Inbound event stream ended after {processed} response(s)");
        processed
    }

    /// Consumes the response waiting under [`STORAGE_KEY`], if any.
    ///
    /// A value that is not a valid response is discarded with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be read.
    pub async fn drain_store<S: SharedStore>(
        &self,
        store: &S,
    ) -> Result<Option<Resolution>, StoreError> {
        let Some(raw) = store.take(STORAGE_KEY).await? else {
            return Ok(None);
        };

        match serde_json::from_str::<WebhookResponse>(&raw) {
            Ok(response) => Ok(Some(
                self.correlator
                    .process_webhook_response(response, ResponseSource::SharedStore)
                    .await,
            )),
            Err(e) => {
                tracing::warn!("Discarding malformed value under '{STORAGE_KEY}': {e}");
                Ok(None)
            }
        }
    }

    /// Checks `store` every `interval` until `stop` completes.
    ///
    /// Read errors are logged and checking continues. Returns the number of
    /// responses processed.
    pub async fn watch_store<S, F>(&self, store: &S, interval: Duration, stop: F) -> usize
    where
        S: SharedStore,
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(stop);

        let mut processed = 0;
        loop {
            tokio::select! {
                biased;

                () = &mut stop => {
                    tracing::debug!("Store watch stopped after {processed} response(s)");
                    return processed;
                }

                _ = ticker.tick() => {
                    match self.drain_store(store).await {
                        Ok(Some(_)) => processed += 1,
                        Ok(None) => {}
                        Err(e) => tracing::warn!("Failed to read shared store: {e}"),
                    }
                }
            }
        }
    }
}
