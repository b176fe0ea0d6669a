//! Resolution of incoming responses to pending waiters.

use std::sync::Arc;

use super::{
    CorrelationError, NoopSink, PendingCallbacks, Registration, ResponseCallback,
    ResponseMetadata, ResponseSink, ResponseSource, WebhookResponse,
};

/// Result of processing one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A waiter was found and called.
    Delivered {
        /// Correlation key that matched
        key: String,
    },
    /// No waiter was registered for the key; the response was only persisted.
    ///
    /// Expected for late or duplicate responses, so not an error.
    Unclaimed {
        /// Correlation key that found no waiter
        key: String,
    },
}

impl Resolution {
    /// Returns true if a waiter was called.
    #[must_use]
    pub const fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }
}

/// Routes responses from any transport to the waiter for their conversation.
///
/// Every response is persisted through the sink first, then matched by
/// [`WebhookResponse::correlation_key`]. A matched waiter is removed before
/// it runs, so processing the same conversation twice calls it at most once.
#[derive(Debug)]
pub struct ResponseCorrelator<K = NoopSink> {
    callbacks: Arc<PendingCallbacks>,
    sink: K,
}

impl ResponseCorrelator<NoopSink> {
    /// Creates a correlator that does not persist responses.
    #[must_use]
    pub const fn new(callbacks: Arc<PendingCallbacks>) -> Self {
        Self::with_sink(callbacks, NoopSink)
    }
}

impl<K> ResponseCorrelator<K> {
    /// Creates a correlator persisting through `sink`.
    #[must_use]
    pub const fn with_sink(callbacks: Arc<PendingCallbacks>, sink: K) -> Self {
        Self { callbacks, sink }
    }

    /// The shared waiter map.
    #[must_use]
    pub const fn callbacks(&self) -> &Arc<PendingCallbacks> {
        &self.callbacks
    }

    /// The persistence sink.
    #[must_use]
    pub const fn sink(&self) -> &K {
        &self.sink
    }

    /// Registers a waiter for `conversation_id`.
    ///
    /// # Errors
    ///
    /// Returns [`CorrelationError::AlreadyPending`] under the reject policy
    /// when a waiter already exists.
    pub fn register_callback<F>(
        &self,
        conversation_id: impl Into<String>,
        callback: F,
    ) -> Result<Registration, CorrelationError>
    where
        F: FnOnce(WebhookResponse) + Send + 'static,
    {
        self.callbacks
            .register(conversation_id, Box::new(callback) as ResponseCallback)
    }

    /// Removes the waiter for `conversation_id`, if any. Idempotent.
    pub fn unregister_callback(&self, conversation_id: &str) -> bool {
        self.callbacks.unregister(conversation_id)
    }
}

impl<K: ResponseSink> ResponseCorrelator<K> {
    /// Persists `data` and resolves its waiter, if one is registered.
    ///
    /// Sink failures are logged and do not prevent resolution.
    pub async fn process_webhook_response(
        &self,
        data: WebhookResponse,
        source: ResponseSource,
    ) -> Resolution {
        let metadata = ResponseMetadata::from_response(&data, source);
        if let Err(e) = self
            .sink
            .save(&data.user_id, &data.response, &metadata)
            .await
        {
            tracing::error!(user_id = %data.user_id, "Failed to persist response: {e}");
        }

        let key = data.correlation_key().to_string();
        match self.callbacks.take(&key) {
            Some(callback) => {
                tracing::debug!(key = %key, %source, "Resolved pending callback");
                callback(data);
                Resolution::Delivered { key }
            }
            None => {
                tracing::info!(key = %key, %source, "No pending callback for response");
                Resolution::Unclaimed { key }
            }
        }
    }
}
