//! The [`WebhookService`] facade.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;

use super::WebhookServiceBuilder;
use crate::correlation::{
    CorrelationError, NoopSink, PendingCallbacks, Registration, Resolution, ResponseCorrelator,
    ResponseSink, ResponseSource, WebhookResponse,
};
use crate::delivery::{Delivery, DeliveryAttemptController, DeliveryError, PollResponseController};
use crate::endpoint::EndpointRegistry;
use crate::inbound::{EventBus, InboundTransportAdapter};
use crate::polling::{PollHandle, PollingScheduler};
use crate::time::{Sleeper, TokioSleeper};
use crate::transport::HttpClient;

type SharedPoller<H, K> = PollResponseController<Arc<H>, K>;

/// Sends events to the automation backend and routes its replies back.
///
/// One service owns one endpoint registry, one waiter map and one in-process
/// event bus; every operation on it shares them.
///
/// # Type Parameters
///
/// * `H` - The [`HttpClient`] used for all requests
/// * `K` - The [`ResponseSink`] processed responses are saved to
/// * `S` - The [`Sleeper`] used between poll attempts
pub struct WebhookService<H, K = NoopSink, S = TokioSleeper> {
    pub(super) registry: Arc<EndpointRegistry>,
    pub(super) callbacks: Arc<PendingCallbacks>,
    pub(super) correlator: Arc<ResponseCorrelator<K>>,
    pub(super) sender: DeliveryAttemptController<Arc<H>>,
    pub(super) poller: Arc<SharedPoller<H, K>>,
    pub(super) scheduler: PollingScheduler<SharedPoller<H, K>, S>,
    pub(super) bus: EventBus,
}

impl<H, K, S: std::fmt::Debug> std::fmt::Debug for WebhookService<H, K, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookService")
            .field("registry", &self.registry)
            .field("callbacks", &self.callbacks)
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}

impl<H> WebhookService<H> {
    /// Starts building a service around `client`.
    #[must_use]
    pub fn builder(client: H) -> WebhookServiceBuilder<H> {
        WebhookServiceBuilder::new(client)
    }
}

impl<H, K, S> WebhookService<H, K, S> {
    /// The shared endpoint registry.
    #[must_use]
    pub const fn registry(&self) -> &Arc<EndpointRegistry> {
        &self.registry
    }

    /// The shared waiter map.
    #[must_use]
    pub const fn callbacks(&self) -> &Arc<PendingCallbacks> {
        &self.callbacks
    }

    /// The correlator, for feeding responses with a specific source tag.
    #[must_use]
    pub const fn correlator(&self) -> &Arc<ResponseCorrelator<K>> {
        &self.correlator
    }

    /// The in-process bus that pushed responses can be published on.
    #[must_use]
    pub const fn event_bus(&self) -> &EventBus {
        &self.bus
    }

    /// An adapter feeding this service's correlator.
    #[must_use]
    pub fn inbound_adapter(&self) -> InboundTransportAdapter<K> {
        InboundTransportAdapter::new(Arc::clone(&self.correlator))
    }

    /// Registers a waiter for `conversation_id` without polling.
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
        self.correlator.register_callback(conversation_id, callback)
    }

    /// Removes the waiter for `conversation_id`, if any. Idempotent.
    pub fn unregister_callback(&self, conversation_id: &str) -> bool {
        self.correlator.unregister_callback(conversation_id)
    }

    /// Periodically drops waiters older than the configured TTL.
    ///
    /// Does nothing useful without a TTL. The task runs until aborted.
    pub fn spawn_sweeper(&self, interval: Duration) -> JoinHandle<()> {
        if self.callbacks.ttl().is_none() {
            tracing::warn!("Sweeper started without a callback TTL; nothing will expire");
        }

        let callbacks = Arc::clone(&self.callbacks);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let swept = callbacks.sweep_expired();
                if swept > 0 {
                    tracing::info!("Swept {swept} abandoned callback(s)");
                }
            }
        })
    }
}

impl<H, K, S> WebhookService<H, K, S>
where
    H: HttpClient,
    K: ResponseSink,
{
    /// Delivers `payload` as JSON to the first healthy endpoint.
    ///
    /// # Errors
    ///
    /// - [`DeliveryError::Serialize`] if the payload cannot be encoded
    /// - [`DeliveryError::Exhausted`] if no candidate accepted it
    pub async fn send_to_webhook<T: Serialize + ?Sized>(
        &self,
        payload: &T,
    ) -> Result<Delivery, DeliveryError> {
        self.sender.send(payload).await
    }

    /// Polls once for `conversation_id`'s result.
    ///
    /// A result is also routed to any waiter registered for it.
    pub async fn poll_for_response(&self, conversation_id: &str) -> Option<WebhookResponse> {
        self.poller.poll_for_response(conversation_id).await
    }

    /// Resolves the waiter for a response received outside this service.
    pub async fn process_webhook_response(&self, data: WebhookResponse) -> Resolution {
        self.correlator
            .process_webhook_response(data, ResponseSource::Direct)
            .await
    }
}

impl<H, K, S> WebhookService<H, K, S>
where
    H: HttpClient + 'static,
    K: ResponseSink + 'static,
    S: Sleeper + Clone + 'static,
{
    /// Polls for `conversation_id` until resolved, stopped, or out of attempts.
    ///
    /// # Errors
    ///
    /// Returns [`CorrelationError::AlreadyPending`] under the reject policy
    /// when a waiter already exists.
    pub fn start_polling<F>(
        &self,
        conversation_id: impl Into<String>,
        callback: F,
    ) -> Result<PollHandle, CorrelationError>
    where
        F: FnOnce(WebhookResponse) + Send + 'static,
    {
        self.scheduler.start_polling(conversation_id, callback)
    }

    /// Like [`start_polling`](Self::start_polling) with an explicit attempt budget.
    ///
    /// # Errors
    ///
    /// Returns [`CorrelationError::AlreadyPending`] under the reject policy
    /// when a waiter already exists.
    pub fn start_polling_with_attempts<F>(
        &self,
        conversation_id: impl Into<String>,
        callback: F,
        max_attempts: u32,
    ) -> Result<PollHandle, CorrelationError>
    where
        F: FnOnce(WebhookResponse) + Send + 'static,
    {
        self.scheduler
            .start_polling_with_attempts(conversation_id, callback, max_attempts)
    }

    /// Feeds events published on [`event_bus`](Self::event_bus) into the correlator.
    ///
    /// The task ends when the service and every clone of its bus are dropped.
    /// Returns the number of responses processed.
    pub fn spawn_event_pump(&self) -> JoinHandle<usize> {
        let adapter = self.inbound_adapter();
        let events = self.bus.subscribe();
        tokio::spawn(async move { adapter.run(events).await })
    }
}
