//! Assembly of a [`WebhookService`].

use std::sync::Arc;
use std::time::Duration;

use super::WebhookService;
use crate::correlation::{NoopSink, PendingCallbacks, RegistrationPolicy, ResponseCorrelator};
use crate::delivery::{DeliveryAttemptController, PollResponseController};
use crate::endpoint::{BuildProfile, EndpointConfig, EndpointRegistry, order_by_priority};
use crate::inbound::EventBus;
use crate::polling::{FallbackResponse, PollingScheduler, PollingSettings};
use crate::time::TokioSleeper;

/// Builder for [`WebhookService`].
///
/// # Example
///
/// ```no_run
/// use automation_relay::endpoint::{EndpointConfig, EnvironmentTag};
/// use automation_relay::service::WebhookService;
/// use automation_relay::transport::ReqwestClient;
///
/// # fn example() -> Result<(), url::ParseError> {
/// let service = WebhookService::builder(ReqwestClient::new())
///     .with_endpoints(vec![EndpointConfig::new(
///         url::Url::parse("https://automation.example.com/webhook")?,
///         EnvironmentTag::Production,
///     )])
///     .build();
/// # let _ = service;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct WebhookServiceBuilder<H, K = NoopSink, S = TokioSleeper> {
    client: H,
    endpoints: Vec<EndpointConfig>,
    profile: BuildProfile,
    sink: K,
    sleeper: S,
    settings: PollingSettings,
    fallback: FallbackResponse,
    policy: RegistrationPolicy,
    ttl: Option<Duration>,
    bus_capacity: usize,
}

impl<H> WebhookServiceBuilder<H> {
    pub(super) fn new(client: H) -> Self {
        Self {
            client,
            endpoints: Vec::new(),
            profile: BuildProfile::current(),
            sink: NoopSink,
            sleeper: TokioSleeper,
            settings: PollingSettings::default(),
            fallback: FallbackResponse::default(),
            policy: RegistrationPolicy::default(),
            ttl: None,
            bus_capacity: EventBus::DEFAULT_CAPACITY,
        }
    }
}

impl<H, K, S> WebhookServiceBuilder<H, K, S> {
    /// Sets the endpoint candidates. They are ordered by priority on build.
    ///
    /// Without endpoints the service uses the local development endpoint.
    #[must_use]
    pub fn with_endpoints(mut self, endpoints: Vec<EndpointConfig>) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Sets the build profile used to order endpoints.
    #[must_use]
    pub const fn with_profile(mut self, profile: BuildProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Sets where processed responses are persisted.
    #[must_use]
    pub fn with_sink<K2>(self, sink: K2) -> WebhookServiceBuilder<H, K2, S> {
        WebhookServiceBuilder {
            client: self.client,
            endpoints: self.endpoints,
            profile: self.profile,
            sink,
            sleeper: self.sleeper,
            settings: self.settings,
            fallback: self.fallback,
            policy: self.policy,
            ttl: self.ttl,
            bus_capacity: self.bus_capacity,
        }
    }

    /// Sets the delay source used between poll attempts.
    #[must_use]
    pub fn with_sleeper<S2>(self, sleeper: S2) -> WebhookServiceBuilder<H, K, S2> {
        WebhookServiceBuilder {
            client: self.client,
            endpoints: self.endpoints,
            profile: self.profile,
            sink: self.sink,
            sleeper,
            settings: self.settings,
            fallback: self.fallback,
            policy: self.policy,
            ttl: self.ttl,
            bus_capacity: self.bus_capacity,
        }
    }

    /// Sets polling timing and budget.
    #[must_use]
    pub const fn with_polling(mut self, settings: PollingSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Sets the content of the timeout reply.
    #[must_use]
    pub fn with_fallback(mut self, fallback: FallbackResponse) -> Self {
        self.fallback = fallback;
        self
    }

    /// Sets what happens when a conversation is registered twice.
    #[must_use]
    pub const fn with_policy(mut self, policy: RegistrationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the age after which abandoned waiters are swept.
    #[must_use]
    pub const fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Sets how many events the in-process bus buffers per subscriber.
    #[must_use]
    pub const fn with_bus_capacity(mut self, capacity: usize) -> Self {
        self.bus_capacity = capacity;
        self
    }

    /// Builds the service.
    #[must_use]
    pub fn build(self) -> WebhookService<H, K, S> {
        let endpoints = order_by_priority(self.endpoints, self.profile);
        let registry = Arc::new(EndpointRegistry::new(endpoints));

        let mut callbacks = PendingCallbacks::new(self.policy);
        if let Some(ttl) = self.ttl {
            callbacks = callbacks.with_ttl(ttl);
        }
        let callbacks = Arc::new(callbacks);

        let correlator = Arc::new(ResponseCorrelator::with_sink(
            Arc::clone(&callbacks),
            self.sink,
        ));
        let client = Arc::new(self.client);
        let sender = DeliveryAttemptController::new(Arc::clone(&client), Arc::clone(&registry));
        let poller = Arc::new(PollResponseController::new(
            client,
            Arc::clone(&registry),
            Arc::clone(&correlator),
        ));
        let scheduler = PollingScheduler::new(Arc::clone(&poller), Arc::clone(&callbacks))
            .with_sleeper(self.sleeper)
            .with_settings(self.settings)
            .with_fallback(self.fallback);

        tracing::debug!(
            endpoints = registry.len(),
            profile = %self.profile,
            "Webhook service ready"
        );

        WebhookService {
            registry,
            callbacks,
            correlator,
            sender,
            poller,
            scheduler,
            bus: EventBus::new(self.bus_capacity),
        }
    }
}
