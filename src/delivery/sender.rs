//! Outbound send path.

use std::sync::Arc;

use serde::Serialize;
use url::Url;

use crate::endpoint::EndpointRegistry;
use crate::transport::{HttpClient, HttpRequest};

use super::DeliveryError;
use super::failover::{Failover, run_failover};

/// A payload accepted by one of the candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Endpoint that accepted the payload.
    pub endpoint: Url,
    /// Loop iterations used, skips included (1 means the first candidate accepted).
    pub attempts: u32,
}

/// Sends JSON payloads to the first healthy endpoint candidate.
///
/// Each call makes one bounded pass over the shared
/// [`EndpointRegistry`]: POST to the current candidate under its timeout;
/// on failure record it, advance, and try the next; skip candidates whose
/// failure count reached their `max_retries`. The payload reaches at most
/// one endpoint per successful call.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use automation_relay::delivery::DeliveryAttemptController;
/// use automation_relay::endpoint::{EndpointConfig, EndpointRegistry, EnvironmentTag};
/// use automation_relay::transport::ReqwestClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let registry = Arc::new(EndpointRegistry::new(vec![EndpointConfig::new(
///     url::Url::parse("https://automation.example.com/webhook")?,
///     EnvironmentTag::Production,
/// )]));
/// let sender = DeliveryAttemptController::new(ReqwestClient::new(), registry);
/// let delivery = sender.send(&serde_json::json!({"message": "hello"})).await?;
/// println!("accepted by {}", delivery.endpoint);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct DeliveryAttemptController<H> {
    client: H,
    registry: Arc<EndpointRegistry>,
}

impl<H> DeliveryAttemptController<H> {
    /// Creates a controller over a shared registry.
    #[must_use]
    pub const fn new(client: H, registry: Arc<EndpointRegistry>) -> Self {
        Self { client, registry }
    }

    /// The registry this controller walks.
    #[must_use]
    pub const fn registry(&self) -> &Arc<EndpointRegistry> {
        &self.registry
    }
}

impl<H: HttpClient> DeliveryAttemptController<H> {
    /// Serializes `payload` as JSON and delivers it.
    ///
    /// # Errors
    ///
    /// - [`DeliveryError::Serialize`] if the payload cannot be encoded
    /// - [`DeliveryError::Exhausted`] if no candidate accepted it
    pub async fn send<T: Serialize + ?Sized>(
        &self,
        payload: &T,
    ) -> Result<Delivery, DeliveryError> {
        let body = serde_json::to_vec(payload).map_err(DeliveryError::Serialize)?;
        self.send_bytes(&body).await
    }

    /// Delivers an already-encoded JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::Exhausted`] if no candidate accepted it.
    pub async fn send_bytes(&self, body: &[u8]) -> Result<Delivery, DeliveryError> {
        let outcome = run_failover(&self.client, &self.registry, "send", |endpoint| {
            HttpRequest::post_json(endpoint.url().clone(), body.to_vec())
        })
        .await;

        match outcome {
            Failover::Succeeded {
                endpoint, attempts, ..
            } => {
                tracing::debug!(
                    "Payload accepted by {} after {attempts} attempt(s)",
                    endpoint.url()
                );
                Ok(Delivery {
                    endpoint: endpoint.url().clone(),
                    attempts,
                })
            }
            Failover::Exhausted {
                attempts,
                last_error,
            } => {
                tracing::error!("All endpoint candidates failed after {attempts} attempt(s)");
                Err(DeliveryError::Exhausted {
                    attempts,
                    last_error,
                })
            }
        }
    }
}
