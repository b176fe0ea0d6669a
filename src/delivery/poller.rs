//! Inbound poll path.

use std::sync::Arc;

use serde::Deserialize;

use crate::correlation::{ResponseCorrelator, ResponseSource, WebhookResponse};
use crate::endpoint::EndpointRegistry;
use crate::transport::{HttpClient, HttpRequest, HttpResponse};

use super::failover::{Failover, run_failover};

/// Something that can be asked whether a conversation's result is ready.
///
/// Implemented by [`PollResponseController`]; the polling scheduler depends
/// only on this trait.
pub trait ResponsePoller: Send + Sync {
    /// Returns the result for `conversation_id`, or `None` if none is available yet.
    fn poll_for_response(
        &self,
        conversation_id: &str,
    ) -> impl std::future::Future<Output = Option<WebhookResponse>> + Send;
}

impl<T: ResponsePoller> ResponsePoller for Arc<T> {
    async fn poll_for_response(&self, conversation_id: &str) -> Option<WebhookResponse> {
        (**self).poll_for_response(conversation_id).await
    }
}

/// Body returned by a poll request.
#[derive(Debug, Deserialize)]
struct PollEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<WebhookResponse>,
}

/// Polls the endpoint candidates for a conversation's result.
///
/// Uses the same bounded failover pass as the send path, with GET requests
/// shaped by each endpoint's [`PollDialect`](crate::endpoint::PollDialect).
/// A 2xx answer ends the pass whether or not it carries a result; a result
/// is handed to the correlator before being returned.
#[derive(Debug)]
pub struct PollResponseController<H, K> {
    client: H,
    registry: Arc<EndpointRegistry>,
    correlator: Arc<ResponseCorrelator<K>>,
}

impl<H, K> PollResponseController<H, K> {
    /// Creates a poll controller over a shared registry and correlator.
    #[must_use]
    pub const fn new(
        client: H,
        registry: Arc<EndpointRegistry>,
        correlator: Arc<ResponseCorrelator<K>>,
    ) -> Self {
        Self {
            client,
            registry,
            correlator,
        }
    }
}

impl<H, K> PollResponseController<H, K>
where
    H: HttpClient,
    K: crate::correlation::ResponseSink,
{
    /// Asks the candidates whether `conversation_id` has a result.
    ///
    /// Returns `None` when a healthy endpoint has nothing yet and when every
    /// candidate failed; failures only show up in the registry and logs.
    pub async fn poll_for_response(&self, conversation_id: &str) -> Option<WebhookResponse> {
        let outcome = run_failover(&self.client, &self.registry, "poll", |endpoint| {
            HttpRequest::get(endpoint.poll_url(conversation_id))
        })
        .await;

        match outcome {
            Failover::Succeeded {
                endpoint, response, ..
            } => {
                let data = parse_envelope(&response, conversation_id)?;
                tracing::debug!(conversation_id, "Result available from {}", endpoint.url());
                self.correlator
                    .process_webhook_response(data.clone(), ResponseSource::Poll)
                    .await;
                Some(data)
            }
            Failover::Exhausted { attempts, .. } => {
                tracing::debug!(
                    conversation_id,
                    "Poll found no reachable endpoint after {attempts} attempt(s)"
                );
                None
            }
        }
    }
}

impl<H, K> ResponsePoller for PollResponseController<H, K>
where
    H: HttpClient,
    K: crate::correlation::ResponseSink,
{
    async fn poll_for_response(&self, conversation_id: &str) -> Option<WebhookResponse> {
        Self::poll_for_response(self, conversation_id).await
    }
}

/// Extracts the result from a 2xx poll body, if it carries one.
fn parse_envelope(response: &HttpResponse, conversation_id: &str) -> Option<WebhookResponse> {
    if response.body.iter().all(u8::is_ascii_whitespace) {
        return None;
    }

    match serde_json::from_slice::<PollEnvelope>(&response.body) {
        Ok(PollEnvelope {
            success: true,
            data: Some(data),
        }) => Some(data),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(conversation_id, "Ignoring malformed poll response: {e}");
            None
        }
    }
}
