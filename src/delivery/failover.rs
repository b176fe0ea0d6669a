//! The failover loop shared by the send and poll paths.

use std::time::Duration;

use crate::endpoint::{EndpointConfig, EndpointRegistry};
use crate::transport::{HttpClient, HttpError, HttpRequest, HttpResponse};

use super::AttemptError;

/// Longest error body kept in an [`AttemptError`], in characters.
const ERROR_BODY_LIMIT: usize = 256;

/// Outcome of one pass over the candidates.
#[derive(Debug)]
pub(crate) enum Failover {
    /// Some endpoint returned 2xx.
    Succeeded {
        endpoint: EndpointConfig,
        response: HttpResponse,
        attempts: u32,
    },
    /// The attempt budget ran out or the cursor completed a full cycle.
    Exhausted {
        attempts: u32,
        last_error: Option<AttemptError>,
    },
}

/// Executes one attempt, cancelling it after `timeout`.
pub(crate) async fn execute_attempt<H: HttpClient>(
    client: &H,
    request: HttpRequest,
    timeout: Duration,
) -> Result<HttpResponse, AttemptError> {
    let response = tokio::time::timeout(timeout, client.request(request))
        .await
        .map_err(|_| HttpError::Timeout)??;

    if response.is_success() {
        return Ok(response);
    }

    Err(AttemptError::NonSuccessStatus {
        status: response.status,
        body: response.body_excerpt(ERROR_BODY_LIMIT),
    })
}

/// Walks the registry from its cursor until an attempt succeeds.
///
/// At most `registry.len()` iterations run; a skipped candidate uses an
/// iteration just like a failed one. The loop also stops as soon as the
/// cursor wraps. Success resets the registry; failure records against the
/// endpoint and advances.
pub(crate) async fn run_failover<H, B>(
    client: &H,
    registry: &EndpointRegistry,
    operation: &'static str,
    build_request: B,
) -> Failover
where
    H: HttpClient,
    B: Fn(&EndpointConfig) -> HttpRequest,
{
    let budget = u32::try_from(registry.len()).unwrap_or(u32::MAX);
    let mut attempts = 0;
    let mut last_error = None;

    while attempts < budget {
        let endpoint = registry.current();
        attempts += 1;

        if registry.should_skip(&endpoint) {
            tracing::debug!(
                operation,
                "Skipping {}: {} failure(s) recorded",
                endpoint.url(),
                registry.failure_count(endpoint.url())
            );
            if !registry.advance() {
                break;
            }
            continue;
        }

        let request = build_request(&endpoint);
        match execute_attempt(client, request, endpoint.timeout()).await {
            Ok(response) => {
                registry.reset_on_success();
                return Failover::Succeeded {
                    endpoint,
                    response,
                    attempts,
                };
            }
            Err(e) => {
                let failures = registry.record_failure(endpoint.url());
                tracing::warn!(
                    operation,
                    "Attempt {attempts} against {} failed ({failures} recorded): {e}",
                    endpoint.url()
                );
                last_error = Some(e);
                if !registry.advance() {
                    break;
                }
            }
        }
    }

    Failover::Exhausted {
        attempts,
        last_error,
    }
}
