//! Command execution.
//!
//! Builds a [`WebhookService`] from the validated configuration and runs a
//! single `send` or `poll` command against it.

use thiserror::Error;
use tokio::signal;
use tokio::sync::oneshot;

use automation_relay::config::{Command, ValidatedConfig, defaults};
use automation_relay::correlation::{
    CorrelationError, JsonLinesSink, ResponseSink, WebhookResponse,
};
use automation_relay::delivery::{Delivery, DeliveryError};
use automation_relay::polling::PollOutcome;
use automation_relay::service::{WebhookService, WebhookServiceBuilder};
use automation_relay::transport::{HttpClient, ReqwestClient};

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;

/// Error type for runtime execution failures.
#[derive(Debug, Error)]
pub enum RunError {
    /// The `--payload` argument is not valid JSON.
    #[error("Invalid JSON payload: {0}")]
    InvalidPayload(#[source] serde_json::Error),

    /// No endpoint accepted the payload.
    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    /// Another waiter already exists for the conversation.
    #[error(transparent)]
    Registration(#[from] CorrelationError),

    /// The polling run ended without delivering anything.
    #[error("Polling for '{conversation_id}' ended without a response")]
    NoResponse {
        /// Conversation that was polled
        conversation_id: String,
    },

    /// A shutdown signal arrived before the command finished.
    #[error("Interrupted by shutdown signal")]
    Interrupted,

    /// The result could not be rendered.
    #[error("Failed to render output: {0}")]
    Output(#[source] serde_json::Error),
}

/// Executes `command` with the given configuration.
///
/// # Errors
///
/// Returns an error if:
/// - The payload is not valid JSON or no endpoint accepts it (`send`)
/// - The conversation is already being awaited or polling is interrupted (`poll`)
///
/// # Coverage Note
///
/// This function is excluded from coverage because it requires real
/// network access and signal handling.
#[cfg(not(tarpaulin_include))]
pub async fn execute(config: ValidatedConfig, command: Command) -> Result<(), RunError> {
    let builder = service_builder(ReqwestClient::new(), &config);

    if let Some(ref path) = config.transcript {
        tracing::info!("Writing response transcript to {}", path.display());
        let service = builder.with_sink(JsonLinesSink::new(path)).build();
        run_command(&service, command, config.callback_ttl.is_some()).await
    } else {
        run_command(&builder.build(), command, config.callback_ttl.is_some()).await
    }
}

/// Applies the validated configuration to a service builder.
fn service_builder<H>(client: H, config: &ValidatedConfig) -> WebhookServiceBuilder<H> {
    let mut builder = WebhookService::builder(client)
        .with_endpoints(config.endpoints.clone())
        .with_profile(config.profile)
        .with_polling(config.polling)
        .with_policy(config.policy);

    if let Some(ttl) = config.callback_ttl {
        builder = builder.with_ttl(ttl);
    }

    builder
}

#[cfg(not(tarpaulin_include))]
async fn run_command<H, K>(
    service: &WebhookService<H, K>,
    command: Command,
    sweep: bool,
) -> Result<(), RunError>
where
    H: HttpClient + 'static,
    K: ResponseSink + 'static,
{
    match command {
        Command::Init { .. } => Ok(()),
        Command::Send { payload } => {
            let delivery = send_payload(service, &payload).await?;
            println!("{}", render_delivery(&delivery));
            Ok(())
        }
        Command::Poll {
            conversation_id,
            max_attempts,
        } => {
            let sweeper = sweep.then(|| service.spawn_sweeper(defaults::sweep_interval()));

            let result =
                await_response(service, &conversation_id, max_attempts, shutdown_signal()).await;

            if let Some(sweeper) = sweeper {
                sweeper.abort();
            }

            let response = result?;
            println!("{}", render_response(&response)?);
            Ok(())
        }
    }
}

/// Parses `payload` as JSON and delivers it.
async fn send_payload<H, K>(
    service: &WebhookService<H, K>,
    payload: &str,
) -> Result<Delivery, RunError>
where
    H: HttpClient,
    K: ResponseSink,
{
    let value: serde_json::Value =
        serde_json::from_str(payload).map_err(RunError::InvalidPayload)?;

    let delivery = service.send_to_webhook(&value).await?;
    tracing::info!(
        "Delivered to {} after {} attempt(s)",
        delivery.endpoint,
        delivery.attempts
    );
    Ok(delivery)
}

/// Polls for `conversation_id` until a response (or the fallback) arrives.
///
/// Stops the run and returns [`RunError::Interrupted`] if `shutdown`
/// completes first.
async fn await_response<H, K>(
    service: &WebhookService<H, K>,
    conversation_id: &str,
    max_attempts: Option<u32>,
    shutdown: impl Future<Output = ()>,
) -> Result<WebhookResponse, RunError>
where
    H: HttpClient + 'static,
    K: ResponseSink + 'static,
{
    let (tx, rx) = oneshot::channel();
    let callback = move |response: WebhookResponse| {
        // Receiver gone means the command was interrupted.
        let _ = tx.send(response);
    };

    let handle = match max_attempts {
        Some(n) => service.start_polling_with_attempts(conversation_id, callback, n)?,
        None => service.start_polling(conversation_id, callback)?,
    };
    tracing::info!("Polling for conversation '{conversation_id}'");

    tokio::pin!(shutdown);
    let received = tokio::select! {
        biased;

        () = &mut shutdown => {
            tracing::info!("Shutdown signal received, stopping...");
            handle.stop();
            return Err(RunError::Interrupted);
        }

        received = rx => received,
    };

    match handle.join().await {
        PollOutcome::TimedOut => {
            tracing::warn!("No response for '{conversation_id}' in time, using fallback reply");
        }
        PollOutcome::Resolved | PollOutcome::Cancelled => {}
    }

    received.map_err(|_| RunError::NoResponse {
        conversation_id: conversation_id.to_string(),
    })
}

/// One-line JSON summary of a successful delivery.
fn render_delivery(delivery: &Delivery) -> serde_json::Value {
    serde_json::json!({
        "endpoint": delivery.endpoint.as_str(),
        "attempts": delivery.attempts,
    })
}

fn render_response(response: &WebhookResponse) -> Result<String, RunError> {
    serde_json::to_string_pretty(response).map_err(RunError::Output)
}

/// Returns a future that completes when a shutdown signal is received.
///
/// If a handler cannot be installed, that signal source never fires.
///
/// Excluded from coverage - requires OS signal handling.
#[cfg(not(tarpaulin_include))]
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
