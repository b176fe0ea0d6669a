//! Repeated polling with a bounded attempt budget.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::task::JoinHandle;

use super::{FallbackResponse, PollingSettings};
use crate::correlation::{
    CorrelationError, PendingCallbacks, Registration, ResponseCallback, WebhookResponse,
};
use crate::delivery::ResponsePoller;
use crate::time::{Clock, Sleeper, SystemClock, TokioSleeper, iso8601};

/// How a polling run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The waiter received a real response, from polling or another transport.
    Resolved,
    /// The budget ran out and the waiter received the fallback response.
    TimedOut,
    /// The run was stopped before the waiter was resolved.
    Cancelled,
}

/// Control over one polling run.
///
/// Dropping the handle does not stop the run.
#[derive(Debug)]
pub struct PollHandle {
    registration: Registration,
    active: Arc<AtomicBool>,
    callbacks: Arc<PendingCallbacks>,
    task: JoinHandle<PollOutcome>,
}

impl PollHandle {
    /// Conversation being polled.
    #[must_use]
    pub fn conversation_id(&self) -> &str {
        self.registration.conversation_id()
    }

    /// Returns true while the run has not been stopped and has not finished.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst) && !self.task.is_finished()
    }

    /// Stops the run and withdraws its waiter.
    ///
    /// No further polls are issued and the callback is not invoked afterwards.
    /// Idempotent; a waiter registered later for the same conversation is
    /// left alone.
    pub fn stop(&self) {
        if self.active.swap(false, Ordering::SeqCst) {
            self.callbacks.unregister_registration(&self.registration);
            tracing::debug!(
                conversation_id = %self.registration.conversation_id(),
                "Polling stopped"
            );
        }
    }

    /// Waits for the run to end.
    pub async fn join(self) -> PollOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(
                    conversation_id = %self.registration.conversation_id(),
                    "Polling task failed: {e}"
                );
                PollOutcome::Cancelled
            }
        }
    }
}

/// Drives polling for conversations that await an asynchronous result.
///
/// Each run registers a waiter, waits the initial delay, then polls once per
/// interval until the waiter is resolved, the run is stopped, or the attempt
/// budget is spent. On exhaustion the waiter receives a fallback response
/// instead of the real one.
pub struct PollingScheduler<P, S = TokioSleeper> {
    poller: Arc<P>,
    callbacks: Arc<PendingCallbacks>,
    sleeper: S,
    clock: Arc<dyn Clock>,
    settings: PollingSettings,
    fallback: Arc<FallbackResponse>,
}

impl<P, S: std::fmt::Debug> std::fmt::Debug for PollingScheduler<P, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollingScheduler")
            .field("callbacks", &self.callbacks)
            .field("sleeper", &self.sleeper)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl<P> PollingScheduler<P, TokioSleeper> {
    /// Creates a scheduler with default settings, real delays and the system clock.
    #[must_use]
    pub fn new(poller: Arc<P>, callbacks: Arc<PendingCallbacks>) -> Self {
        Self {
            poller,
            callbacks,
            sleeper: TokioSleeper,
            clock: Arc::new(SystemClock),
            settings: PollingSettings::default(),
            fallback: Arc::new(FallbackResponse::default()),
        }
    }
}

impl<P, S> PollingScheduler<P, S> {
    /// Replaces the delay source.
    #[must_use]
    pub fn with_sleeper<S2>(self, sleeper: S2) -> PollingScheduler<P, S2> {
        PollingScheduler {
            poller: self.poller,
            callbacks: self.callbacks,
            sleeper,
            clock: self.clock,
            settings: self.settings,
            fallback: self.fallback,
        }
    }

    /// Replaces the clock used to timestamp fallback responses.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Replaces the timing settings.
    #[must_use]
    pub const fn with_settings(mut self, settings: PollingSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Replaces the fallback content.
    #[must_use]
    pub fn with_fallback(mut self, fallback: FallbackResponse) -> Self {
        self.fallback = Arc::new(fallback);
        self
    }

    /// Timing settings in effect.
    #[must_use]
    pub const fn settings(&self) -> &PollingSettings {
        &self.settings
    }
}

impl<P, S> PollingScheduler<P, S>
where
    P: ResponsePoller + 'static,
    S: Sleeper + Clone + 'static,
{
    /// Starts polling `conversation_id` with the configured attempt budget.
    ///
    /// # Errors
    ///
    /// Returns [`CorrelationError::AlreadyPending`] if the conversation already
    /// has a waiter and the registration policy rejects duplicates.
    pub fn start_polling<F>(
        &self,
        conversation_id: impl Into<String>,
        callback: F,
    ) -> Result<PollHandle, CorrelationError>
    where
        F: FnOnce(WebhookResponse) + Send + 'static,
    {
        self.start_polling_with_attempts(conversation_id, callback, self.settings.max_attempts)
    }

    /// Starts polling `conversation_id` with an explicit attempt budget.
    ///
    /// A budget of zero still performs one attempt.
    ///
    /// # Errors
    ///
    /// Returns [`CorrelationError::AlreadyPending`] if the conversation already
    /// has a waiter and the registration policy rejects duplicates.
    pub fn start_polling_with_attempts<F>(
        &self,
        conversation_id: impl Into<String>,
        callback: F,
        max_attempts: u32,
    ) -> Result<PollHandle, CorrelationError>
    where
        F: FnOnce(WebhookResponse) + Send + 'static,
    {
        let registration = self
            .callbacks
            .register(conversation_id, Box::new(callback) as ResponseCallback)?;
        let active = Arc::new(AtomicBool::new(true));

        tracing::info!(
            conversation_id = %registration.conversation_id(),
            max_attempts,
            "Polling started"
        );

        let run = PollRun {
            poller: Arc::clone(&self.poller),
            callbacks: Arc::clone(&self.callbacks),
            sleeper: self.sleeper.clone(),
            clock: Arc::clone(&self.clock),
            fallback: Arc::clone(&self.fallback),
            settings: self.settings.with_max_attempts(max_attempts.max(1)),
            registration: registration.clone(),
            active: Arc::clone(&active),
        };
        let task = tokio::spawn(run.execute());

        Ok(PollHandle {
            registration,
            active,
            callbacks: Arc::clone(&self.callbacks),
            task,
        })
    }
}

/// What a finishing run found when it went to resolve its waiter.
enum Claim {
    /// The run had been stopped.
    Stopped,
    /// The waiter is now owned by the run.
    Waiter(ResponseCallback),
    /// The waiter was already resolved or withdrawn.
    Gone,
}

/// State owned by one spawned polling task.
struct PollRun<P, S> {
    poller: Arc<P>,
    callbacks: Arc<PendingCallbacks>,
    sleeper: S,
    clock: Arc<dyn Clock>,
    fallback: Arc<FallbackResponse>,
    settings: PollingSettings,
    registration: Registration,
    active: Arc<AtomicBool>,
}

impl<P: ResponsePoller, S: Sleeper> PollRun<P, S> {
    async fn execute(self) -> PollOutcome {
        let conversation_id = self.registration.conversation_id();
        self.sleeper.sleep(self.settings.initial_delay).await;

        for attempt in 1..=self.settings.max_attempts {
            if attempt > 1 {
                self.sleeper.sleep(self.settings.interval).await;
            }

            if let Some(outcome) = self.interrupted() {
                return outcome;
            }

            tracing::debug!(
                conversation_id,
                "Poll attempt {attempt}/{}",
                self.settings.max_attempts
            );

            if let Some(response) = self.poller.poll_for_response(conversation_id).await {
                if let Some(other) = foreign_conversation(&response, conversation_id) {
                    tracing::warn!(
                        conversation_id,
                        other,
                        "Poll returned another conversation's result; still waiting"
                    );
                    continue;
                }

                // The poller routes results through the correlator. A result
                // keyed by user id never reaches this waiter; deliver it here.
                match self.claim() {
                    Claim::Stopped => return PollOutcome::Cancelled,
                    Claim::Waiter(callback) => callback(response),
                    Claim::Gone => {}
                }
                tracing::info!(conversation_id, attempt, "Polling resolved");
                return PollOutcome::Resolved;
            }
        }

        if let Some(outcome) = self.interrupted() {
            return outcome;
        }
        match self.claim() {
            Claim::Stopped => PollOutcome::Cancelled,
            Claim::Waiter(callback) => {
                tracing::warn!(
                    conversation_id,
                    "No response after {} attempt(s); delivering fallback",
                    self.settings.max_attempts
                );
                let timestamp = iso8601(self.clock.now());
                callback(self.fallback.build(conversation_id, timestamp));
                PollOutcome::TimedOut
            }
            Claim::Gone => PollOutcome::Resolved,
        }
    }

    /// Returns the outcome if the run should end before the next poll.
    fn interrupted(&self) -> Option<PollOutcome> {
        if !self.active.load(Ordering::SeqCst) {
            return Some(PollOutcome::Cancelled);
        }
        if !self.callbacks.is_pending(&self.registration) {
            tracing::debug!(
                conversation_id = %self.registration.conversation_id(),
                "Waiter resolved elsewhere; polling ends"
            );
            self.active.store(false, Ordering::SeqCst);
            return Some(PollOutcome::Resolved);
        }
        None
    }

    /// Ends the run and takes its waiter if it is still pending.
    fn claim(&self) -> Claim {
        if !self.active.swap(false, Ordering::SeqCst) {
            return Claim::Stopped;
        }
        self.callbacks
            .take_registration(&self.registration)
            .map_or(Claim::Gone, Claim::Waiter)
    }
}

/// The explicit conversation id of `response`, if it names a different conversation.
fn foreign_conversation<'a>(response: &'a WebhookResponse, polled: &str) -> Option<&'a str> {
    response
        .conversation_id
        .as_deref()
        .filter(|id| !id.is_empty() && *id != polled)
}
