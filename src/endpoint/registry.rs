//! Endpoint cursor and failure counters.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use url::Url;

use super::EndpointConfig;

/// Mutable bookkeeping shared by every operation using the registry.
#[derive(Debug, Default)]
struct RegistryState {
    /// Preferred endpoint for the next operation.
    active: usize,
    /// Recorded failures per endpoint URL.
    failures: HashMap<String, u32>,
}

/// Ordered endpoint candidates plus circuit-breaker state.
///
/// The candidate list is fixed at construction. The active cursor and the
/// failure counters are shared by every caller holding the same registry,
/// so concurrent conversations observe each other's failures. Callers that
/// need isolation construct separate registries.
///
/// Counters are only cleared by [`reset_on_success`](Self::reset_on_success);
/// an endpoint that reached its threshold stays skipped until some attempt
/// succeeds anywhere.
#[derive(Debug)]
pub struct EndpointRegistry {
    endpoints: Vec<EndpointConfig>,
    state: Mutex<RegistryState>,
}

impl EndpointRegistry {
    /// Creates a registry over the given candidates, in priority order.
    ///
    /// An empty list degrades to the single local default endpoint.
    #[must_use]
    pub fn new(endpoints: Vec<EndpointConfig>) -> Self {
        let endpoints = if endpoints.is_empty() {
            let fallback = EndpointConfig::local_default();
            tracing::warn!("No endpoints configured, falling back to {fallback}");
            vec![fallback]
        } else {
            endpoints
        };

        Self {
            endpoints,
            state: Mutex::new(RegistryState::default()),
        }
    }

    /// All candidates in priority order.
    #[must_use]
    pub fn endpoints(&self) -> &[EndpointConfig] {
        &self.endpoints
    }

    /// Number of candidates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Returns true if there are no candidates (never true after construction).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Returns the endpoint at the active cursor.
    ///
    /// Falls back to the local default endpoint if the cursor is out of range.
    #[must_use]
    pub fn current(&self) -> EndpointConfig {
        let active = self.lock().active;
        self.endpoints.get(active).cloned().unwrap_or_else(|| {
            tracing::warn!(
                "Active endpoint index {active} out of range ({} candidates), using local default",
                self.endpoints.len()
            );
            EndpointConfig::local_default()
        })
    }

    /// Moves the cursor to the next candidate.
    ///
    /// Returns `false` when the cursor wrapped back to the first candidate,
    /// meaning every candidate has had its turn this round.
    pub fn advance(&self) -> bool {
        let mut state = self.lock();
        let next = state.active + 1;
        if next >= self.endpoints.len() {
            state.active = 0;
            false
        } else {
            state.active = next;
            true
        }
    }

    /// Records a failed attempt against `url` and returns the new count.
    pub fn record_failure(&self, url: &Url) -> u32 {
        let mut state = self.lock();
        let count = state.failures.entry(url.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    /// Returns true if the endpoint has reached its failure threshold.
    #[must_use]
    pub fn should_skip(&self, config: &EndpointConfig) -> bool {
        self.failure_count(config.url()) >= config.max_retries()
    }

    /// Clears all failure counters and rewinds the cursor to the first candidate.
    pub fn reset_on_success(&self) {
        let mut state = self.lock();
        state.failures.clear();
        state.active = 0;
    }

    /// Recorded failures for `url`.
    #[must_use]
    pub fn failure_count(&self, url: &Url) -> u32 {
        self.lock().failures.get(url.as_str()).copied().unwrap_or(0)
    }

    /// Total number of endpoints with at least one recorded failure.
    #[must_use]
    pub fn failing_endpoints(&self) -> usize {
        self.lock().failures.len()
    }

    /// Current cursor position.
    #[must_use]
    pub fn active_index(&self) -> usize {
        self.lock().active
    }

    // The state is plain counters; a panic while holding the lock cannot
    // leave it inconsistent, so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    pub(crate) fn set_active_for_test(&self, index: usize) {
        self.lock().active = index;
    }
}
