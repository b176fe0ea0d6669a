//! Per-conversation waiter map.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use super::{CorrelationError, WebhookResponse};

/// A one-shot waiter for a conversation's response.
///
/// `FnOnce` guarantees a callback can run at most once; the map removes it
/// before running it.
pub type ResponseCallback = Box<dyn FnOnce(WebhookResponse) + Send + 'static>;

/// What to do when registering for a conversation that already has a waiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegistrationPolicy {
    /// Refuse the new registration; the existing waiter stays.
    #[default]
    Reject,
    /// Drop the existing waiter (it will never be called) and install the new one.
    Replace,
}

impl std::str::FromStr for RegistrationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "replace" => Ok(Self::Replace),
            other => Err(format!(
                "unknown registration policy '{other}': expected reject or replace"
            )),
        }
    }
}

/// Proof of a specific registration.
///
/// Removals made through a `Registration` only affect the entry it created,
/// never a later waiter registered under the same conversation id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    conversation_id: String,
    token: u64,
}

impl Registration {
    /// Conversation this registration waits on.
    #[must_use]
    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }
}

struct PendingEntry {
    token: u64,
    callback: ResponseCallback,
    registered_at: Instant,
}

/// Map from conversation id to its pending waiter.
///
/// At most one entry exists per conversation. Entries leave the map when
/// resolved, when unregistered, or when swept after their TTL.
pub struct PendingCallbacks {
    entries: Mutex<HashMap<String, PendingEntry>>,
    next_token: AtomicU64,
    policy: RegistrationPolicy,
    ttl: Option<Duration>,
}

impl fmt::Debug for PendingCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingCallbacks")
            .field("pending", &self.len())
            .field("policy", &self.policy)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl Default for PendingCallbacks {
    fn default() -> Self {
        Self::new(RegistrationPolicy::default())
    }
}

impl PendingCallbacks {
    /// Creates an empty map with the given registration policy and no TTL.
    #[must_use]
    pub fn new(policy: RegistrationPolicy) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            next_token: AtomicU64::new(1),
            policy,
            ttl: None,
        }
    }

    /// Sets the age after which [`sweep_expired`](Self::sweep_expired) drops entries.
    #[must_use]
    pub const fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Registration policy in effect.
    #[must_use]
    pub const fn policy(&self) -> RegistrationPolicy {
        self.policy
    }

    /// Configured TTL, if any.
    #[must_use]
    pub const fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Registers a waiter for `conversation_id`.
    ///
    /// # Errors
    ///
    /// Returns [`CorrelationError::AlreadyPending`] if a waiter exists and the
    /// policy is [`RegistrationPolicy::Reject`].
    pub fn register(
        &self,
        conversation_id: impl Into<String>,
        callback: ResponseCallback,
    ) -> Result<Registration, CorrelationError> {
        let conversation_id = conversation_id.into();
        let mut entries = self.lock();

        if entries.contains_key(&conversation_id) {
            match self.policy {
                RegistrationPolicy::Reject => {
                    return Err(CorrelationError::AlreadyPending { conversation_id });
                }
                RegistrationPolicy::Replace => {
                    tracing::warn!(
                        conversation_id = %conversation_id,
                        "Replacing pending callback; the earlier waiter will not be called"
                    );
                }
            }
        }

        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let replaced = entries.insert(
            conversation_id.clone(),
            PendingEntry {
                token,
                callback,
                registered_at: Instant::now(),
            },
        );
        drop(entries);
        drop(replaced);

        Ok(Registration {
            conversation_id,
            token,
        })
    }

    /// Removes whatever waiter is registered for `conversation_id`.
    ///
    /// Idempotent. Returns true if an entry was removed.
    pub fn unregister(&self, conversation_id: &str) -> bool {
        self.lock().remove(conversation_id).is_some()
    }

    /// Removes the entry created by `registration`, if it is still pending.
    pub fn unregister_registration(&self, registration: &Registration) -> bool {
        self.take_registration(registration).is_some()
    }

    /// Removes and returns the waiter for `conversation_id`.
    ///
    /// The caller becomes responsible for invoking it.
    #[must_use]
    pub fn take(&self, conversation_id: &str) -> Option<ResponseCallback> {
        self.lock().remove(conversation_id).map(|e| e.callback)
    }

    /// Removes and returns the waiter created by `registration`, if still pending.
    #[must_use]
    pub fn take_registration(&self, registration: &Registration) -> Option<ResponseCallback> {
        let mut entries = self.lock();
        match entries.get(&registration.conversation_id) {
            Some(entry) if entry.token == registration.token => entries
                .remove(&registration.conversation_id)
                .map(|e| e.callback),
            _ => None,
        }
    }

    /// Returns true if the entry created by `registration` is still pending.
    #[must_use]
    pub fn is_pending(&self, registration: &Registration) -> bool {
        self.lock()
            .get(&registration.conversation_id)
            .is_some_and(|e| e.token == registration.token)
    }

    /// Returns true if any waiter is registered for `conversation_id`.
    #[must_use]
    pub fn contains(&self, conversation_id: &str) -> bool {
        self.lock().contains_key(conversation_id)
    }

    /// Number of pending waiters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drops entries older than the TTL without invoking them.
    ///
    /// Returns the number of entries dropped. Does nothing without a TTL.
    pub fn sweep_expired(&self) -> usize {
        let Some(ttl) = self.ttl else {
            return 0;
        };

        let now = Instant::now();
        let expired: Vec<(String, PendingEntry)> = {
            let mut entries = self.lock();
            let keys: Vec<String> = entries
                .iter()
                .filter(|(_, e)| now.duration_since(e.registered_at) >= ttl)
                .map(|(k, _)| k.clone())
                .collect();
            keys.into_iter()
                .filter_map(|k| entries.remove(&k).map(|e| (k, e)))
                .collect()
        };

        for (conversation_id, _) in &expired {
            tracing::warn!(
                conversation_id = %conversation_id,
                "Dropping abandoned callback after {}s",
                ttl.as_secs()
            );
        }

        // Callbacks are dropped here, outside the lock.
        expired.len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, PendingEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
