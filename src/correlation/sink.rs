//! Persistence of processed responses.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::{ResponseSource, SinkError, WebhookResponse};
use crate::time::{Clock, SystemClock, iso8601};

/// Metadata stored alongside a processed response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    /// Follow-up prompts (empty when the response had none).
    pub suggestions: Vec<String>,
    /// Recommended exercises (empty when the response had none).
    pub exercises: Vec<String>,
    /// Conversation the response belongs to.
    pub conversation_id: Option<String>,
    /// Transport the response arrived on.
    pub source_tag: ResponseSource,
}

impl ResponseMetadata {
    /// Extracts metadata from a response.
    #[must_use]
    pub fn from_response(response: &WebhookResponse, source: ResponseSource) -> Self {
        Self {
            suggestions: response.suggestions.clone().unwrap_or_default(),
            exercises: response.exercises.clone().unwrap_or_default(),
            conversation_id: response.conversation_id.clone(),
            source_tag: source,
        }
    }
}

/// Destination for processed responses (e.g. the application's message store).
///
/// Called once per processed response, before the waiter is resolved.
pub trait ResponseSink: Send + Sync {
    /// Persists one response.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] if the record cannot be stored. The correlator
    /// logs the error and still resolves the waiter.
    fn save(
        &self,
        user_id: &str,
        content: &str,
        metadata: &ResponseMetadata,
    ) -> impl std::future::Future<Output = Result<(), SinkError>> + Send;
}

/// Sink that stores nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl ResponseSink for NoopSink {
    async fn save(
        &self,
        user_id: &str,
        _content: &str,
        metadata: &ResponseMetadata,
    ) -> Result<(), SinkError> {
        tracing::debug!(
            user_id,
            source = %metadata.source_tag,
            "Response not persisted (no sink configured)"
        );
        Ok(())
    }
}

/// One line of a [`JsonLinesSink`] transcript.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TranscriptRecord<'a> {
    saved_at: String,
    user_id: &'a str,
    content: &'a str,
    #[serde(flatten)]
    metadata: &'a ResponseMetadata,
}

/// Appends each response as one JSON object per line.
#[derive(Debug, Clone)]
pub struct JsonLinesSink<C = SystemClock> {
    path: PathBuf,
    clock: C,
}

impl JsonLinesSink<SystemClock> {
    /// Creates a sink appending to `path`. The file is created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_clock(path, SystemClock)
    }
}

impl<C: Clock> JsonLinesSink<C> {
    /// Creates a sink with a custom clock for the `savedAt` field.
    #[must_use]
    pub fn with_clock(path: impl Into<PathBuf>, clock: C) -> Self {
        Self {
            path: path.into(),
            clock,
        }
    }

    /// Path of the transcript file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<C: Clock> ResponseSink for JsonLinesSink<C> {
    async fn save(
        &self,
        user_id: &str,
        content: &str,
        metadata: &ResponseMetadata,
    ) -> Result<(), SinkError> {
        let record = TranscriptRecord {
            saved_at: iso8601(self.clock.now()),
            user_id,
            content,
            metadata,
        };
        let mut line = serde_json::to_vec(&record)?;
        line.push(b'\n');
        drop(record);

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || append_line(&path, &line))
            .await
            .map_err(|e| SinkError::Io(std::io::Error::other(e)))?
    }
}

/// Appends one line, creating the file and its parent directory if needed.
fn append_line(path: &Path, line: &[u8]) -> Result<(), SinkError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    file.write_all(line)?;
    Ok(())
}
