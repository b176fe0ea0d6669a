//! Shared test fixtures for delivery, polling and service tests.

use crate::correlation::WebhookResponse;
use crate::endpoint::{EndpointConfig, EnvironmentTag, PollDialect};
use crate::transport::{HttpClient, HttpError, HttpRequest, HttpResponse};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

/// One scripted answer from a mock host.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Respond with this status and body.
    Status(u16, String),
    /// Fail as if the connection was refused.
    Refused,
    /// Never respond (the caller's timeout must cancel the attempt).
    Hang,
}

impl Reply {
    /// 200 with an empty JSON acknowledgement.
    pub fn ok() -> Self {
        Self::Status(200, r#"{"success":true}"#.to_string())
    }

    /// 200 poll envelope carrying `data`.
    pub fn result(data: &WebhookResponse) -> Self {
        let body = serde_json::json!({ "success": true, "data": data });
        Self::Status(200, body.to_string())
    }

    /// 200 poll envelope without a result.
    pub fn pending() -> Self {
        Self::Status(200, r#"{"success":false}"#.to_string())
    }
}

/// HTTP client answering per host from a script.
///
/// Each host replays its replies in order; the last reply repeats forever.
/// Hosts without a script refuse connections.
#[derive(Debug, Default)]
pub struct ScriptedClient {
    scripts: Mutex<HashMap<String, VecDeque<Reply>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the replies for `host`.
    pub fn route(self, host: &str, replies: Vec<Reply>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(host.to_string(), replies.into());
        self
    }

    /// Replaces the script for `host` after construction.
    pub fn set_route(&self, host: &str, replies: Vec<Reply>) {
        self.scripts
            .lock()
            .unwrap()
            .insert(host.to_string(), replies.into());
    }

    /// Every request received, in order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// URLs of every request received, in order.
    pub fn request_urls(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| r.url.as_str().to_string())
            .collect()
    }

    /// Number of requests sent to `host`.
    pub fn calls_to(&self, host: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.url.host_str() == Some(host))
            .count()
    }

    fn next_reply(&self, host: &str) -> Reply {
        let mut scripts = self.scripts.lock().unwrap();
        match scripts.get_mut(host) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or(Reply::Refused),
            Some(queue) => queue.front().cloned().unwrap_or(Reply::Refused),
            None => Reply::Refused,
        }
    }
}

impl HttpClient for ScriptedClient {
    async fn request(&self, req: HttpRequest) -> Result<HttpResponse, HttpError> {
        let host = req.url.host_str().unwrap_or_default().to_string();
        self.requests.lock().unwrap().push(req);

        match self.next_reply(&host) {
            Reply::Status(code, body) => Ok(HttpResponse::with_status(
                http::StatusCode::from_u16(code).unwrap(),
                body.into_bytes(),
            )),
            Reply::Refused => Err(HttpError::Connection(Box::new(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            )))),
            Reply::Hang => std::future::pending().await,
        }
    }
}

/// Hosted endpoint at `https://{host}/webhook` with a 100ms timeout.
pub fn endpoint(host: &str, max_retries: u32) -> EndpointConfig {
    EndpointConfig::new(
        url::Url::parse(&format!("https://{host}/webhook")).unwrap(),
        EnvironmentTag::Production,
    )
    .with_timeout(Duration::from_millis(100))
    .with_max_retries(max_retries)
}

/// Local development endpoint at `http://localhost:{port}/webhook`.
pub fn local_endpoint(port: u16) -> EndpointConfig {
    EndpointConfig::new(
        url::Url::parse(&format!("http://localhost:{port}/webhook")).unwrap(),
        EnvironmentTag::Local,
    )
    .with_timeout(Duration::from_millis(100))
    .with_dialect(PollDialect::PathParam)
}

/// A backend response for `conversation_id`.
pub fn response_for(conversation_id: &str, text: &str) -> WebhookResponse {
    WebhookResponse {
        response: text.to_string(),
        suggestions: Some(vec!["Tell me more".to_string()]),
        exercises: Some(vec![]),
        user_id: "user-1".to_string(),
        conversation_id: Some(conversation_id.to_string()),
        timestamp: "2024-05-01T10:00:00.000Z".to_string(),
    }
}
