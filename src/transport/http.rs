//! Request/response values and the client trait.

use std::sync::Arc;

use super::HttpError;

fn application_json() -> http::HeaderValue {
    http::HeaderValue::from_static("application/json")
}

/// One outbound exchange with an endpoint.
///
/// The engine only issues two shapes: a JSON `POST` for deliveries and a
/// `GET` for result polls.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method
    pub method: http::Method,
    /// Target URL
    pub url: url::Url,
    /// HTTP headers to send
    pub headers: http::HeaderMap,
    /// Request body, absent for polls
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// A poll request expecting a JSON envelope back.
    #[must_use]
    pub fn get(url: url::Url) -> Self {
        let mut headers = http::HeaderMap::new();
        headers.insert(http::header::ACCEPT, application_json());
        Self {
            method: http::Method::GET,
            url,
            headers,
            body: None,
        }
    }

    /// A delivery carrying an already-encoded JSON body.
    #[must_use]
    pub fn post_json(url: url::Url, body: Vec<u8>) -> Self {
        let mut headers = http::HeaderMap::new();
        headers.insert(http::header::CONTENT_TYPE, application_json());
        Self {
            method: http::Method::POST,
            url,
            headers,
            body: Some(body),
        }
    }
}

/// A buffered response from an endpoint.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: http::StatusCode,
    /// Response headers
    pub headers: http::HeaderMap,
    /// Response body (fully buffered)
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Creates a new HTTP response.
    #[must_use]
    pub const fn new(status: http::StatusCode, headers: http::HeaderMap, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Creates a response with the given status, no headers and the given body.
    #[must_use]
    pub fn with_status(status: http::StatusCode, body: Vec<u8>) -> Self {
        Self::new(status, http::HeaderMap::new(), body)
    }

    /// Returns true for 2xx statuses.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns the body as a UTF-8 string, if valid.
    #[must_use]
    pub fn body_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }

    /// At most `max_chars` characters of the body, for error reports.
    ///
    /// `None` for empty or non-UTF-8 bodies.
    #[must_use]
    pub fn body_excerpt(&self, max_chars: usize) -> Option<String> {
        let text = self.body_text()?.trim();
        if text.is_empty() {
            return None;
        }

        match text.char_indices().nth(max_chars) {
            Some((cut, _)) => Some(format!("{}...", &text[..cut])),
            None => Some(text.to_string()),
        }
    }
}

/// Sends one request to one endpoint.
///
/// The delivery and poll controllers depend only on this trait; the binary
/// plugs in [`super::ReqwestClient`]. Implementations need not enforce
/// timeouts: the controllers cancel each attempt after the endpoint's
/// configured timeout.
///
/// # Example
///
/// ```ignore
/// use automation_relay::transport::{HttpClient, HttpRequest, HttpResponse, HttpError};
///
/// struct AlwaysAccepts;
///
/// impl HttpClient for AlwaysAccepts {
///     async fn request(&self, _req: HttpRequest) -> Result<HttpResponse, HttpError> {
///         Ok(HttpResponse::with_status(http::StatusCode::OK, Vec::new()))
///     }
/// }
/// ```
pub trait HttpClient: Send + Sync {
    /// Sends `req` and buffers the response.
    ///
    /// Non-2xx statuses are returned as responses, not errors.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] when no response was received:
    /// - Network connection fails ([`HttpError::Connection`])
    /// - The client's own timeout fires ([`HttpError::Timeout`])
    /// - URL is invalid ([`HttpError::InvalidUrl`])
    fn request(
        &self,
        req: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, HttpError>> + Send;
}

impl<T: HttpClient> HttpClient for Arc<T> {
    async fn request(&self, req: HttpRequest) -> Result<HttpResponse, HttpError> {
        (**self).request(req).await
    }
}
