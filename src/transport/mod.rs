//! HTTP transport seam.
//!
//! This module provides:
//! - Request/response value types ([`HttpRequest`], [`HttpResponse`])
//! - The client abstraction the engine depends on ([`HttpClient`])
//! - The production client ([`ReqwestClient`])
//! - Transport-level errors ([`HttpError`])

mod client;
mod error;
mod http;


pub use client::{ReqwestClient, USER_AGENT};
pub use error::HttpError;
pub use http::{HttpClient, HttpRequest, HttpResponse};
