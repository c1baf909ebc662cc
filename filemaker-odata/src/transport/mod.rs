//! HTTP transport abstraction
//!
//! Everything above this module talks to the server through the [`Transport`]
//! trait, so the batch executor and the read API can run against a canned
//! transport in tests.

mod http;
#[cfg(test)]
pub(crate) mod mock;

pub use http::ReqwestTransport;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use thiserror::Error;

/// Per-request options layered under the credential headers
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub headers: HashMap<String, String>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// A completed HTTP response
#[derive(Debug, Clone, Default)]
pub struct Response {
    pub status: u16,
    /// Header names are stored lowercase
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.body)
    }
}

/// Failure of the HTTP exchange itself, as opposed to a failed batch part
#[derive(Error, Debug, Clone)]
#[error("Transport error: {message}")]
pub struct TransportError {
    pub message: String,
    /// HTTP status when the server answered with a non-2xx code
    pub status: Option<u16>,
    /// Captured response body, kept for diagnostics
    pub body: Option<String>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            body: None,
        }
    }

    pub fn with_response(status: u16, body: impl Into<String>) -> Self {
        Self {
            message: format!("Request failed with status {}", status),
            status: Some(status),
            body: Some(body.into()),
        }
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str, options: &RequestOptions) -> Result<Response, TransportError>;

    async fn post(
        &self,
        url: &str,
        body: Option<String>,
        options: &RequestOptions,
    ) -> Result<Response, TransportError>;
}
