//! Canned transport for unit tests

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use super::{RequestOptions, Response, Transport, TransportError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub url: String,
    pub body: Option<String>,
    pub headers: HashMap<String, String>,
}

/// Replays mocked responses keyed by method and exact URL, recording every request
#[derive(Debug, Default)]
pub struct MockTransport {
    responses: Mutex<HashMap<(Method, String), Result<Response, TransportError>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mock(&self, method: Method, url: impl Into<String>, response: Response) {
        self.responses
            .lock()
            .unwrap()
            .insert((method, url.into()), Ok(response));
    }

    pub fn mock_error(&self, method: Method, url: impl Into<String>, error: TransportError) {
        self.responses
            .lock()
            .unwrap()
            .insert((method, url.into()), Err(error));
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> RecordedRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no request was recorded")
    }

    fn respond(
        &self,
        method: Method,
        url: &str,
        body: Option<String>,
        options: &RequestOptions,
    ) -> Result<Response, TransportError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            method,
            url: url.to_string(),
            body,
            headers: options.headers.clone(),
        });

        self.responses
            .lock()
            .unwrap()
            .get(&(method, url.to_string()))
            .cloned()
            .unwrap_or_else(|| {
                Err(TransportError::new(format!(
                    "Could not find mock {:?} request: \"{}\"",
                    method, url
                )))
            })
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, url: &str, options: &RequestOptions) -> Result<Response, TransportError> {
        self.respond(Method::Get, url, None, options)
    }

    async fn post(
        &self,
        url: &str,
        body: Option<String>,
        options: &RequestOptions,
    ) -> Result<Response, TransportError> {
        self.respond(Method::Post, url, body, options)
    }
}
