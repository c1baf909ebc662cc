//! reqwest-backed transport

use async_trait::async_trait;
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;

use super::{RequestOptions, Response, Transport, TransportError};
use crate::credentials::Credentials;
use crate::options::ClientOptions;

/// Sends requests with reqwest, injecting the credential headers into each one
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    credentials: Arc<dyn Credentials>,
}

impl ReqwestTransport {
    pub fn new(
        credentials: Arc<dyn Credentials>,
        options: &ClientOptions,
    ) -> Result<Self, TransportError> {
        let mut builder =
            reqwest::Client::builder().danger_accept_invalid_certs(options.accept_invalid_certs);
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| TransportError::new(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            credentials,
        })
    }

    /// Request headers first, credential headers on top. Names are lowercased
    /// so a credential header replaces a request header of any casing.
    fn merged_headers(&self, options: &RequestOptions) -> HashMap<String, String> {
        options
            .headers
            .iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value.clone()))
            .chain(
                self.credentials
                    .authorization_headers()
                    .into_iter()
                    .map(|(name, value)| (name.to_ascii_lowercase(), value)),
            )
            .collect()
    }

    async fn send(
        &self,
        mut request: reqwest::RequestBuilder,
        options: &RequestOptions,
    ) -> Result<Response, TransportError> {
        for (name, value) in self.merged_headers(options) {
            request = request.header(name, value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| TransportError::new(e.to_string()))?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::new(format!("Failed to read response body: {}", e)))?
            .to_vec();

        debug!("HTTP {} ({} bytes)", status.as_u16(), body.len());

        if !status.is_success() {
            return Err(TransportError::with_response(
                status.as_u16(),
                String::from_utf8_lossy(&body),
            ));
        }

        Ok(Response {
            status: status.as_u16(),
            headers,
            body,
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &str, options: &RequestOptions) -> Result<Response, TransportError> {
        debug!("GET {}", url);
        self.send(self.client.get(url), options).await
    }

    async fn post(
        &self,
        url: &str,
        body: Option<String>,
        options: &RequestOptions,
    ) -> Result<Response, TransportError> {
        debug!("POST {}", url);
        let mut request = self.client.post(url);
        if let Some(body) = body {
            request = request.body(body);
        }
        self.send(request, options).await
    }
}
