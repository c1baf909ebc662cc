//! Credential strategies
//!
//! A credential strategy only produces the headers that authenticate a request.
//! Obtaining or refreshing tokens is left to the caller.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use std::collections::HashMap;

/// Produces the authentication headers merged into every outgoing request
pub trait Credentials: Send + Sync + std::fmt::Debug {
    fn authorization_headers(&self) -> HashMap<String, String>;
}

/// No authentication, used for the public OAuth discovery endpoints
#[derive(Debug, Clone, Default)]
pub struct NullCredentials;

impl Credentials for NullCredentials {
    fn authorization_headers(&self) -> HashMap<String, String> {
        HashMap::new()
    }
}

/// HTTP basic authentication with a FileMaker account
#[derive(Clone)]
pub struct BasicCredentials {
    username: String,
    password: String,
}

impl BasicCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials for BasicCredentials {
    fn authorization_headers(&self) -> HashMap<String, String> {
        let token = STANDARD.encode(format!("{}:{}", self.username, self.password));
        HashMap::from([("Authorization".to_string(), format!("Basic {}", token))])
    }
}

/// OAuth identity obtained through the FileMaker Server OAuth redirect flow
#[derive(Debug, Clone)]
pub struct OAuthCredentials {
    request_id: String,
    identifier: String,
}

impl OAuthCredentials {
    pub fn new(request_id: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            identifier: identifier.into(),
        }
    }
}

impl Credentials for OAuthCredentials {
    fn authorization_headers(&self) -> HashMap<String, String> {
        HashMap::from([
            ("OData-Version".to_string(), "4.0".to_string()),
            ("OData-MaxVersion".to_string(), "4.0".to_string()),
            (
                "X-FM-Data-OAuth-Request-Id".to_string(),
                self.request_id.clone(),
            ),
            (
                "X-FM-Data-OAuth-Identifier".to_string(),
                self.identifier.clone(),
            ),
        ])
    }
}

/// Passes a pre-built value straight through as the `Authorization` header,
/// e.g. `RawCredentials::new("Basic <access-token>")`
#[derive(Clone)]
pub struct RawCredentials {
    authorization: String,
}

impl RawCredentials {
    pub fn new(authorization: impl Into<String>) -> Self {
        Self {
            authorization: authorization.into(),
        }
    }
}

impl std::fmt::Debug for RawCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RawCredentials(<redacted>)")
    }
}

impl Credentials for RawCredentials {
    fn authorization_headers(&self) -> HashMap<String, String> {
        HashMap::from([("Authorization".to_string(), self.authorization.clone())])
    }
}
