//! Client configuration with builder pattern
//!
//! Collects the knobs shared by every connection created from one
//! [`FileMakerClient`](crate::FileMakerClient), with sane defaults.

use std::time::Duration;

/// Options applied to the HTTP transport and the query serializer
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Accept self-signed or otherwise invalid TLS certificates.
    /// FileMaker Server installs frequently run with a self-signed certificate.
    pub accept_invalid_certs: bool,
    /// Whole-request timeout; `None` leaves the HTTP library default in place
    pub timeout: Option<Duration>,
    /// Field names that must be double-quoted inside `$select`
    pub reserved_fields: Vec<String>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            accept_invalid_certs: false,
            timeout: Some(Duration::from_secs(60)),
            reserved_fields: vec!["ID".to_string()],
        }
    }
}

impl ClientOptions {
    pub fn builder() -> ClientOptionsBuilder {
        ClientOptionsBuilder::new()
    }

    /// Options for a development server with a self-signed certificate
    pub fn insecure() -> Self {
        Self {
            accept_invalid_certs: true,
            ..Self::default()
        }
    }
}

#[derive(Debug)]
pub struct ClientOptionsBuilder {
    options: ClientOptions,
}

impl ClientOptionsBuilder {
    pub fn new() -> Self {
        Self {
            options: ClientOptions::default(),
        }
    }

    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.options.accept_invalid_certs = accept;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = Some(timeout);
        self
    }

    /// Disable the request timeout entirely
    pub fn no_timeout(mut self) -> Self {
        self.options.timeout = None;
        self
    }

    /// Add a field name that must be quoted in `$select` (in addition to `ID`)
    pub fn reserved_field(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.options.reserved_fields.contains(&name) {
            self.options.reserved_fields.push(name);
        }
        self
    }

    pub fn build(self) -> ClientOptions {
        self.options
    }
}

impl Default for ClientOptionsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
