//! Client factory
//!
//! [`FileMakerClient`] wires credentials, the HTTP transport and the shared
//! [`ClientOptions`] together and hands out configured [`FileMaker`] values.
//! It also covers the unauthenticated OAuth discovery endpoints.

use log::debug;
use serde::Deserialize;
use std::sync::Arc;

use crate::client::FileMaker;
use crate::connection::ConnectionDescriptor;
use crate::credentials::{BasicCredentials, Credentials, NullCredentials, OAuthCredentials};
use crate::error::{Error, Result};
use crate::options::ClientOptions;
use crate::query::QuerySerializer;
use crate::transport::{ReqwestTransport, RequestOptions, Transport};

/// Where to send the user to start an OAuth login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthUrl {
    pub redirect_url: String,
    /// Pass back to [`FileMakerClient::with_oauth`] after the redirect completes
    pub request_id: String,
}

#[derive(Debug, Deserialize)]
struct OAuthProviderInfo {
    data: Option<OAuthProviders>,
}

#[derive(Debug, Deserialize)]
struct OAuthProviders {
    #[serde(rename = "Provider")]
    provider: Vec<OAuthProvider>,
}

#[derive(Debug, Deserialize)]
struct OAuthProvider {
    #[serde(rename = "Name")]
    name: String,
}

#[derive(Debug, Clone)]
pub struct FileMakerClient {
    connection: ConnectionDescriptor,
    options: ClientOptions,
}

impl FileMakerClient {
    pub fn new(server: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            connection: ConnectionDescriptor::new(server, database),
            options: ClientOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    pub fn connection(&self) -> &ConnectionDescriptor {
        &self.connection
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn url(&self, path: &str) -> String {
        self.connection.url(path)
    }

    pub fn with_basic_auth(
        &self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<FileMaker> {
        self.with_credentials(Arc::new(BasicCredentials::new(username, password)))
    }

    /// Connection for a user who completed the OAuth redirect flow
    pub fn with_oauth(
        &self,
        request_id: impl Into<String>,
        identifier: impl Into<String>,
    ) -> Result<FileMaker> {
        self.with_credentials(Arc::new(OAuthCredentials::new(request_id, identifier)))
    }

    pub fn with_credentials(&self, credentials: Arc<dyn Credentials>) -> Result<FileMaker> {
        let transport = ReqwestTransport::new(credentials, &self.options)?;
        Ok(self.with_transport(Arc::new(transport)))
    }

    /// Connection over a caller-supplied transport
    pub fn with_transport(&self, transport: Arc<dyn Transport>) -> FileMaker {
        FileMaker::new(self.connection.clone(), transport).with_serializer(
            QuerySerializer::with_reserved(self.options.reserved_fields.iter().cloned()),
        )
    }

    fn anonymous_transport(&self) -> Result<ReqwestTransport> {
        Ok(ReqwestTransport::new(Arc::new(NullCredentials), &self.options)?)
    }

    /// Begin the OAuth flow; redirect the user to the returned URL
    pub async fn oauth_url(
        &self,
        tracking_id: &str,
        provider: &str,
        return_url: Option<&str>,
    ) -> Result<OAuthUrl> {
        let transport = self.anonymous_transport()?;
        oauth_url_with(&transport, &self.connection, tracking_id, provider, return_url).await
    }

    /// Authentication providers configured on the server, `["basic"]` when none
    pub async fn auth_types(&self) -> Result<Vec<String>> {
        let transport = self.anonymous_transport()?;
        auth_types_with(&transport, &self.connection).await
    }
}

async fn oauth_url_with(
    transport: &dyn Transport,
    connection: &ConnectionDescriptor,
    tracking_id: &str,
    provider: &str,
    return_url: Option<&str>,
) -> Result<OAuthUrl> {
    let url = connection.server_url(&format!(
        "oauth/getoauthurl?trackingID={}&provider={}&address={}&X-FMS-OAuth-AuthType=2",
        urlencoding::encode(tracking_id),
        urlencoding::encode(provider),
        connection.server
    ));
    let default_return = connection.server_url("oauth-handler");
    let options = RequestOptions::new()
        .header("X-FMS-Application-Type", "9")
        .header("X-FMS-Application-Version", "15")
        .header("X-FMS-Return-URL", return_url.unwrap_or(&default_return));

    debug!("Requesting OAuth URL for provider {}", provider);
    let response = transport.get(&url, &options).await?;

    let request_id = response
        .header("X-FMS-Request-ID")
        .filter(|id| !id.is_empty())
        .ok_or_else(|| {
            Error::MissingHeader(
                "Did not get back an \"X-FMS-Request-ID\" header from FileMaker".to_string(),
            )
        })?
        .to_string();

    Ok(OAuthUrl {
        redirect_url: response.text(),
        request_id,
    })
}

async fn auth_types_with(
    transport: &dyn Transport,
    connection: &ConnectionDescriptor,
) -> Result<Vec<String>> {
    let options = RequestOptions::new().header("Content-Type", "application/json");
    let response = transport
        .get(&connection.server_url("fmws/oauthproviderinfo"), &options)
        .await?;

    let info: OAuthProviderInfo = response.json()?;
    Ok(match info.data {
        Some(providers) => providers.provider.into_iter().map(|p| p.name).collect(),
        None => vec!["basic".to_string()],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::Response;
    use crate::transport::mock::{Method, MockTransport};

    const OAUTH_URL: &str = "https://fm.example.com/oauth/getoauthurl?trackingID=track-1&provider=Google&address=fm.example.com&X-FMS-OAuth-AuthType=2";

    fn conn() -> ConnectionDescriptor {
        ConnectionDescriptor::new("fm.example.com", "test")
    }

    #[tokio::test]
    async fn test_oauth_url() {
        let transport = MockTransport::new();
        transport.mock(
            Method::Get,
            OAUTH_URL,
            Response::new(200, "https://accounts.example.com/auth")
                .with_header("X-FMS-Request-ID", "req-42"),
        );

        let result = oauth_url_with(&transport, &conn(), "track-1", "Google", None)
            .await
            .unwrap();

        assert_eq!(result.redirect_url, "https://accounts.example.com/auth");
        assert_eq!(result.request_id, "req-42");

        let request = transport.last_request();
        assert_eq!(
            request.headers.get("X-FMS-Return-URL").unwrap(),
            "https://fm.example.com/oauth-handler"
        );
        assert_eq!(request.headers.get("X-FMS-Application-Type").unwrap(), "9");
    }

    #[tokio::test]
    async fn test_oauth_url_custom_return_url() {
        let transport = MockTransport::new();
        transport.mock(
            Method::Get,
            OAUTH_URL,
            Response::new(200, "https://accounts.example.com/auth")
                .with_header("X-FMS-Request-ID", "req-42"),
        );

        oauth_url_with(&transport, &conn(), "track-1", "Google", Some("https://app.example.com/cb"))
            .await
            .unwrap();

        assert_eq!(
            transport.last_request().headers.get("X-FMS-Return-URL").unwrap(),
            "https://app.example.com/cb"
        );
    }

    #[tokio::test]
    async fn test_oauth_url_requires_request_id() {
        let transport = MockTransport::new();
        transport.mock(
            Method::Get,
            OAUTH_URL,
            Response::new(200, "https://accounts.example.com/auth").with_header("X-FMS-Request-ID", ""),
        );

        let err = oauth_url_with(&transport, &conn(), "track-1", "Google", None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingHeader(_)));
    }

    #[tokio::test]
    async fn test_auth_types_lists_providers() {
        let transport = MockTransport::new();
        transport.mock(
            Method::Get,
            "https://fm.example.com/fmws/oauthproviderinfo",
            Response::new(
                200,
                r#"{"data": {"Provider": [{"Name": "Google"}, {"Name": "Microsoft"}]}}"#,
            ),
        );

        let types = auth_types_with(&transport, &conn()).await.unwrap();
        assert_eq!(types, vec!["Google".to_string(), "Microsoft".to_string()]);
    }

    #[tokio::test]
    async fn test_auth_types_defaults_to_basic() {
        let transport = MockTransport::new();
        transport.mock(
            Method::Get,
            "https://fm.example.com/fmws/oauthproviderinfo",
            Response::new(200, r#"{"result": 0}"#),
        );

        let types = auth_types_with(&transport, &conn()).await.unwrap();
        assert_eq!(types, vec!["basic".to_string()]);
    }

    #[test]
    fn test_with_transport_uses_configured_reserved_fields() {
        let client = FileMakerClient::new("fm.example.com", "test")
            .with_options(ClientOptions::builder().reserved_field("ROWID").build());
        let fm = client.with_transport(Arc::new(MockTransport::new()));
        assert_eq!(fm.url("people"), "https://fm.example.com/fmi/odata/v4/test/people");
        assert_eq!(client.options().reserved_fields.len(), 2);
    }
}
