//! Server and database identity used to address OData resources

use serde::{Deserialize, Serialize};

/// Identifies one hosted FileMaker database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionDescriptor {
    pub server: String,
    pub database: String,
}

impl ConnectionDescriptor {
    pub fn new(server: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            database: database.into(),
        }
    }

    /// Base URL of the database's OData service, without a trailing slash
    pub fn base_url(&self) -> String {
        format!("https://{}/fmi/odata/v4/{}", self.server, self.database)
    }

    /// Full URL for a path relative to the OData service root
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url(), path)
    }

    /// URL of the server itself, used for endpoints outside the OData service
    pub fn server_url(&self, path: &str) -> String {
        format!("https://{}/{}", self.server, path)
    }
}
