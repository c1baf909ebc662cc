//! Connection settings for the CLI
//!
//! Settings are layered: `~/.config/filemaker-cli/config.toml`, then
//! `FILEMAKER_*` environment variables (a `.env` file is honoured), then
//! command-line flags.

use anyhow::{Context, Result};
use filemaker_odata::ClientOptions;
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_SERVER: &str = "FILEMAKER_SERVER";
pub const ENV_DATABASE: &str = "FILEMAKER_DATABASE";
pub const ENV_USERNAME: &str = "FILEMAKER_USERNAME";
pub const ENV_PASSWORD: &str = "FILEMAKER_PASSWORD";
pub const ENV_INSECURE: &str = "FILEMAKER_INSECURE";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: Option<String>,
    pub database: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Accept self-signed certificates
    pub insecure: bool,
    pub timeout_secs: Option<u64>,
    /// Extra field names to quote in `$select`, on top of `ID`
    pub reserved_fields: Vec<String>,
}

/// Values given on the command line; `None` leaves the lower layers alone
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub server: Option<String>,
    pub database: Option<String>,
    pub username: Option<String>,
    pub insecure: bool,
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not find config directory")?;
        Ok(config_dir.join("filemaker-cli").join("config.toml"))
    }

    /// Load the config file (if any) and overlay the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::default_path()?,
        };

        let mut config = if path.exists() {
            debug!("Loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::from_toml(&content)
                .with_context(|| format!("Invalid config file: {}", path.display()))?
        } else {
            debug!("No config file at {}", path.display());
            Self::default()
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(server) = non_empty(ENV_SERVER) {
            self.server = Some(server);
        }
        if let Some(database) = non_empty(ENV_DATABASE) {
            self.database = Some(database);
        }
        if let Some(username) = non_empty(ENV_USERNAME) {
            self.username = Some(username);
        }
        if let Some(password) = lookup(ENV_PASSWORD) {
            self.password = Some(password);
        }
        if let Some(insecure) = non_empty(ENV_INSECURE) {
            self.insecure = matches!(
                insecure.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }
    }

    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(server) = &overrides.server {
            self.server = Some(server.clone());
        }
        if let Some(database) = &overrides.database {
            self.database = Some(database.clone());
        }
        if let Some(username) = &overrides.username {
            self.username = Some(username.clone());
        }
        if overrides.insecure {
            self.insecure = true;
        }
    }

    pub fn server(&self) -> Result<&str> {
        self.server.as_deref().with_context(|| {
            format!("No server configured. Use --server or set {}", ENV_SERVER)
        })
    }

    pub fn database(&self) -> Result<&str> {
        self.database.as_deref().with_context(|| {
            format!("No database configured. Use --database or set {}", ENV_DATABASE)
        })
    }

    pub fn client_options(&self) -> ClientOptions {
        let mut builder = ClientOptions::builder().accept_invalid_certs(self.insecure);
        if let Some(secs) = self.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        for field in &self.reserved_fields {
            builder = builder.reserved_field(field.clone());
        }
        builder.build()
    }
}
