//! Command-line interface

pub mod commands;
pub mod output;

use anyhow::{Context, Result};
use clap::Parser;
use filemaker_odata::{FileMaker, FileMakerClient};
use log::{debug, warn};
use std::path::PathBuf;

use crate::config::{Config, ENV_PASSWORD, Overrides};
use commands::Commands;
use output::OutputFormat;

/// Query and modify FileMaker databases over OData
#[derive(Parser, Debug)]
#[command(name = "filemaker-cli")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// FileMaker Server host name
    #[arg(long, global = true)]
    pub server: Option<String>,

    #[arg(long, global = true)]
    pub database: Option<String>,

    #[arg(short, long, global = true)]
    pub username: Option<String>,

    /// Accept self-signed TLS certificates
    #[arg(long, global = true)]
    pub insecure: bool,

    /// Config file to use instead of ~/.config/filemaker-cli/config.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Log requests and responses
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            server: self.server.clone(),
            database: self.database.clone(),
            username: self.username.clone(),
            insecure: self.insecure,
        }
    }
}

/// Resolved settings shared by the command handlers
pub struct Session {
    pub config: Config,
    pub format: OutputFormat,
}

impl Session {
    pub fn client(&self) -> Result<FileMakerClient> {
        Ok(FileMakerClient::new(self.config.server()?, self.config.database()?)
            .with_options(self.config.client_options()))
    }

    /// Authenticated connection, prompting for the password when none is configured
    pub fn connect(&self) -> Result<FileMaker> {
        let client = self.client()?;
        let username = self
            .config
            .username
            .as_deref()
            .context("No username configured. Use --username or set FILEMAKER_USERNAME")?;

        let password = match &self.config.password {
            Some(password) => password.clone(),
            None => {
                debug!("{} not set, prompting", ENV_PASSWORD);
                rpassword::prompt_password(format!("Password for {}: ", username))
                    .context("Failed to read password")?
            }
        };

        if self.config.insecure {
            warn!("TLS certificate verification is disabled");
        }

        Ok(client.with_basic_auth(username, password)?)
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    config.apply_overrides(&cli.overrides());

    let session = Session {
        config,
        format: cli.format,
    };
    commands::handler::handle_command(cli.command, &session).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_records_command() {
        let cli = Cli::try_parse_from([
            "filemaker-cli",
            "--server",
            "fm.example.com",
            "records",
            "people",
            "--select",
            "ID,name",
            "--orderby",
            "name desc",
            "--orderby",
            "company",
            "--with-count",
            "-f",
            "json-compact",
        ])
        .unwrap();

        assert_eq!(cli.server.as_deref(), Some("fm.example.com"));
        assert_eq!(cli.format, OutputFormat::JsonCompact);
        match cli.command {
            Commands::Records(args) => {
                assert_eq!(args.select, vec!["ID", "name"]);
                assert_eq!(args.orderby.len(), 2);
                assert!(args.with_count);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_bad_orderby() {
        let result = Cli::try_parse_from(["filemaker-cli", "records", "people", "--orderby", "name sideways"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_session_requires_server() {
        let session = Session {
            config: Config::default(),
            format: OutputFormat::Json,
        };
        assert!(session.client().is_err());
    }
}
