//! Error types for the FileMaker OData client

use thiserror::Error;

use crate::operations::OperationKind;
use crate::transport::TransportError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// The HTTP request itself failed or returned a non-2xx status
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The server response does not follow the expected multipart layout
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// A single part of a `$batch` changeset was rejected by the server
    #[error("[{kind} OPERATION: {table}] {message}")]
    Operation {
        kind: OperationKind,
        table: String,
        message: String,
    },

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A response was missing a header the client depends on
    #[error("Missing response header: {0}")]
    MissingHeader(String),
}

impl Error {
    /// Captured response body of a failed HTTP request, if any
    pub fn response_body(&self) -> Option<&str> {
        match self {
            Self::Transport(err) => err.body.as_deref(),
            _ => None,
        }
    }
}
