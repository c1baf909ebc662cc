//! FileMaker Server OData client
//!
//! Provides a typed interface to the FileMaker OData v4 API: record reads with
//! OData query options, script execution, and transactional `$batch` writes
//! that encode several create/update/delete operations into a single
//! multipart request.
//!
//! ```no_run
//! # async fn run() -> filemaker_odata::Result<()> {
//! use filemaker_odata::{FileMakerClient, Query};
//! use serde_json::json;
//!
//! let fm = FileMakerClient::new("demo.server.example", "test")
//!     .with_basic_auth("user", "pass")?;
//!
//! let people: Vec<serde_json::Value> = fm
//!     .get_records("people", &Query::builder().select(["ID", "name"]).top(10).build())
//!     .await?;
//!
//! let results = fm
//!     .batch()
//!     .create("people", json!({ "name": "Ada" }))?
//!     .delete("people", "1234")
//!     .execute()
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod connection;
pub mod credentials;
pub mod error;
pub mod factory;
pub mod operations;
pub mod options;
pub mod query;
pub mod transport;

pub use client::{FileMaker, ScriptResult};
pub use connection::ConnectionDescriptor;
pub use credentials::{
    BasicCredentials, Credentials, NullCredentials, OAuthCredentials, RawCredentials,
};
pub use error::{Error, Result};
pub use factory::{FileMakerClient, OAuthUrl};
pub use operations::{
    BatchCodec, BatchEnvelope, BatchExecutor, BoundaryGenerator, Operation, OperationBuilder,
    OperationKind, OperationResult,
};
pub use options::{ClientOptions, ClientOptionsBuilder};
pub use query::{Direction, OrderBy, Query, QueryBuilder, QueryResult, QuerySerializer};
pub use transport::{ReqwestTransport, RequestOptions, Response, Transport, TransportError};
