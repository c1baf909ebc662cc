//! `$batch` multipart codec
//!
//! Builds the multipart/mixed request body holding one changeset with every
//! operation, and splits the server's multipart response back into one
//! result per operation.
//!
//! Response parts are correlated with operations by position. When a part
//! carries a `Content-ID` it must match that position, otherwise decoding
//! fails rather than attributing a result to the wrong operation.

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use super::operation::{Operation, OperationResult, PartContext};
use crate::connection::ConnectionDescriptor;
use crate::error::{Error, Result};

static BOUNDARY_PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"boundary=(.+?)\r\n").expect("valid boundary regex"));

static CONTENT_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^Content-ID:\s*(\S+)").expect("valid content-id regex"));

static FAILED_STATUS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"HTTP/1\.1\s+([3-5]\d\d)\s").expect("valid status regex"));

/// Source of the unique tokens used as multipart boundaries.
///
/// Defaults to random UUIDs; tests inject a deterministic source to assert
/// exact wire bytes.
#[derive(Clone)]
pub struct BoundaryGenerator {
    source: Arc<dyn Fn() -> String + Send + Sync>,
}

impl BoundaryGenerator {
    pub fn random() -> Self {
        Self::from_fn(|| Uuid::new_v4().to_string())
    }

    pub fn from_fn<F>(source: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        Self {
            source: Arc::new(source),
        }
    }

    pub fn token(&self) -> String {
        (self.source)()
    }
}

impl Default for BoundaryGenerator {
    fn default() -> Self {
        Self::random()
    }
}

impl fmt::Debug for BoundaryGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BoundaryGenerator")
    }
}

/// A fully rendered batch request, valid for a single call
#[derive(Debug, Clone)]
pub struct BatchEnvelope {
    pub batch_boundary: String,
    pub changeset_boundary: String,
    pub body: String,
}

impl BatchEnvelope {
    /// Value for the request's `Content-Type` header
    pub fn content_type(&self) -> String {
        format!("multipart/mixed; boundary={}", self.batch_boundary)
    }
}

#[derive(Debug, Clone, Default)]
pub struct BatchCodec {
    boundaries: BoundaryGenerator,
}

impl BatchCodec {
    pub fn new(boundaries: BoundaryGenerator) -> Self {
        Self { boundaries }
    }

    /// Encode the operations as one changeset inside a batch envelope.
    /// Fresh boundaries are drawn on every call.
    pub fn encode(
        &self,
        connection: &ConnectionDescriptor,
        operations: &[Operation],
    ) -> Result<BatchEnvelope> {
        for operation in operations {
            operation.validate()?;
        }

        let batch_boundary = format!("batch_{}", self.boundaries.token());
        let changeset_boundary = format!("changeset_{}", self.boundaries.token());

        let mut body = format!(
            "--{}\r\nContent-Type: multipart/mixed; boundary={}\r\n\r\n",
            batch_boundary, changeset_boundary
        );

        for (index, operation) in operations.iter().enumerate() {
            let context = PartContext {
                changeset_boundary: &changeset_boundary,
                content_id: index + 1,
            };
            body.push_str(&operation.render(connection, &context));
        }

        body.push_str(&format!("--{}--\r\n", changeset_boundary));
        body.push_str(&format!("--{}--\r\n", batch_boundary));

        Ok(BatchEnvelope {
            batch_boundary,
            changeset_boundary,
            body,
        })
    }

    /// Decode a batch response body into one result per operation, in order.
    ///
    /// The first failed part aborts decoding; results of earlier parts are
    /// discarded along with it.
    pub fn decode(operations: &[Operation], body: &str) -> Result<Vec<OperationResult>> {
        let changeset = match BOUNDARY_PARAM.captures(body) {
            Some(captures) => captures[1].trim().trim_matches('"').to_string(),
            None => return Err(rejected_batch_error(body)),
        };
        debug!("Decoding batch response with changeset boundary {}", changeset);

        let delimiter = format!("--{}", changeset);
        let segments: Vec<&str> = body.split(delimiter.as_str()).collect();
        // Drop the preamble and the closing `--` terminator
        let parts = if segments.len() >= 2 {
            &segments[1..segments.len() - 1]
        } else {
            &[][..]
        };

        let mut results = Vec::with_capacity(operations.len());
        for (index, part) in parts.iter().enumerate() {
            let operation = operations.get(index).ok_or_else(|| {
                Error::Protocol(format!(
                    "Response contains {} parts but only {} operations were sent",
                    parts.len(),
                    operations.len()
                ))
            })?;

            check_content_id(part, index + 1)?;
            results.push(operation.parse(part)?);
        }

        if results.len() != operations.len() {
            return Err(Error::Protocol(format!(
                "Response contains {} parts but {} operations were sent",
                results.len(),
                operations.len()
            )));
        }

        Ok(results)
    }
}

/// A part's Content-ID, when present, must name the same position as the request
fn check_content_id(part: &str, expected: usize) -> Result<()> {
    let header_end = part.find("HTTP/1.1").unwrap_or(part.len());
    let Some(captures) = CONTENT_ID.captures(&part[..header_end]) else {
        return Ok(());
    };

    let found = captures[1].trim_matches(|c| c == '<' || c == '>');
    if found != expected.to_string() {
        return Err(Error::Protocol(format!(
            "Response part {} carries Content-ID {}",
            expected, found
        )));
    }

    Ok(())
}

/// Error for a response without a changeset. A server that rejects the
/// whole changeset answers with a single plain HTTP response instead.
fn rejected_batch_error(body: &str) -> Error {
    let Some(captures) = FAILED_STATUS.captures(body) else {
        return Error::Protocol("Could not find changeset".to_string());
    };

    let message = body
        .find('{')
        .and_then(|start| {
            serde_json::Deserializer::from_str(&body[start..])
                .into_iter::<serde_json::Value>()
                .next()
                .and_then(|value| value.ok())
        })
        .and_then(|json| {
            json.pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "no error message".to_string());

    Error::Protocol(format!(
        "Could not find changeset; batch rejected with status {}: {}",
        &captures[1], message
    ))
}
