//! Core Operation types for FileMaker batch writes

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::connection::ConnectionDescriptor;
use crate::error::{Error, Result};

/// Name of the primary key field every FileMaker OData table exposes
pub const IDENTITY_FIELD: &str = "ID";

static STATUS_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"HTTP/1\.1\s+(\d+)\s").expect("valid status line regex"));

/// Represents a single write that can be placed in a batch changeset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Create a new record
    Create {
        /// Table name as exposed by the OData service
        table: String,
        /// Field values for the new record; the server assigns `ID`
        record: Map<String, Value>,
    },
    /// Update an existing record
    Update {
        table: String,
        /// Must contain `ID`, which addresses the record and is not sent in the body
        record: Map<String, Value>,
    },
    /// Delete a record
    Delete { table: String, id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Create,
    Update,
    Delete,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        })
    }
}

/// Result of one operation inside an executed batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationResult {
    /// HTTP status code of the operation's response part
    pub status: u16,
    /// Echoed record for updates, `None` otherwise
    pub body: Option<Value>,
}

/// Placement of a rendered operation inside the changeset
#[derive(Debug, Clone, Copy)]
pub struct PartContext<'a> {
    pub changeset_boundary: &'a str,
    /// 1-based position of the operation in the batch
    pub content_id: usize,
}

impl Operation {
    /// Create a new Create operation; `record` must be a JSON object
    pub fn create(table: impl Into<String>, record: Value) -> Result<Self> {
        let table = table.into();
        let record = into_object(&table, record)?;
        Ok(Self::Create { table, record })
    }

    /// Create a new Update operation; `record` must be a JSON object containing `ID`
    pub fn update(table: impl Into<String>, record: Value) -> Result<Self> {
        let table = table.into();
        let record = into_object(&table, record)?;
        let operation = Self::Update { table, record };
        operation.validate()?;
        Ok(operation)
    }

    /// Create a new Delete operation
    pub fn delete(table: impl Into<String>, id: impl Into<String>) -> Self {
        Self::Delete {
            table: table.into(),
            id: id.into(),
        }
    }

    pub fn table(&self) -> &str {
        match self {
            Self::Create { table, .. } => table,
            Self::Update { table, .. } => table,
            Self::Delete { table, .. } => table,
        }
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Create { .. } => OperationKind::Create,
            Self::Update { .. } => OperationKind::Update,
            Self::Delete { .. } => OperationKind::Delete,
        }
    }

    pub fn http_method(&self) -> &'static str {
        match self {
            Self::Create { .. } => "POST",
            Self::Update { .. } => "PATCH",
            Self::Delete { .. } => "DELETE",
        }
    }

    /// Check invariants that deserialized operations may not have been built with
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Update { table, record } => match record.get(IDENTITY_FIELD) {
                None | Some(Value::Null) => Err(Error::InvalidOperation(format!(
                    "update on '{}' requires an '{}' field",
                    table, IDENTITY_FIELD
                ))),
                Some(_) => Ok(()),
            },
            Self::Create { .. } | Self::Delete { .. } => Ok(()),
        }
    }

    /// Render this operation as one MIME part of the changeset
    pub fn render(&self, connection: &ConnectionDescriptor, context: &PartContext<'_>) -> String {
        let mut part = format!(
            "--{}\r\nContent-Type: application/http\r\nContent-ID: {}\r\n\r\n",
            context.changeset_boundary, context.content_id
        );

        match self {
            Self::Create { table, record } => {
                let json = Value::Object(record.clone()).to_string();
                part.push_str(&json_request(self.http_method(), &connection.url(table), &json));
            }
            Self::Update { table, record } => {
                let mut fields = record.clone();
                let id = fields
                    .remove(IDENTITY_FIELD)
                    .map(|id| identity_string(&id))
                    .unwrap_or_default();
                let json = Value::Object(fields).to_string();
                let url = format!("{}('{}')", connection.url(table), id);
                part.push_str(&json_request(self.http_method(), &url, &json));
            }
            Self::Delete { table, id } => {
                part.push_str(&format!(
                    "{} {}('{}') HTTP/1.1\r\n\r\n\r\n",
                    self.http_method(),
                    connection.url(table),
                    id
                ));
            }
        }

        part
    }

    /// Interpret this operation's part of the batch response
    pub fn parse(&self, part: &str) -> Result<OperationResult> {
        let (status, body_start) = status_line(part)?;
        let payload = &part[body_start..];

        if status >= 300 {
            let message = json_payload(payload)
                .as_ref()
                .and_then(|json| json.pointer("/error/message"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("Server responded with status {}", status));

            return Err(Error::Operation {
                kind: self.kind(),
                table: self.table().to_string(),
                message,
            });
        }

        let body = match self {
            Self::Update { .. } => json_payload(payload),
            Self::Create { .. } | Self::Delete { .. } => None,
        };

        Ok(OperationResult { status, body })
    }
}

fn into_object(table: &str, record: Value) -> Result<Map<String, Value>> {
    match record {
        Value::Object(map) => Ok(map),
        other => Err(Error::InvalidOperation(format!(
            "record for '{}' must be a JSON object, got {}",
            table, other
        ))),
    }
}

/// `ID` values are usually strings but FileMaker also allows numeric keys
fn identity_string(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn json_request(method: &str, url: &str, json: &str) -> String {
    // Content-Length counts bytes, not chars
    format!(
        "{} {} HTTP/1.1\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}\r\n",
        method,
        url,
        json.len(),
        json
    )
}

/// Status code and the offset just past the status line match
fn status_line(part: &str) -> Result<(u16, usize)> {
    let captures = STATUS_LINE
        .captures(part)
        .ok_or_else(|| Error::Protocol("Could not find status in response".to_string()))?;

    let code = &captures[1];
    let status = code
        .parse::<u16>()
        .map_err(|_| Error::Protocol(format!("Invalid status code '{}' in response", code)))?;

    let end = captures.get(0).map(|m| m.end()).unwrap_or(0);
    Ok((status, end))
}

/// First JSON object found in the payload, ignoring anything after it
fn json_payload(payload: &str) -> Option<Value> {
    let start = payload.find('{')?;
    serde_json::Deserializer::from_str(&payload[start..])
        .into_iter::<Value>()
        .next()
        .and_then(|value| value.ok())
}
