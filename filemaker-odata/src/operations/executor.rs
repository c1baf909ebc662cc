//! Runs a list of operations as one `$batch` request

use log::{debug, error, info};

use super::batch::BatchCodec;
use super::operation::{Operation, OperationResult};
use crate::connection::ConnectionDescriptor;
use crate::error::Result;
use crate::transport::{RequestOptions, Transport};

/// Encodes, sends and decodes a single batch. One call issues exactly one request.
#[derive(Clone, Copy)]
pub struct BatchExecutor<'a> {
    transport: &'a dyn Transport,
    connection: &'a ConnectionDescriptor,
    codec: &'a BatchCodec,
}

impl<'a> BatchExecutor<'a> {
    pub fn new(
        transport: &'a dyn Transport,
        connection: &'a ConnectionDescriptor,
        codec: &'a BatchCodec,
    ) -> Self {
        Self {
            transport,
            connection,
            codec,
        }
    }

    /// Execute the operations transactionally.
    ///
    /// Either every result is returned, in input order, or an error is. A
    /// failed part yields no partial results.
    pub async fn execute(&self, operations: &[Operation]) -> Result<Vec<OperationResult>> {
        let envelope = self.codec.encode(self.connection, operations)?;

        info!(
            "Executing batch of {} operations against {}",
            operations.len(),
            self.connection.database
        );
        debug!("Batch request body:\n{}", envelope.body);

        let options = RequestOptions::new().header("Content-Type", envelope.content_type());
        let url = self.connection.url("$batch");

        let response = match self
            .transport
            .post(&url, Some(envelope.body), &options)
            .await
        {
            Ok(response) => response,
            Err(err) => {
                error!(
                    "Batch request failed: {} {}",
                    err,
                    err.body.as_deref().unwrap_or("")
                );
                return Err(err.into());
            }
        };

        let body = response.text();
        debug!("Batch response body:\n{}", body);

        let results = BatchCodec::decode(operations, &body).inspect_err(|err| {
            error!("Batch failed: {}", err);
        })?;

        info!("Batch of {} operations committed", results.len());
        Ok(results)
    }
}
