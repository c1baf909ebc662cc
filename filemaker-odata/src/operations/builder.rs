//! Fluent batch builder
//!
//! ```no_run
//! # async fn run(fm: &filemaker_odata::FileMaker) -> filemaker_odata::Result<()> {
//! use serde_json::json;
//!
//! let results = fm
//!     .batch()
//!     .update("FINDING", json!({ "ID": "FINDING-280DC895", "FINDING": "Example 1 2 3" }))?
//!     .create("FINDING", json!({ "FINDING": "Example body" }))?
//!     .delete("FINDING", "SOME-FINDING-ID")
//!     .execute()
//!     .await?;
//! # Ok(())
//! # }
//! ```

use serde_json::Value;

use super::executor::BatchExecutor;
use super::operation::{Operation, OperationResult};
use crate::error::Result;

pub struct OperationBuilder<'a> {
    executor: BatchExecutor<'a>,
    operations: Vec<Operation>,
}

impl<'a> OperationBuilder<'a> {
    pub fn new(executor: BatchExecutor<'a>) -> Self {
        Self {
            executor,
            operations: Vec::new(),
        }
    }

    pub fn create(mut self, table: impl Into<String>, record: Value) -> Result<Self> {
        self.operations.push(Operation::create(table, record)?);
        Ok(self)
    }

    /// `record` must include the `ID` of the record to update
    pub fn update(mut self, table: impl Into<String>, record: Value) -> Result<Self> {
        self.operations.push(Operation::update(table, record)?);
        Ok(self)
    }

    pub fn delete(mut self, table: impl Into<String>, id: impl Into<String>) -> Self {
        self.operations.push(Operation::delete(table, id));
        self
    }

    /// Append an already constructed operation
    pub fn push(mut self, operation: Operation) -> Self {
        self.operations.push(operation);
        self
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Send every queued operation in one transactional request
    pub async fn execute(self) -> Result<Vec<OperationResult>> {
        self.executor.execute(&self.operations).await
    }
}
