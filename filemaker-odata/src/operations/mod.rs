//! FileMaker batch operations module
//!
//! Create, update and delete operations that are executed together as one
//! transactional `$batch` changeset.

pub mod batch;
pub mod builder;
pub mod executor;
pub mod operation;

pub use batch::{BatchCodec, BatchEnvelope, BoundaryGenerator};
pub use builder::OperationBuilder;
pub use executor::BatchExecutor;
pub use operation::{IDENTITY_FIELD, Operation, OperationKind, OperationResult, PartContext};
