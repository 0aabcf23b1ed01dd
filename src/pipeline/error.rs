//! Crate-wide error taxonomy for pipeline stages and workflow operations.
//!
//! Every variant is a caller-visible, synchronous failure. No variant is
//! retried by the engine itself; a failed operation leaves all touched
//! records unchanged.

use thiserror::Error;

use crate::db::StorageError;

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Invalid state for {operation}: expected {expected}, record is {actual}")]
    InvalidState {
        operation: &'static str,
        expected: &'static str,
        actual: String,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Pipeline stage failed: {0}")]
    StageFailed(String),
}
