use thiserror::Error;

/// Failures reported by the persistence collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store query failed: {0}")]
    QueryFailed(String),
    #[error("store write failed: {0}")]
    WriteFailed(String),
    #[error("record not found: {0}")]
    NotFound(String),
}
