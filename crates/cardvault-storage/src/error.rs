//! Store error types.
//!
//! Variants describe the condition, not the engine. Backend-specific codes
//! (such as a PostgreSQL SQLSTATE) are translated into these before they
//! leave a store implementation.

/// Errors that can occur during record store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("unique constraint '{constraint}' violated")]
    UniqueViolation { constraint: String },

    /// No record exists with the given id.
    #[error("{kind} with id {id} not found")]
    NotFound { kind: &'static str, id: i64 },

    /// Failed to open or connect to the backend.
    #[error("failed to open store at '{target}': {reason}")]
    Open { target: String, reason: String },

    /// The underlying engine failed.
    #[error("store backend error: {reason}")]
    Backend { reason: String },
}
