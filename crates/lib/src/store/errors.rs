//! Error types for store operations.

use thiserror::Error;

use super::select::RowId;

/// Errors surfaced by a [`Store`](super::Store) implementation.
///
/// Any backend failure reaches the caller as one of these; the mutation
/// engine rolls its transaction back first and re-raises unchanged.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StoreError {
    /// No row with the given id exists.
    #[error("Row {id} not found")]
    RowNotFound { id: RowId },

    /// A commit or rollback was issued with no open transaction.
    #[error("No transaction is active")]
    NoActiveTransaction,

    /// A begin was issued while a transaction is already open.
    ///
    /// Transactions are acquired and released within a single mutation
    /// call and never nest.
    #[error("A transaction is already active")]
    TransactionAlreadyActive,

    /// A row is missing a column the tree layer requires.
    #[error("Row {id} is missing column '{column}'")]
    MissingColumn { id: RowId, column: String },

    /// A tree column held a value of the wrong family.
    #[error("Column '{column}' of row {id} holds an unexpected value")]
    UnexpectedValue { id: RowId, column: String },

    /// Failure in the underlying connection or file.
    #[error("Store backend error: {reason}")]
    Backend { reason: String },

    /// I/O error from snapshot persistence.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error from snapshot persistence.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StoreError {
    /// Check if this error indicates a missing row.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::RowNotFound { .. })
    }

    /// Check if this error indicates misuse of the transaction envelope.
    pub fn is_transaction_error(&self) -> bool {
        matches!(
            self,
            StoreError::NoActiveTransaction | StoreError::TransactionAlreadyActive
        )
    }

    /// Check if this error indicates a malformed row.
    pub fn is_integrity_error(&self) -> bool {
        matches!(
            self,
            StoreError::MissingColumn { .. } | StoreError::UnexpectedValue { .. }
        )
    }
}

impl From<StoreError> for crate::Error {
    fn from(err: StoreError) -> Self {
        crate::Error::Store(err)
    }
}
