//! Error types for node records.

use thiserror::Error;

/// Errors raised by the public [`NodeRecord`](super::NodeRecord) surface.
#[non_exhaustive]
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RecordError {
    /// A tree column was written through the public surface while the
    /// read-only guard is armed. Tree columns change only through the
    /// mutation protocol.
    #[error("Tree column '{column}' is read-only")]
    ReadOnlyTreeField { column: String },

    /// An unprotected tree-column write carried a value of the wrong
    /// family (e.g. text into a boundary column).
    #[error("Value for tree column '{column}' has the wrong type")]
    UnexpectedTreeValue { column: String },

    /// The operation requires a persisted row.
    #[error("Record has not been persisted")]
    NotPersisted,

    /// The operation requires the record to carry a path.
    #[error("Record has no path")]
    MissingPath,
}

impl RecordError {
    /// Check if this error came from the read-only guard.
    pub fn is_read_only(&self) -> bool {
        matches!(self, RecordError::ReadOnlyTreeField { .. })
    }
}

impl From<RecordError> for crate::Error {
    fn from(err: RecordError) -> Self {
        crate::Error::Record(err)
    }
}
