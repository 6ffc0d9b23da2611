//! Error types for the mutation engine.

use thiserror::Error;

/// Errors raised by structural mutations.
#[non_exhaustive]
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    /// A path-string target did not resolve to an existing row.
    #[error("No node exists at path '{path}'")]
    TargetNotFound { path: String },

    /// A new record handed to a positional save already carries a path;
    /// the call is ambiguous.
    #[error("New record already carries path '{path}'")]
    PathAlreadyAssigned { path: String },

    /// A record passed as a positional target has neither an id nor a
    /// path to resolve by.
    #[error("Target record has not been persisted")]
    TargetNotPersisted,

    /// The operation requires the record itself to be persisted.
    #[error("Record has not been persisted")]
    NotPersisted,
}

impl EngineError {
    /// Check if this error flags an invalid item configuration — a target
    /// that cannot be resolved or a new record that is already placed.
    pub fn is_invalid_configuration(&self) -> bool {
        matches!(
            self,
            EngineError::TargetNotFound { .. }
                | EngineError::PathAlreadyAssigned { .. }
                | EngineError::TargetNotPersisted
        )
    }

    /// Check if this error indicates a missing row.
    pub fn is_not_found(&self) -> bool {
        matches!(self, EngineError::TargetNotFound { .. })
    }
}

impl From<EngineError> for crate::Error {
    fn from(err: EngineError) -> Self {
        crate::Error::Engine(err)
    }
}
