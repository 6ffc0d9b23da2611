//! Error types for query building.

use thiserror::Error;

/// Errors raised while compiling a navigation query.
#[non_exhaustive]
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
    /// The chosen scope navigates relative to a node, but the builder was
    /// not bound to one.
    #[error("Scope '{scope}' requires a reference node")]
    UnboundReference { scope: &'static str },
}

impl From<QueryError> for crate::Error {
    fn from(err: QueryError) -> Self {
        crate::Error::Query(err)
    }
}
