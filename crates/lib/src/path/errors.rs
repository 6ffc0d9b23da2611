//! Error types for path validation and the path↔matrix codec.

use thiserror::Error;

/// Errors raised while validating dotted paths or translating them to and
/// from node matrices.
#[non_exhaustive]
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PathError {
    /// Paths must carry at least one segment.
    #[error("Path cannot be empty")]
    Empty,

    /// A dotted component was empty (consecutive or trailing dots).
    #[error("Path component at position {position} is empty")]
    EmptyComponent { position: usize },

    /// A dotted component was not a decimal integer.
    #[error("Invalid path component '{component}': segments are positive integers")]
    InvalidComponent { component: String },

    /// A segment outside `1..` was used where a child position is required.
    ///
    /// Segment `0` (and below) has no matrix; this always signals a
    /// programming bug in the caller.
    #[error("Invalid segment {segment}: segments start at 1")]
    InvalidSegment { segment: i64 },

    /// A numerator/denominator pair does not identify any node of the
    /// encoding (not coprime, not positive, or not reachable).
    #[error("Boundary {numerator}/{denominator} does not identify a node")]
    InvalidBoundary { numerator: i64, denominator: i64 },

    /// A matrix handed to the codec is not a node matrix.
    #[error("Matrix with determinant {determinant} is not a node matrix")]
    DegenerateMatrix { determinant: i64 },
}

impl PathError {
    /// Check if this error flags a non-positive segment.
    pub fn is_invalid_segment(&self) -> bool {
        matches!(self, PathError::InvalidSegment { .. })
    }

    /// Check if this error came from parsing a dotted string.
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            PathError::Empty
                | PathError::EmptyComponent { .. }
                | PathError::InvalidComponent { .. }
        )
    }
}

impl From<PathError> for crate::Error {
    fn from(err: PathError) -> Self {
        crate::Error::Path(err)
    }
}
