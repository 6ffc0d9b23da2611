//!
//! Mediant: hierarchical-tree indexing for relational tables, keyed by
//! rational nested intervals.
//!
//! Each row of a node table carries four redundant columns that jointly
//! encode its exact position in a forest: a dotted-decimal `path`, two
//! rational boundaries `left`/`right`, and an integer `level`. The
//! encoding is Dan Hazel's rational-numbers keying of nested sets: every
//! path maps to a 2×2 integer matrix ([`codec`]), boundaries fall out of
//! the matrix in O(1), and relocating a whole subtree is one matrix
//! multiplication per row.
//!
//! ## Core concepts
//!
//! * **Matrices (`matrix::Matrix`)**: immutable 2×2 integer values with
//!   determinant `-1` for every node, so inversion stays exact.
//! * **Paths (`path::NodePath`)**: validated dotted positive-integer
//!   paths, the source of truth for positions.
//! * **Codec (`codec`)**: the path↔matrix bijection, boundary derivation,
//!   ancestor enumeration without database access, and the move-matrix
//!   builder ([`codec::relocation`]). Also the migration primitive for
//!   adopting the library on existing data.
//! * **Records (`record::NodeRecord`)**: one row each — guarded tree
//!   columns plus free payload — with the record-oriented save/move/delete
//!   surface.
//! * **Engine (`engine::MutationEngine`)**: the mutation protocol; every
//!   structural write is a short sequence of subtree bulk-moves and gap
//!   shifts inside one transaction.
//! * **Queries (`query::TreeQuery`)**: fluent, order-independent
//!   composition of scopes and modifiers into a single relational query
//!   over `left`, `right`, `level`.
//! * **Stores (`store::Store`)**: the pluggable storage façade;
//!   [`store::MemoryStore`] is the bundled implementation.
//! * **Forest (`forest::Forest`)**: the entry point binding a store and a
//!   schema together.

pub mod codec;
pub mod engine;
pub mod forest;
pub mod matrix;
pub mod path;
pub mod query;
pub mod record;
pub mod schema;
pub mod store;

pub use engine::{MovePosition, MutationEngine, Target};
pub use forest::Forest;
pub use matrix::Matrix;
pub use path::NodePath;
pub use query::TreeQuery;
pub use record::NodeRecord;
pub use schema::TreeSchema;

/// Result type used throughout the Mediant library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the Mediant library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Structured path and codec errors
    #[error(transparent)]
    Path(path::PathError),

    /// Structured record errors, including the read-only guard
    #[error(transparent)]
    Record(record::RecordError),

    /// Structured mutation-engine errors
    #[error(transparent)]
    Engine(engine::EngineError),

    /// Structured query-compilation errors
    #[error(transparent)]
    Query(query::QueryError),

    /// Structured storage errors from the store module
    #[error(transparent)]
    Store(store::StoreError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Path(_) => "path",
            Error::Record(_) => "record",
            Error::Engine(_) => "engine",
            Error::Query(_) => "query",
            Error::Store(_) => "store",
        }
    }

    /// Check if this error indicates a resource was not found.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Engine(engine_err) => engine_err.is_not_found(),
            Error::Store(store_err) => store_err.is_not_found(),
            _ => false,
        }
    }

    /// Check if this error came from the read-only guard on tree columns.
    pub fn is_read_only(&self) -> bool {
        match self {
            Error::Record(record_err) => record_err.is_read_only(),
            _ => false,
        }
    }

    /// Check if this error flags an invalid item configuration — an
    /// unresolvable target or a new record that is already placed.
    pub fn is_invalid_configuration(&self) -> bool {
        match self {
            Error::Engine(engine_err) => engine_err.is_invalid_configuration(),
            _ => false,
        }
    }

    /// Check if this error flags a non-positive path segment.
    pub fn is_invalid_segment(&self) -> bool {
        match self {
            Error::Path(path_err) => path_err.is_invalid_segment(),
            _ => false,
        }
    }

    /// Check if this error is storage-related.
    pub fn is_store_error(&self) -> bool {
        matches!(self, Error::Store(_))
    }
}
