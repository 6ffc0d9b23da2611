//! Storage abstraction for node tables.
//!
//! The [`Store`] trait is the thin, typed façade the tree layer demands
//! from the underlying SQL connection: transactions, filtered row streams,
//! point updates, range deletes, inserts. Everything above it — records,
//! the mutation engine, the query builder — is independent of the specific
//! storage mechanism.
//!
//! [`MemoryStore`] is the bundled implementation, suitable for testing and
//! development; adopting the library against a real database means
//! implementing [`Store`] over that connection, with [`Select::to_sql`]
//! providing the statement text.

pub mod errors;
mod memory;
pub mod select;

use std::any::Any;

use crate::Result;

pub use errors::StoreError;
pub use memory::MemoryStore;
pub use select::{CmpOp, Predicate, Row, RowId, Select, SortKey, Value};

/// The storage operations the tree layer requires.
///
/// Implementations are synchronous and blocking: every call runs on the
/// calling thread and suspends only at database I/O boundaries. The tree
/// layer owns transaction boundaries — it opens one transaction per
/// mutation, never nests them, and never holds one across calls.
pub trait Store: Send + Sync {
    /// Opens a transaction.
    ///
    /// # Errors
    /// [`StoreError::TransactionAlreadyActive`] if one is already open.
    fn begin(&self) -> Result<()>;

    /// Commits the open transaction.
    fn commit(&self) -> Result<()>;

    /// Rolls the open transaction back, discarding every change made
    /// since [`Store::begin`].
    fn rollback(&self) -> Result<()>;

    /// Executes a read request, returning matching rows in request order.
    fn select(&self, query: &Select) -> Result<Vec<Row>>;

    /// Fetches one row by id.
    ///
    /// # Errors
    /// [`StoreError::RowNotFound`] if no such row exists.
    fn row(&self, id: RowId) -> Result<Row>;

    /// Inserts a row and returns its generated id.
    fn insert(&self, values: &[(String, Value)]) -> Result<RowId>;

    /// Overwrites the given columns of one row.
    fn update_row(&self, id: RowId, assignments: &[(String, Value)]) -> Result<()>;

    /// Deletes every row matching the predicate, returning the count.
    fn delete_where(&self, predicate: &Predicate) -> Result<usize>;

    /// Returns the store as a dynamic `Any` for downcasting to a concrete
    /// implementation. Use with caution.
    fn as_any(&self) -> &dyn Any;
}
