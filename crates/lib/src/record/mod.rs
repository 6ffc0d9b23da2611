//! Node records: one row of a tree table.
//!
//! A [`NodeRecord`] owns the in-memory copy of a row's four tree columns
//! (`path`, `left`, `right`, `level`) plus its user payload. The tree
//! columns are the engine's to write: the public surface exposes them
//! read-only, guarded by a protection flag that the row loader disarms
//! internally while populating and re-arms on exit. Callers never see the
//! flag change; they can only opt out explicitly through
//! [`NodeRecord::protect_readonly`] for diagnostic work.

pub mod errors;

use std::cell::Cell;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

use crate::engine::{MutationEngine, Target};
use crate::matrix::Matrix;
use crate::path::NodePath;
use crate::query::TreeQuery;
use crate::schema::TreeSchema;
use crate::store::{Row, RowId, Store, StoreError, Value};
use crate::{Result, codec};

pub use errors::RecordError;

/// Extra column assignments handed to a save operation.
pub type Fields = BTreeMap<String, Value>;

/// One row of a node table, bound to its store and schema.
#[derive(Clone)]
pub struct NodeRecord {
    store: Arc<dyn Store>,
    schema: Arc<TreeSchema>,
    id: Option<RowId>,
    path: Option<NodePath>,
    left: f64,
    right: f64,
    level: i64,
    payload: BTreeMap<String, Value>,
    protected: bool,
    matrix: Cell<Option<Matrix>>,
}

impl NodeRecord {
    /// Creates a fresh, unpersisted record.
    pub fn new(store: Arc<dyn Store>, schema: Arc<TreeSchema>) -> Self {
        NodeRecord {
            store,
            schema,
            id: None,
            path: None,
            left: 0.0,
            right: 0.0,
            level: 0,
            payload: BTreeMap::new(),
            protected: true,
            matrix: Cell::new(None),
        }
    }

    /// Loads a record from a stored row.
    pub(crate) fn from_row(
        store: Arc<dyn Store>,
        schema: Arc<TreeSchema>,
        row: &Row,
    ) -> Result<Self> {
        let mut record = NodeRecord::new(store, schema);
        record.populate(row)?;
        Ok(record)
    }

    /// Re-reads this record's row from the store, replacing all in-memory
    /// state with the authoritative copy.
    pub fn refresh(&mut self) -> Result<()> {
        let id = self.id.ok_or(RecordError::NotPersisted)?;
        let row = self.store.row(id)?;
        self.populate(&row)
    }

    /// Populates from a row. Internal: bypasses the read-only guard, which
    /// stays armed for callers throughout.
    pub(crate) fn populate(&mut self, row: &Row) -> Result<()> {
        let schema = Arc::clone(&self.schema);
        let text = require(row, &schema.path_column)?
            .as_str()
            .ok_or_else(|| unexpected(row, &schema.path_column))?;
        let path = NodePath::from_str(text).map_err(|_| unexpected(row, &schema.path_column))?;
        let left = require(row, &schema.left_column)?
            .as_f64()
            .ok_or_else(|| unexpected(row, &schema.left_column))?;
        let right = require(row, &schema.right_column)?
            .as_f64()
            .ok_or_else(|| unexpected(row, &schema.right_column))?;
        let level = require(row, &schema.level_column)?
            .as_i64()
            .ok_or_else(|| unexpected(row, &schema.level_column))?;

        self.id = Some(row.id);
        self.path = Some(path);
        self.left = left;
        self.right = right;
        self.level = level;
        self.matrix.set(None);
        self.payload.clear();
        for (column, value) in &row.values {
            if schema.is_tree_column(column) || *column == schema.id_column {
                continue;
            }
            self.payload.insert(column.clone(), value.clone());
        }
        Ok(())
    }

    /// The primary key, once persisted.
    pub fn id(&self) -> Option<RowId> {
        self.id
    }

    /// The dotted path, once assigned.
    pub fn path(&self) -> Option<&NodePath> {
        self.path.as_ref()
    }

    /// The left boundary.
    pub fn left(&self) -> f64 {
        self.left
    }

    /// The right boundary.
    pub fn right(&self) -> f64 {
        self.right
    }

    /// The level; roots are level 1.
    pub fn level(&self) -> i64 {
        self.level
    }

    /// Whether the record has not been persisted yet.
    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    /// Whether this node is a forest root.
    pub fn is_root(&self) -> bool {
        self.level == 1
    }

    /// The schema this record is bound to.
    pub fn schema(&self) -> &Arc<TreeSchema> {
        &self.schema
    }

    /// The database column holding the dotted path.
    pub fn path_column(&self) -> &str {
        &self.schema.path_column
    }

    /// The database column holding the left boundary.
    pub fn left_column(&self) -> &str {
        &self.schema.left_column
    }

    /// The database column holding the right boundary.
    pub fn right_column(&self) -> &str {
        &self.schema.right_column
    }

    /// The database column holding the level.
    pub fn level_column(&self) -> &str {
        &self.schema.level_column
    }

    /// The store this record is bound to.
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// The node matrix for the current path, computed once and cached.
    /// `None` while no path is assigned.
    pub fn node_matrix(&self) -> Option<Matrix> {
        if let Some(cached) = self.matrix.get() {
            return Some(cached);
        }
        let matrix = codec::from_path(self.path.as_ref()?);
        self.matrix.set(Some(matrix));
        Some(matrix)
    }

    /// Whether this record may move to `target` — false when the target
    /// is the record itself or anywhere inside its own subtree.
    pub fn can_move(&self, target: &NodePath) -> bool {
        match &self.path {
            Some(path) => path != target && !path.is_ancestor_of(target),
            None => true,
        }
    }

    /// A payload value.
    ///
    /// Tree columns are not payload; read them through [`NodeRecord::path`]
    /// and the boundary accessors.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.payload.get(column)
    }

    /// The full payload map.
    pub fn payload(&self) -> &BTreeMap<String, Value> {
        &self.payload
    }

    /// Sets a payload value, to be persisted by the next save.
    ///
    /// # Errors
    /// Writing one of the four tree columns fails with
    /// [`RecordError::ReadOnlyTreeField`] while protection is on. With
    /// protection off the write goes straight to the tree state instead —
    /// diagnostic use only.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) -> Result<()> {
        let column = column.into();
        let value = value.into();
        if self.schema.is_tree_column(&column) {
            if self.protected {
                return Err(RecordError::ReadOnlyTreeField { column }.into());
            }
            return self.set_tree_value(&column, value);
        }
        self.payload.insert(column, value);
        Ok(())
    }

    /// Arms or disarms the read-only guard on the tree columns.
    /// Diagnostic use only; the guard is armed by default.
    pub fn protect_readonly(&mut self, protected: bool) {
        self.protected = protected;
    }

    /// An unprotected write to one of the tree columns.
    fn set_tree_value(&mut self, column: &str, value: Value) -> Result<()> {
        let schema = Arc::clone(&self.schema);
        let wrong_type = || RecordError::UnexpectedTreeValue {
            column: column.to_string(),
        };
        if column == schema.path_column {
            let text = value.as_str().ok_or_else(wrong_type)?;
            let path = NodePath::from_str(text)?;
            self.set_path(path);
        } else if column == schema.left_column {
            self.left = value.as_f64().ok_or_else(wrong_type)?;
        } else if column == schema.right_column {
            self.right = value.as_f64().ok_or_else(wrong_type)?;
        } else {
            self.level = value.as_i64().ok_or_else(wrong_type)?;
        }
        Ok(())
    }

    /// Assigns a path and derives the three dependent columns from it.
    pub(crate) fn set_path(&mut self, path: NodePath) {
        let (left, right, level) = codec::columns_for_path(&path);
        self.path = Some(path);
        self.left = left;
        self.right = right;
        self.level = level;
        self.matrix.set(None);
    }

    pub(crate) fn set_row_id(&mut self, id: Option<RowId>) {
        self.id = id;
    }

    /// Merges extra save fields into the payload through the guarded
    /// setter, so tree columns cannot be smuggled in.
    pub(crate) fn merge_fields(&mut self, fields: Option<Fields>) -> Result<()> {
        if let Some(fields) = fields {
            for (column, value) in fields {
                self.set(column, value)?;
            }
        }
        Ok(())
    }

    /// The four tree-column assignments for this record.
    pub(crate) fn tree_assignments(&self) -> Result<Vec<(String, Value)>> {
        let path = self.path.as_ref().ok_or(RecordError::MissingPath)?;
        Ok(vec![
            (self.schema.path_column.clone(), Value::Text(path.to_string())),
            (self.schema.left_column.clone(), Value::Real(self.left)),
            (self.schema.right_column.clone(), Value::Real(self.right)),
            (self.schema.level_column.clone(), Value::Integer(self.level)),
        ])
    }

    /// The payload assignments for this record.
    pub(crate) fn payload_assignments(&self) -> Vec<(String, Value)> {
        self.payload
            .iter()
            .map(|(column, value)| (column.clone(), value.clone()))
            .collect()
    }

    fn engine(&self) -> MutationEngine {
        MutationEngine::new(Arc::clone(&self.store), Arc::clone(&self.schema))
    }

    /// Persists the record. New records without a path are allocated the
    /// next free root path; persisted records have their payload updated.
    pub fn save(&mut self, fields: Option<Fields>) -> Result<bool> {
        self.engine().save(self, fields)
    }

    /// Saves this record as the last child of `target`.
    pub fn save_into<'a>(
        &mut self,
        target: impl Into<Target<'a>>,
        fields: Option<Fields>,
    ) -> Result<bool> {
        self.engine().save_into(self, target.into(), fields)
    }

    /// Saves this record as the sibling immediately before `target`.
    pub fn save_before<'a>(
        &mut self,
        target: impl Into<Target<'a>>,
        fields: Option<Fields>,
    ) -> Result<bool> {
        self.engine().save_before(self, target.into(), fields)
    }

    /// Saves this record as the sibling immediately after `target`.
    pub fn save_after<'a>(
        &mut self,
        target: impl Into<Target<'a>>,
        fields: Option<Fields>,
    ) -> Result<bool> {
        self.engine().save_after(self, target.into(), fields)
    }

    /// Deletes this node and its entire subtree, returning the number of
    /// rows removed.
    pub fn delete(&mut self) -> Result<usize> {
        self.engine().delete(self)
    }

    /// A query builder bound to this record.
    ///
    /// Builders are single-use values; obtain a fresh one per query.
    pub fn relative_query(&self) -> Result<TreeQuery> {
        TreeQuery::for_record(self)
    }
}

impl std::fmt::Debug for NodeRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRecord")
            .field("id", &self.id)
            .field("path", &self.path.as_ref().map(|p| p.to_string()))
            .field("left", &self.left)
            .field("right", &self.right)
            .field("level", &self.level)
            .field("payload", &self.payload)
            .finish()
    }
}

fn require<'a>(row: &'a Row, column: &str) -> Result<&'a Value> {
    row.get(column).ok_or_else(|| {
        StoreError::MissingColumn {
            id: row.id,
            column: column.to_string(),
        }
        .into()
    })
}

fn unexpected(row: &Row, column: &str) -> crate::Error {
    StoreError::UnexpectedValue {
        id: row.id,
        column: column.to_string(),
    }
    .into()
}
