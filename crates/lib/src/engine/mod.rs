//! The tree-mutation protocol.
//!
//! Every structural write — insert, move, delete — decomposes into at most
//! three bulk passes: an optional gap-open at the destination (`B(+1)` over
//! the later siblings), one relocation of the moving subtree by a single
//! move matrix, and an optional gap-close at the origin (`B(-1)` over the
//! siblings left behind). No pass ever touches rows outside the affected
//! parent intervals, so the cost of a mutation is proportional to the
//! subtrees it displaces, never to the whole forest.
//!
//! Each operation runs inside one store transaction and rolls back on any
//! error; partial structural state is never visible.

pub mod errors;

use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::codec::{self, relocation};
use crate::matrix::Matrix;
use crate::path::NodePath;
use crate::query::TreeQuery;
use crate::record::{Fields, NodeRecord, RecordError};
use crate::schema::TreeSchema;
use crate::store::{CmpOp, Predicate, Row, RowId, Select, SortKey, Store, Value};
use crate::{Result, path::PathError};

pub use errors::EngineError;

/// A mutation target: an already-loaded record or a path string to be
/// resolved by point query.
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    Record(&'a NodeRecord),
    Path(&'a str),
}

impl<'a> From<&'a NodeRecord> for Target<'a> {
    fn from(record: &'a NodeRecord) -> Self {
        Target::Record(record)
    }
}

impl<'a> From<&'a str> for Target<'a> {
    fn from(path: &'a str) -> Self {
        Target::Path(path)
    }
}

/// Where a subtree would land relative to a target, for depth checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovePosition {
    Into,
    Before,
    After,
}

/// The sibling whose chain closes the gap a move or delete leaves behind.
///
/// The left boundary is captured before any pass runs: after a same-parent
/// move the vacated slot may have been re-occupied by the moved node
/// itself, and the chain shift must start at the slot, not at the
/// sibling's current position.
#[derive(Debug, Clone, Copy)]
struct CapturedSibling {
    id: RowId,
    left: f64,
}

/// Executes the mutation protocol against one store and schema.
pub struct MutationEngine {
    store: Arc<dyn Store>,
    schema: Arc<TreeSchema>,
}

impl MutationEngine {
    pub fn new(store: Arc<dyn Store>, schema: Arc<TreeSchema>) -> Self {
        MutationEngine { store, schema }
    }

    /// Resolves a target to a freshly loaded record.
    ///
    /// # Errors
    /// [`EngineError::TargetNotFound`] when a path does not resolve;
    /// [`EngineError::TargetNotPersisted`] for an unsaved record target.
    pub fn resolve(&self, target: Target<'_>) -> Result<NodeRecord> {
        match target {
            Target::Record(record) => {
                if let Some(id) = record.id() {
                    let row = self.store.row(id)?;
                    self.record_from_row(&row)
                } else if let Some(path) = record.path() {
                    self.resolve_path(&path.to_string())
                } else {
                    Err(EngineError::TargetNotPersisted.into())
                }
            }
            Target::Path(path) => self.resolve_path(path),
        }
    }

    /// Persists a record; allocates the next free root path for a new
    /// record without one.
    pub fn save(&self, record: &mut NodeRecord, fields: Option<Fields>) -> Result<bool> {
        self.transactionally(|eng| {
            record.merge_fields(fields)?;
            if record.is_new() {
                if record.path().is_none() {
                    let path = eng.next_root_path()?;
                    debug!(path = %path, "allocating root path");
                    record.set_path(path);
                }
                eng.insert_record(record)?;
            } else {
                eng.update_payload(record)?;
            }
            Ok(true)
        })
    }

    /// Saves `record` as the last child of `target`.
    ///
    /// Returns `Ok(false)` when the positional work was skipped because
    /// the target lies inside the record's own subtree; scalar fields are
    /// still saved in that case.
    pub fn save_into(
        &self,
        record: &mut NodeRecord,
        target: Target<'_>,
        fields: Option<Fields>,
    ) -> Result<bool> {
        let target = self.resolve(target)?;
        let target_path = required_path(&target)?;
        debug!(target = %target_path, new = record.is_new(), "save_into");

        if record.is_new() {
            self.reject_placed(record)?;
            return self.transactionally(|eng| {
                record.merge_fields(fields)?;
                let segment = match eng.last_child(&target, None)? {
                    Some(child) => required_path(&child)?.last_segment() + 1,
                    None => 1,
                };
                record.set_path(target_path.child(segment)?);
                eng.insert_record(record)?;
                Ok(true)
            });
        }

        self.transactionally(|eng| {
            record.merge_fields(fields)?;
            eng.update_payload(record)?;
            if !record.can_move(&target_path) {
                debug!(target = %target_path, "move skipped: target inside own subtree");
                return Ok(false);
            }
            let gap = eng.capture_next_sibling(record)?;
            let self_path = required_path(record)?;
            let bump = match eng.last_child(&target, Some(record))? {
                Some(child) => required_path(&child)?.last_segment() + 1 - self_path.last_segment(),
                None => 1 - self_path.last_segment(),
            };
            let mover = relocation(
                parent_of(record)?.as_ref(),
                Some(&required_matrix(&target)?),
                bump,
            )?;
            eng.move_subtree(record, &mover)?;
            if let Some(gap) = gap {
                eng.close_gap(&gap)?;
            }
            record.refresh()?;
            Ok(true)
        })
    }

    /// Saves `record` as the sibling immediately before `target`.
    pub fn save_before(
        &self,
        record: &mut NodeRecord,
        target: Target<'_>,
        fields: Option<Fields>,
    ) -> Result<bool> {
        let mut target = self.resolve(target)?;
        let target_path = required_path(&target)?;
        debug!(target = %target_path, new = record.is_new(), "save_before");

        if record.is_new() {
            self.reject_placed(record)?;
            return self.transactionally(|eng| {
                record.merge_fields(fields)?;
                // The target's slot, captured before the gap opens.
                eng.open_gap(&target)?;
                record.set_path(target_path);
                eng.insert_record(record)?;
                Ok(true)
            });
        }

        self.transactionally(|eng| {
            record.merge_fields(fields)?;
            eng.update_payload(record)?;
            if !record.can_move(&target_path) {
                debug!(target = %target_path, "move skipped: target inside own subtree");
                return Ok(false);
            }
            let gap = eng.capture_next_sibling(record)?;
            eng.open_gap(&target)?;
            target.refresh()?;
            record.refresh()?;

            let target_path = required_path(&target)?;
            let self_path = required_path(record)?;
            let bump = target_path.last_segment() - self_path.last_segment() - 1;
            let mover = relocation(
                parent_of(record)?.as_ref(),
                parent_of(&target)?.as_ref(),
                bump,
            )?;
            eng.move_subtree(record, &mover)?;
            record.refresh()?;
            if let Some(gap) = gap {
                eng.close_gap(&gap)?;
            }
            record.refresh()?;
            Ok(true)
        })
    }

    /// Saves `record` as the sibling immediately after `target`.
    pub fn save_after(
        &self,
        record: &mut NodeRecord,
        target: Target<'_>,
        fields: Option<Fields>,
    ) -> Result<bool> {
        let target = self.resolve(target)?;
        let target_path = required_path(&target)?;

        // With a following sibling the operation is "before that sibling".
        if let Some(next) = TreeQuery::for_record(&target)?.siblings().next().one()? {
            return self.save_before(record, Target::Record(&next), fields);
        }
        debug!(target = %target_path, new = record.is_new(), "save_after last sibling");

        if record.is_new() {
            self.reject_placed(record)?;
            return self.transactionally(|eng| {
                record.merge_fields(fields)?;
                let segment = target_path.last_segment() + 1;
                let path = match target_path.parent() {
                    Some(parent) => parent.child(segment)?,
                    None => NodePath::root(segment)?,
                };
                record.set_path(path);
                eng.insert_record(record)?;
                Ok(true)
            });
        }

        self.transactionally(|eng| {
            record.merge_fields(fields)?;
            eng.update_payload(record)?;
            if !record.can_move(&target_path) {
                debug!(target = %target_path, "move skipped: target inside own subtree");
                return Ok(false);
            }
            let gap = eng.capture_next_sibling(record)?;
            let self_path = required_path(record)?;
            let bump = target_path.last_segment() - self_path.last_segment() + 1;
            let mover = relocation(
                parent_of(record)?.as_ref(),
                parent_of(&target)?.as_ref(),
                bump,
            )?;
            eng.move_subtree(record, &mover)?;
            if let Some(gap) = gap {
                eng.close_gap(&gap)?;
            }
            record.refresh()?;
            Ok(true)
        })
    }

    /// Deletes the record and its entire subtree, closes the gap it leaves
    /// behind, and returns the number of rows removed.
    pub fn delete(&self, record: &mut NodeRecord) -> Result<usize> {
        if record.is_new() {
            return Err(EngineError::NotPersisted.into());
        }
        self.transactionally(|eng| {
            let gap = eng.capture_next_sibling(record)?;
            let predicate = Predicate::All(vec![
                Predicate::cmp(&eng.schema.left_column, CmpOp::Ge, record.left()),
                Predicate::cmp(&eng.schema.right_column, CmpOp::Le, record.right()),
            ]);
            let removed = eng.store.delete_where(&predicate)?;
            debug!(
                path = %required_path(record)?,
                removed,
                "deleted subtree"
            );
            if let Some(gap) = gap {
                eng.close_gap(&gap)?;
            }
            record.set_row_id(None);
            Ok(removed)
        })
    }

    // Depth pre-validation.

    /// The depth of the record's subtree below the record itself
    /// (0 for a leaf).
    pub fn subtree_depth(&self, record: &NodeRecord) -> Result<i64> {
        let select = Select {
            predicate: Some(Predicate::All(vec![
                Predicate::cmp(&self.schema.left_column, CmpOp::Ge, record.left()),
                Predicate::cmp(&self.schema.right_column, CmpOp::Le, record.right()),
            ])),
            order: vec![SortKey::desc(&self.schema.level_column)],
            limit: Some(1),
        };
        let deepest = self
            .store
            .select(&select)?
            .first()
            .and_then(|row| row.get(&self.schema.level_column).and_then(Value::as_i64))
            .unwrap_or(record.level());
        Ok(deepest - record.level())
    }

    /// The deepest level the subtree would reach if moved into `target`.
    pub fn max_level_if_move_into(&self, record: &NodeRecord, target: Target<'_>) -> Result<i64> {
        let target = self.resolve(target)?;
        Ok(target.level() + 1 + self.subtree_depth(record)?)
    }

    /// The deepest level the subtree would reach if moved before `target`.
    pub fn max_level_if_move_before(&self, record: &NodeRecord, target: Target<'_>) -> Result<i64> {
        let target = self.resolve(target)?;
        Ok(target.level() + self.subtree_depth(record)?)
    }

    /// The deepest level the subtree would reach if moved after `target`.
    pub fn max_level_if_move_after(&self, record: &NodeRecord, target: Target<'_>) -> Result<i64> {
        self.max_level_if_move_before(record, target)
    }

    /// Whether a move would push the subtree past a level cap.
    pub fn would_exceed_max_level(
        &self,
        record: &NodeRecord,
        target: Target<'_>,
        position: MovePosition,
        max_level: i64,
    ) -> Result<bool> {
        let reached = match position {
            MovePosition::Into => self.max_level_if_move_into(record, target)?,
            MovePosition::Before => self.max_level_if_move_before(record, target)?,
            MovePosition::After => self.max_level_if_move_after(record, target)?,
        };
        Ok(reached > max_level)
    }

    // Internals.

    /// Runs `f` inside a store transaction; commits on success, rolls back
    /// and re-raises unchanged on any error.
    fn transactionally<T>(&self, f: impl FnOnce(&Self) -> Result<T>) -> Result<T> {
        self.store.begin()?;
        match f(self) {
            Ok(value) => {
                self.store.commit()?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = self.store.rollback() {
                    warn!(error = %rollback_err, "rollback failed");
                }
                Err(err)
            }
        }
    }

    fn record_from_row(&self, row: &Row) -> Result<NodeRecord> {
        NodeRecord::from_row(Arc::clone(&self.store), Arc::clone(&self.schema), row)
    }

    fn resolve_path(&self, path: &str) -> Result<NodeRecord> {
        let select = Select {
            predicate: Some(Predicate::cmp(&self.schema.path_column, CmpOp::Eq, path)),
            order: Vec::new(),
            limit: Some(1),
        };
        match self.store.select(&select)?.first() {
            Some(row) => self.record_from_row(row),
            None => Err(EngineError::TargetNotFound {
                path: path.to_string(),
            }
            .into()),
        }
    }

    fn reject_placed(&self, record: &NodeRecord) -> Result<()> {
        if let Some(path) = record.path() {
            return Err(EngineError::PathAlreadyAssigned {
                path: path.to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// The path of the next root: one past the highest existing root
    /// segment, or `"1"` in an empty forest.
    fn next_root_path(&self) -> Result<NodePath> {
        let select = Select {
            predicate: Some(Predicate::cmp(&self.schema.level_column, CmpOp::Eq, 1i64)),
            order: vec![SortKey::desc(&self.schema.left_column)],
            limit: Some(1),
        };
        match self.store.select(&select)?.first() {
            Some(row) => {
                let last = self.record_from_row(row)?;
                Ok(NodePath::root(required_path(&last)?.last_segment() + 1)?)
            }
            None => Ok(NodePath::root(1)?),
        }
    }

    fn insert_record(&self, record: &mut NodeRecord) -> Result<()> {
        let mut assignments = record.tree_assignments()?;
        assignments.extend(record.payload_assignments());
        let id = self.store.insert(&assignments)?;
        record.set_row_id(Some(id));
        trace!(id, path = %required_path(record)?, "inserted node");
        Ok(())
    }

    fn update_payload(&self, record: &NodeRecord) -> Result<()> {
        let id = record.id().ok_or(EngineError::NotPersisted)?;
        let assignments = record.payload_assignments();
        if assignments.is_empty() {
            return Ok(());
        }
        self.store.update_row(id, &assignments)
    }

    /// The last child of `parent` by sibling order, optionally skipping
    /// one node (the record being moved).
    fn last_child(
        &self,
        parent: &NodeRecord,
        excluding: Option<&NodeRecord>,
    ) -> Result<Option<NodeRecord>> {
        let mut parts = vec![
            Predicate::cmp(&self.schema.left_column, CmpOp::Gt, parent.left()),
            Predicate::cmp(&self.schema.right_column, CmpOp::Lt, parent.right()),
            Predicate::cmp(&self.schema.level_column, CmpOp::Eq, parent.level() + 1),
        ];
        if let Some(excluded) = excluding {
            parts.push(Predicate::cmp(
                &self.schema.left_column,
                CmpOp::Ne,
                excluded.left(),
            ));
        }
        let select = Select {
            predicate: Some(Predicate::All(parts)),
            order: vec![SortKey::desc(&self.schema.left_column)],
            limit: Some(1),
        };
        self.store
            .select(&select)?
            .first()
            .map(|row| self.record_from_row(row))
            .transpose()
    }

    fn capture_next_sibling(&self, record: &NodeRecord) -> Result<Option<CapturedSibling>> {
        let next = TreeQuery::for_record(record)?.siblings().next().one()?;
        Ok(next.and_then(|sibling| {
            sibling.id().map(|id| CapturedSibling {
                id,
                left: sibling.left(),
            })
        }))
    }

    /// Bumps `target` and its later siblings (with their subtrees) one
    /// position up, freeing the target's slot.
    fn open_gap(&self, target: &NodeRecord) -> Result<()> {
        let parent = parent_of(target)?;
        let shifted = self.shift_chain(target.left(), parent.as_ref(), 1)?;
        trace!(from = %required_path(target)?, shifted, "opened gap");
        Ok(())
    }

    /// Pulls the captured sibling's chain one position down, closing the
    /// slot the moved or deleted subtree vacated.
    fn close_gap(&self, gap: &CapturedSibling) -> Result<()> {
        let row = self.store.row(gap.id)?;
        let sibling = self.record_from_row(&row)?;
        let parent = parent_of(&sibling)?;
        let shifted = self.shift_chain(gap.left, parent.as_ref(), -1)?;
        trace!(from = %required_path(&sibling)?, shifted, "closed gap");
        Ok(())
    }

    /// Applies `B(bump)` conjugated by `parent` to every node at or after
    /// `from_left` within the parent's interval (the whole forest tail for
    /// root chains).
    fn shift_chain(&self, from_left: f64, parent: Option<&Matrix>, bump: i64) -> Result<usize> {
        let shift = relocation(parent, parent, bump)?;
        let mut parts = vec![Predicate::cmp(
            &self.schema.left_column,
            CmpOp::Ge,
            from_left,
        )];
        if let Some(parent) = parent {
            parts.push(Predicate::cmp(
                &self.schema.right_column,
                CmpOp::Le,
                codec::right(parent),
            ));
        }
        // Rising values stream right-to-left, falling values left-to-right.
        self.apply_relocation(&shift, Predicate::All(parts), bump > 0)
    }

    /// Relocates the record's subtree (the record and all descendants) by
    /// one move matrix.
    fn move_subtree(&self, record: &NodeRecord, mover: &Matrix) -> Result<usize> {
        let matrix = required_matrix(record)?;
        let descending = codec::left(&mover.multiply(&matrix)) > record.left();
        let predicate = Predicate::All(vec![
            Predicate::cmp(&self.schema.left_column, CmpOp::Ge, record.left()),
            Predicate::cmp(&self.schema.right_column, CmpOp::Le, record.right()),
        ]);
        self.apply_relocation(mover, predicate, descending)
    }

    /// Streams the matching rows in collision-free order and rewrites the
    /// four tree columns of each through the move matrix.
    fn apply_relocation(
        &self,
        mover: &Matrix,
        predicate: Predicate,
        descending: bool,
    ) -> Result<usize> {
        let select = Select {
            predicate: Some(predicate),
            order: vec![SortKey {
                column: self.schema.left_column.clone(),
                descending,
            }],
            limit: None,
        };
        let rows = self.store.select(&select)?;
        for row in &rows {
            let path = row_path(row, &self.schema)?;
            let moved = mover.multiply(&codec::from_path(&path));
            let new_path = codec::to_path(&moved)?;
            let (left, right, level) = codec::columns_for_path(&new_path);
            trace!(id = row.id, from = %path, to = %new_path, "relocating node");
            self.store.update_row(
                row.id,
                &[
                    (
                        self.schema.path_column.clone(),
                        Value::Text(new_path.to_string()),
                    ),
                    (self.schema.left_column.clone(), Value::Real(left)),
                    (self.schema.right_column.clone(), Value::Real(right)),
                    (self.schema.level_column.clone(), Value::Integer(level)),
                ],
            )?;
        }
        Ok(rows.len())
    }
}

fn required_path(record: &NodeRecord) -> Result<NodePath> {
    Ok(record.path().ok_or(RecordError::MissingPath)?.clone())
}

fn required_matrix(record: &NodeRecord) -> Result<Matrix> {
    record
        .node_matrix()
        .ok_or_else(|| RecordError::MissingPath.into())
}

/// The parent matrix of a record's position, `None` at the forest top.
fn parent_of(record: &NodeRecord) -> Result<Option<Matrix>> {
    Ok(codec::parent_matrix(&required_matrix(record)?))
}

fn row_path(row: &Row, schema: &TreeSchema) -> Result<NodePath> {
    let text = row
        .get(&schema.path_column)
        .and_then(Value::as_str)
        .ok_or_else(|| crate::store::StoreError::MissingColumn {
            id: row.id,
            column: schema.path_column.clone(),
        })?;
    text.parse::<NodePath>().map_err(|err: PathError| err.into())
}
