//! Relative navigation queries.
//!
//! [`TreeQuery`] composes a scope (`roots`, `children`, `parent`,
//! `siblings`, `excluding…`), an optional direction (`next`, `previous`),
//! and expansion modifiers (`include_self`, `include_descendants`,
//! `include_ancestors`) into a single [`Select`] over the `left`, `right`
//! and `level` columns.
//!
//! The builder is a value type: every token consumes and returns it, only
//! flags accumulate, and [`TreeQuery::prepare`] is a pure function of the
//! final flag set plus the bound reference node. Tokens are idempotent and
//! — apart from the documented interactions — order-independent: any
//! interleaving that ends in the same flags compiles to the same query.

pub mod errors;

use std::sync::Arc;

use crate::matrix::Matrix;
use crate::path::NodePath;
use crate::record::NodeRecord;
use crate::schema::TreeSchema;
use crate::store::{CmpOp, Predicate, Select, SortKey, Store};
use crate::{Result, codec};

pub use errors::QueryError;

/// The navigation scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Scope {
    #[default]
    None,
    Roots,
    Children,
    Parent,
    Siblings,
    Excluding,
}

impl Scope {
    fn name(self) -> &'static str {
        match self {
            Scope::None => "none",
            Scope::Roots => "roots",
            Scope::Children => "children",
            Scope::Parent => "parent",
            Scope::Siblings => "siblings",
            Scope::Excluding => "excluding",
        }
    }
}

/// The sibling direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Direction {
    #[default]
    None,
    Next,
    Previous,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct Flags {
    scope: Scope,
    direction: Direction,
    include_self: bool,
    include_descendants: bool,
    include_ancestors: bool,
    exclude_self: bool,
    exclude_descendants: bool,
    reverse: bool,
}

/// Snapshot of the reference node's position taken when the builder is
/// created; the builder never re-reads the record.
#[derive(Debug, Clone)]
struct Reference {
    path: NodePath,
    matrix: Matrix,
    left: f64,
    right: f64,
    level: i64,
}

/// A composable navigation query.
///
/// Builders are single-use values: obtain a fresh one per query via
/// [`NodeRecord::relative_query`] or [`TreeQuery::unbound`].
#[derive(Clone)]
pub struct TreeQuery {
    store: Arc<dyn Store>,
    schema: Arc<TreeSchema>,
    node: Option<Reference>,
    flags: Flags,
}

impl TreeQuery {
    /// A builder with no reference node. Only node-free scopes
    /// (`roots`, or no scope at all) can be prepared from it.
    pub fn unbound(store: Arc<dyn Store>, schema: Arc<TreeSchema>) -> Self {
        TreeQuery {
            store,
            schema,
            node: None,
            flags: Flags::default(),
        }
    }

    /// A builder bound to a persisted record.
    ///
    /// # Errors
    /// Fails with [`RecordError::MissingPath`](crate::record::RecordError)
    /// when the record has no path yet.
    pub fn for_record(record: &NodeRecord) -> Result<Self> {
        let path = record
            .path()
            .ok_or(crate::record::RecordError::MissingPath)?
            .clone();
        let matrix = record
            .node_matrix()
            .ok_or(crate::record::RecordError::MissingPath)?;
        Ok(TreeQuery {
            store: Arc::clone(record.store()),
            schema: Arc::clone(record.schema()),
            node: Some(Reference {
                path,
                matrix,
                left: record.left(),
                right: record.right(),
                level: record.level(),
            }),
            flags: Flags::default(),
        })
    }

    // Scope tokens.

    /// Scope to the forest roots (`level = 1`).
    pub fn roots(mut self) -> Self {
        self.flags.scope = Scope::Roots;
        self
    }

    /// Scope to the reference node's children.
    pub fn children(mut self) -> Self {
        self.flags.scope = Scope::Children;
        self
    }

    /// Scope to the reference node's parent.
    pub fn parent(mut self) -> Self {
        self.flags.scope = Scope::Parent;
        self
    }

    /// Scope to the reference node's siblings.
    pub fn siblings(mut self) -> Self {
        self.flags.scope = Scope::Siblings;
        self
    }

    /// Scope to everything outside the reference node itself.
    pub fn excluding_self(mut self) -> Self {
        self.flags.scope = Scope::Excluding;
        self.flags.exclude_self = true;
        self
    }

    /// Scope to everything outside the reference node's descendants.
    pub fn excluding_descendants(mut self) -> Self {
        self.flags.scope = Scope::Excluding;
        self.flags.exclude_descendants = true;
        self
    }

    // Direction tokens.

    /// Restrict siblings to those at or after the reference node.
    pub fn next(mut self) -> Self {
        self.flags.direction = Direction::Next;
        self
    }

    /// Restrict siblings to those at or before the reference node, nearest
    /// first.
    pub fn previous(mut self) -> Self {
        self.flags.direction = Direction::Previous;
        self
    }

    // Expansion modifiers.

    /// Widen the scope's interval to admit the reference node itself.
    pub fn include_self(mut self) -> Self {
        self.flags.include_self = true;
        self
    }

    /// Drop the level clause so whole subtrees qualify.
    pub fn include_descendants(mut self) -> Self {
        self.flags.include_descendants = true;
        self
    }

    /// Drop the level clause of a `parent` scope so all ancestors qualify.
    pub fn include_ancestors(mut self) -> Self {
        self.flags.include_ancestors = true;
        self
    }

    // Order tokens.

    /// Invert whichever default order applies.
    pub fn reverse(mut self) -> Self {
        self.flags.reverse = true;
        self
    }

    /// Restore the direction-native order.
    pub fn natural(mut self) -> Self {
        self.flags.reverse = false;
        self
    }

    fn require_node(&self) -> Result<&Reference> {
        self.node.as_ref().ok_or_else(|| {
            QueryError::UnboundReference {
                scope: self.flags.scope.name(),
            }
            .into()
        })
    }

    /// Compiles the accumulated flags into a [`Select`].
    ///
    /// Pure: the same flags and reference node always yield the same query.
    pub fn prepare(&self) -> Result<Select> {
        let lft = self.schema.left_column.as_str();
        let rgt = self.schema.right_column.as_str();
        let lvl = self.schema.level_column.as_str();
        let flags = self.flags;

        let mut parts: Vec<Predicate> = Vec::new();
        match flags.scope {
            Scope::None => {}
            Scope::Roots => parts.push(Predicate::cmp(lvl, CmpOp::Eq, 1i64)),
            Scope::Children => {
                let node = self.require_node()?;
                let (left_op, right_op) = if flags.include_self {
                    (CmpOp::Ge, CmpOp::Le)
                } else {
                    (CmpOp::Gt, CmpOp::Lt)
                };
                parts.push(Predicate::cmp(lft, left_op, node.left));
                parts.push(Predicate::cmp(rgt, right_op, node.right));
                if !flags.include_descendants {
                    parts.push(Predicate::cmp(lvl, CmpOp::Eq, node.level + 1));
                }
            }
            Scope::Parent => {
                let node = self.require_node()?;
                let (left_op, right_op) = if flags.include_self {
                    (CmpOp::Le, CmpOp::Ge)
                } else {
                    (CmpOp::Lt, CmpOp::Gt)
                };
                parts.push(Predicate::cmp(lft, left_op, node.left));
                parts.push(Predicate::cmp(rgt, right_op, node.right));
                if !flags.include_ancestors {
                    parts.push(Predicate::cmp(lvl, CmpOp::Eq, node.level - 1));
                }
            }
            Scope::Siblings => {
                let node = self.require_node()?;
                // Root siblings have no enclosing interval.
                if let Some(parent) = codec::parent_matrix(&node.matrix) {
                    parts.push(Predicate::cmp(lft, CmpOp::Gt, codec::left(&parent)));
                    parts.push(Predicate::cmp(rgt, CmpOp::Lt, codec::right(&parent)));
                }
                if !flags.include_descendants {
                    parts.push(Predicate::cmp(lvl, CmpOp::Eq, node.level));
                }
                match flags.direction {
                    Direction::Next => {
                        let bound = if flags.include_self {
                            node.left
                        } else {
                            node.right
                        };
                        parts.push(Predicate::cmp(lft, CmpOp::Ge, bound));
                    }
                    Direction::Previous => {
                        let bound = if flags.include_self {
                            node.right
                        } else {
                            node.left
                        };
                        parts.push(Predicate::cmp(rgt, CmpOp::Le, bound));
                    }
                    Direction::None => {
                        if !flags.include_self {
                            parts.push(Predicate::cmp(lft, CmpOp::Ne, node.left));
                        }
                    }
                }
            }
            Scope::Excluding => {
                let node = self.require_node()?;
                // A bare `excluding` shuts out the node and its subtree.
                let (no_self, no_descendants) =
                    match (flags.exclude_self, flags.exclude_descendants) {
                        (false, false) => (true, true),
                        chosen => chosen,
                    };
                let predicate = match (no_self, no_descendants) {
                    (true, true) => Predicate::Not(Box::new(Predicate::All(vec![
                        Predicate::cmp(lft, CmpOp::Ge, node.left),
                        Predicate::cmp(rgt, CmpOp::Le, node.right),
                    ]))),
                    (true, false) => Predicate::cmp(lft, CmpOp::Ne, node.left),
                    (false, true) => Predicate::Not(Box::new(Predicate::All(vec![
                        Predicate::cmp(lft, CmpOp::Gt, node.left),
                        Predicate::cmp(rgt, CmpOp::Lt, node.right),
                    ]))),
                    (false, false) => unreachable!("bare excluding maps to both"),
                };
                parts.push(predicate);
            }
        }

        let predicate = match parts.len() {
            0 => None,
            1 => parts.pop(),
            _ => Some(Predicate::All(parts)),
        };
        let mut descending = flags.direction == Direction::Previous;
        if flags.reverse {
            descending = !descending;
        }
        Ok(Select {
            predicate,
            order: vec![SortKey {
                column: lft.to_string(),
                descending,
            }],
            limit: None,
        })
    }

    /// Executes the query and returns the nearest matching record, if any.
    pub fn one(&self) -> Result<Option<NodeRecord>> {
        let mut select = self.prepare()?;
        select.limit = Some(1);
        let rows = self.store.select(&select)?;
        rows.first()
            .map(|row| NodeRecord::from_row(Arc::clone(&self.store), Arc::clone(&self.schema), row))
            .transpose()
    }

    /// Executes the query and returns every matching record in order.
    pub fn all(&self) -> Result<Vec<NodeRecord>> {
        let select = self.prepare()?;
        self.store
            .select(&select)?
            .iter()
            .map(|row| NodeRecord::from_row(Arc::clone(&self.store), Arc::clone(&self.schema), row))
            .collect()
    }

    /// Executes the query and returns the number of matching rows.
    pub fn count(&self) -> Result<usize> {
        let select = self.prepare()?;
        Ok(self.store.select(&select)?.len())
    }

    /// The reference node's path, when bound.
    pub fn reference_path(&self) -> Option<&NodePath> {
        self.node.as_ref().map(|n| &n.path)
    }
}
