//! Per-tree column configuration.

use serde::{Deserialize, Serialize};

/// Names of the table and columns a tree lives in.
///
/// Nothing else in the library hard-codes a column name: records, the
/// mutation engine, and the query builder all go through these hooks, so
/// the same code serves tables with any naming convention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeSchema {
    /// The node table.
    pub table: String,
    /// Primary key column.
    pub id_column: String,
    /// Dotted path column (unique-indexed; the source of truth).
    pub path_column: String,
    /// Left boundary column.
    pub left_column: String,
    /// Right boundary column.
    pub right_column: String,
    /// Level column.
    pub level_column: String,
}

impl TreeSchema {
    /// A schema with conventional column names on the given table.
    pub fn new(table: impl Into<String>) -> Self {
        TreeSchema {
            table: table.into(),
            ..TreeSchema::default()
        }
    }

    /// The four tree columns, in `path`, `left`, `right`, `level` order.
    pub fn tree_columns(&self) -> [&str; 4] {
        [
            &self.path_column,
            &self.left_column,
            &self.right_column,
            &self.level_column,
        ]
    }

    /// Whether `column` is one of the four guarded tree columns.
    pub fn is_tree_column(&self, column: &str) -> bool {
        column == self.path_column
            || column == self.left_column
            || column == self.right_column
            || column == self.level_column
    }
}

impl Default for TreeSchema {
    fn default() -> Self {
        TreeSchema {
            table: "nodes".to_string(),
            id_column: "id".to_string(),
            path_column: "path".to_string(),
            left_column: "lft".to_string(),
            right_column: "rgt".to_string(),
            level_column: "level".to_string(),
        }
    }
}
