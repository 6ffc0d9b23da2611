//! Subtree relocation matrices.
//!
//! A move matrix `T` shifts an entire subtree in one pass: for every node
//! `X` of the moving subtree, `T · X.matrix` is `X`'s matrix at the new
//! position. `T` commutes with parent/child structure, so one matrix
//! serves the whole subtree.

use crate::matrix::Matrix;
use crate::path::PathError;

use super::{bump_matrix, root_matrix};

/// Builds the move matrix `T = to · B(bump) · from⁻¹`.
///
/// `from_parent` is the matrix of the subtree's current parent and
/// `to_parent` the destination parent; `None` on either side stands for
/// the forest top (the root matrix). `bump` is the difference between the
/// subtree root's new and old last segments. For a "move inside, become a
/// child of the target" relocation, pass the target's own matrix as
/// `to_parent`.
///
/// The result always has determinant `+1`, so applying it preserves the
/// determinant `-1` of every node matrix it is multiplied onto.
///
/// # Errors
/// Fails with [`PathError::DegenerateMatrix`] if `from_parent` is not
/// invertible in the integers — which no node matrix ever is.
pub fn relocation(
    from_parent: Option<&Matrix>,
    to_parent: Option<&Matrix>,
    bump: i64,
) -> Result<Matrix, PathError> {
    let from = from_parent.copied().unwrap_or_else(root_matrix);
    let to = to_parent.copied().unwrap_or_else(root_matrix);
    let unstep = from.inverse().ok_or(PathError::DegenerateMatrix {
        determinant: from.determinant(),
    })?;
    Ok(to.multiply(&bump_matrix(bump)).multiply(&unstep))
}
