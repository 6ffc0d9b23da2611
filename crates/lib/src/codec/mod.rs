//! The path↔matrix codec.
//!
//! Dan Hazel's rational-numbers keying of nested sets associates every
//! dotted path with a 2×2 integer matrix. Descending into child `n`
//! multiplies by the segment matrix `S(n) = (1, 1, n, n+1)`; the whole
//! forest hangs off the root matrix `M₀ = (0, 1, 1, 0)` (a swap, not the
//! identity). A node's interval boundaries fall out of its matrix in O(1):
//! `left = a/c`, `right = b/d`. Every reachable matrix has determinant
//! `-1`, so inverses — and with them subtree relocations — stay in exact
//! integer arithmetic.
//!
//! This module is pure: nothing here touches the store. It doubles as the
//! public migration primitive — [`columns_for_path`] computes the three
//! derived columns for any pre-existing dotted path.

pub mod relocation;

use crate::matrix::Matrix;
use crate::path::{NodePath, PathError};

pub use relocation::relocation;

/// The root matrix `M₀ = (0, 1, 1, 0)`, the algebraic origin of the forest.
pub fn root_matrix() -> Matrix {
    Matrix::new(0, 1, 1, 0)
}

/// The segment matrix `S(n) = (1, 1, n, n+1)`.
///
/// Left-multiplying a node matrix by `S(n)` descends into its `n`-th child.
///
/// # Errors
/// Fails with [`PathError::InvalidSegment`] when `segment < 1`; segment 0
/// does not exist in the encoding.
pub fn segment_matrix(segment: i64) -> Result<Matrix, PathError> {
    if segment < 1 {
        return Err(PathError::InvalidSegment { segment });
    }
    Ok(Matrix::new(1, 1, segment, segment + 1))
}

/// The bump matrix `B(k) = (1, 0, k, 1)`, shifting a last segment by `k`.
///
/// `k` may be positive, zero, or negative; `B(k) · S(n) = S(n + k)`.
pub fn bump_matrix(amount: i64) -> Matrix {
    Matrix::new(1, 0, amount, 1)
}

/// The canonical matrix of a path: `M₀ · S(s₁) · … · S(sₖ)`.
pub fn from_path(path: &NodePath) -> Matrix {
    let mut matrix = root_matrix();
    for &segment in path.segments() {
        // Segments are validated >= 1 at path construction.
        matrix = matrix.multiply(&Matrix::new(1, 1, segment, segment + 1));
    }
    debug_assert_eq!(matrix.determinant(), -1, "node matrix for {path}");
    matrix
}

/// The last path segment encoded in a matrix: `⌊a / (b − a)⌋`.
pub fn last_segment(matrix: &Matrix) -> i64 {
    matrix.a.div_euclid(matrix.b - matrix.a)
}

/// The matrix of the node's parent, or `None` for roots.
///
/// Peeling the last segment off a root yields the degenerate `M₀`
/// (`a = 0`); that and any other non-positive component signal "no parent"
/// rather than an error, so callers can treat roots uniformly.
pub fn parent_matrix(matrix: &Matrix) -> Option<Matrix> {
    if matrix.b - matrix.a < 1 {
        return None;
    }
    let segment = last_segment(matrix);
    if segment < 1 {
        return None;
    }
    // S(segment) has determinant +1, so the inverse is always exact.
    let unstep = Matrix::new(segment + 1, -1, -segment, 1);
    let parent = matrix.multiply(&unstep);
    if parent.a < 1 || parent.c < 1 || parent.d < 1 {
        return None;
    }
    Some(parent)
}

/// Recovers the dotted path encoded in a node matrix.
///
/// Inverse of [`from_path`]: repeatedly takes [`last_segment`] and steps to
/// [`parent_matrix`] until the root is reached.
///
/// # Errors
/// Fails with [`PathError::DegenerateMatrix`] when the matrix is not a
/// node matrix of the encoding.
pub fn to_path(matrix: &Matrix) -> Result<NodePath, PathError> {
    let determinant = matrix.determinant();
    if determinant != -1 {
        return Err(PathError::DegenerateMatrix { determinant });
    }
    let mut reversed = Vec::new();
    let mut current = *matrix;
    loop {
        if current.b - current.a < 1 {
            return Err(PathError::DegenerateMatrix { determinant });
        }
        let segment = last_segment(&current);
        if segment < 1 {
            return Err(PathError::DegenerateMatrix { determinant });
        }
        reversed.push(segment);
        match parent_matrix(&current) {
            Some(parent) => current = parent,
            None => break,
        }
    }
    reversed.reverse();
    NodePath::from_segments(reversed)
}

/// The left boundary `a/c`.
pub fn left(matrix: &Matrix) -> f64 {
    matrix.a as f64 / matrix.c as f64
}

/// The right boundary `b/d`.
pub fn right(matrix: &Matrix) -> f64 {
    matrix.b as f64 / matrix.d as f64
}

/// The level encoded in a matrix (the length of its path).
pub fn matrix_level(matrix: &Matrix) -> Result<i64, PathError> {
    Ok(to_path(matrix)?.level())
}

/// The `(left, right, level)` column triple for a path.
///
/// This is the migration primitive: adopting the library on existing data
/// means populating the path column, then deriving the other three columns
/// per row through this function.
pub fn columns_for_path(path: &NodePath) -> (f64, f64, i64) {
    let matrix = from_path(path);
    (left(&matrix), right(&matrix), path.level())
}

/// Enumerates the ancestor matrices of the node whose left boundary is
/// `numerator / denominator`, without touching the database.
///
/// The right column of the node matrix is reconstructed by solving
/// `a·d − b·c = −1` with the extended Euclidean algorithm; the segment
/// sequence then falls out of a Euclidean recurrence on `(a, b)`. Order is
/// root to direct parent; the node itself is not included, so the result
/// is empty for roots.
///
/// # Errors
/// Fails with [`PathError::InvalidBoundary`] when the pair does not
/// identify a node of the encoding.
pub fn ancestor_matrices(numerator: i64, denominator: i64) -> Result<Vec<Matrix>, PathError> {
    let invalid = PathError::InvalidBoundary {
        numerator,
        denominator,
    };
    if numerator < 1 || denominator < 1 {
        return Err(invalid);
    }
    // b - a is the parent's b entry, always in [1, a]; the congruence
    // b ≡ c⁻¹ (mod a) then pins b uniquely.
    let inverse = mod_inverse(denominator, numerator).ok_or_else(|| invalid.clone())?;
    let offset = if inverse == 0 { numerator } else { inverse };
    let b = numerator + offset;
    if (b * denominator - 1) % numerator != 0 {
        return Err(invalid);
    }

    let mut reversed = Vec::new();
    let mut x = numerator;
    let mut y = b;
    while x > 0 {
        let step = y - x;
        if step < 1 {
            return Err(invalid);
        }
        let segment = x / step;
        if segment < 1 {
            return Err(invalid);
        }
        reversed.push(segment);
        x -= segment * step;
        y = step;
    }
    reversed.reverse();

    let path = NodePath::from_segments(reversed).map_err(|_| invalid.clone())?;
    let matrix = from_path(&path);
    if matrix.a != numerator || matrix.c != denominator {
        return Err(invalid);
    }
    Ok(path.ancestors().iter().map(from_path).collect())
}

/// The strict dotted prefixes of a path, root first.
pub fn ancestor_paths(path: &NodePath) -> Vec<NodePath> {
    path.ancestors()
}

/// Whether `ancestor` strictly prefixes `descendant`.
pub fn is_ancestor_of(ancestor: &NodePath, descendant: &NodePath) -> bool {
    ancestor.is_ancestor_of(descendant)
}

/// The path with its last segment dropped, or `None` for roots.
pub fn base_path(path: &NodePath) -> Option<NodePath> {
    path.parent()
}

/// Extended Euclid: returns `(g, x, y)` with `a·x + b·y = g = gcd(a, b)`.
fn extended_gcd(a: i64, b: i64) -> (i64, i64, i64) {
    if b == 0 {
        return (a, 1, 0);
    }
    let (g, x, y) = extended_gcd(b, a.rem_euclid(b));
    (g, y, x - (a / b) * y)
}

/// The inverse of `value` modulo `modulus`, in `[0, modulus)`.
///
/// `None` when `value` and `modulus` are not coprime.
fn mod_inverse(value: i64, modulus: i64) -> Option<i64> {
    let (g, x, _) = extended_gcd(value.rem_euclid(modulus), modulus);
    if g != 1 {
        return None;
    }
    Some(x.rem_euclid(modulus))
}
