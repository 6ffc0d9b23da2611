//! 2×2 integer matrices, the algebraic backbone of the tree encoding.
//!
//! Every node of the forest is keyed by a matrix with determinant `-1`
//! (see [`crate::codec`]). Keeping determinants in `{+1, -1}` means every
//! inverse the library ever needs stays in exact integer arithmetic.

use serde::{Deserialize, Serialize};

/// An immutable 2×2 matrix over `i64`.
///
/// Laid out as
///
/// ```text
/// | a  b |
/// | c  d |
/// ```
///
/// Every operation returns a fresh value; there are no in-place mutators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Matrix {
    pub a: i64,
    pub b: i64,
    pub c: i64,
    pub d: i64,
}

impl Matrix {
    /// The multiplicative identity.
    pub const IDENTITY: Matrix = Matrix {
        a: 1,
        b: 0,
        c: 0,
        d: 1,
    };

    /// Creates a matrix from its four components in row-major order.
    pub const fn new(a: i64, b: i64, c: i64, d: i64) -> Self {
        Matrix { a, b, c, d }
    }

    /// Standard (non-commutative) matrix product `self · other`.
    pub fn multiply(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
        }
    }

    /// Component-wise scalar product.
    pub fn scale(&self, k: i64) -> Matrix {
        Matrix {
            a: self.a * k,
            b: self.b * k,
            c: self.c * k,
            d: self.d * k,
        }
    }

    /// The determinant `a·d − b·c`.
    pub fn determinant(&self) -> i64 {
        self.a * self.d - self.b * self.c
    }

    /// The adjugate `(d, −b, −c, a)`.
    pub fn adjugate(&self) -> Matrix {
        Matrix {
            a: self.d,
            b: -self.b,
            c: -self.c,
            d: self.a,
        }
    }

    /// Whether the determinant is `+1` or `-1`.
    ///
    /// Node matrices always are; the encoding guarantees it.
    pub fn is_unimodular(&self) -> bool {
        matches!(self.determinant(), 1 | -1)
    }

    /// Exact integer inverse.
    ///
    /// Defined only when the determinant is `+1` or `-1`, which holds for
    /// every matrix the encoding produces. Returns `None` otherwise; callers
    /// that genuinely need to invert a non-unimodular matrix should use
    /// [`Matrix::inverse_lossy`].
    pub fn inverse(&self) -> Option<Matrix> {
        let det = self.determinant();
        if det != 1 && det != -1 {
            return None;
        }
        let adj = self.adjugate();
        Some(Matrix {
            a: adj.a / det,
            b: adj.b / det,
            c: adj.c / det,
            d: adj.d / det,
        })
    }

    /// Floating-point inverse for non-unimodular matrices.
    ///
    /// Diagnostic fallback only; the core algebra never reaches this.
    /// Returns `None` for singular matrices.
    pub fn inverse_lossy(&self) -> Option<[f64; 4]> {
        let det = self.determinant();
        if det == 0 {
            return None;
        }
        let adj = self.adjugate();
        let inv = 1.0 / det as f64;
        Some([
            adj.a as f64 * inv,
            adj.b as f64 * inv,
            adj.c as f64 * inv,
            adj.d as f64 * inv,
        ])
    }

    /// The transpose `(a, c, b, d)`.
    pub fn transpose(&self) -> Matrix {
        Matrix {
            a: self.a,
            b: self.c,
            c: self.b,
            d: self.d,
        }
    }
}

impl std::ops::Mul for Matrix {
    type Output = Matrix;

    fn mul(self, rhs: Matrix) -> Matrix {
        self.multiply(&rhs)
    }
}

impl std::fmt::Display for Matrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{} {}; {} {}]", self.a, self.b, self.c, self.d)
    }
}
