//! Error types for polyrbf-basis

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BasisError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BasisError {
    #[error("Unsupported spatial dimension: {0} (expected 2 or 3)")]
    UnsupportedDimension(usize),

    #[error("Dimension mismatch in {context}: expected {expected}, found {found}")]
    DimensionMismatch {
        context: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Singular {dim}D constraint matrix (degenerate element)")]
    SingularConstraintMatrix { dim: usize },

    #[error("Least-squares solve failed: {0}")]
    LeastSquares(String),

    #[error("Basis index {index} out of range ({num_bases} bases)")]
    BasisIndexOutOfRange { index: usize, num_bases: usize },

    #[error("Constraints requested with an empty quadrature rule")]
    EmptyQuadrature,
}

impl BasisError {
    pub(crate) fn mismatch(context: &'static str, expected: usize, found: usize) -> Self {
        BasisError::DimensionMismatch {
            context,
            expected,
            found,
        }
    }
}
