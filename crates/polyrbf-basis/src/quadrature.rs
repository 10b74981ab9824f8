//! Quadrature rules supplied by the caller.

use crate::error::{BasisError, Result};
use nalgebra::{DMatrix, DVector};

/// Points (one per row) and weights over an element's interior.
#[derive(Debug, Clone, PartialEq)]
pub struct Quadrature {
    pub points: DMatrix<f64>,
    pub weights: DVector<f64>,
}

impl Quadrature {
    /// Create a rule, checking that there is one weight per point.
    pub fn new(points: DMatrix<f64>, weights: DVector<f64>) -> Result<Self> {
        if points.nrows() != weights.len() {
            return Err(BasisError::mismatch(
                "quadrature weights",
                points.nrows(),
                weights.len(),
            ));
        }
        Ok(Self { points, weights })
    }

    /// Empty rule of the given dimension (for unconstrained construction)
    pub fn empty(dim: usize) -> Self {
        Self {
            points: DMatrix::zeros(0, dim),
            weights: DVector::zeros(0),
        }
    }

    pub fn dim(&self) -> usize {
        self.points.ncols()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Measure of the element: Σ w_q
    pub fn volume(&self) -> f64 {
        self.weights.sum()
    }

    /// Σ_q f(p_q) w_q
    pub fn integrate<F>(&self, mut f: F) -> f64
    where
        F: FnMut(usize) -> f64,
    {
        (0..self.len()).map(|q| f(q) * self.weights[q]).sum()
    }
}
