//! Harmonic kernels (fundamental solutions of the Laplacian).
//!
//! - 2D: h(r) = ln r,  h'(r) = 1/r
//! - 3D: h(r) = 1/r,   h'(r) = -1/r²
//!
//! Both vanish for r < [`KERNEL_CUTOFF`] so that a sample sitting on a
//! kernel center never produces NaN or Inf.

use crate::error::{BasisError, Result};
use serde::{Deserialize, Serialize};

/// Distance below which a sample is treated as coincident with a center.
pub const KERNEL_CUTOFF: f64 = 1e-8;

/// Spatial dimension of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dimension {
    /// Polygonal (2D) element
    Planar,
    /// Polyhedral (3D) element
    Volume,
}

impl Dimension {
    /// Dimension from a coordinate count.
    pub fn from_len(dim: usize) -> Result<Self> {
        match dim {
            2 => Ok(Dimension::Planar),
            3 => Ok(Dimension::Volume),
            other => Err(BasisError::UnsupportedDimension(other)),
        }
    }

    pub fn is_volume(self) -> bool {
        matches!(self, Dimension::Volume)
    }

    /// Number of coordinates
    pub fn dim(self) -> usize {
        match self {
            Dimension::Planar => 2,
            Dimension::Volume => 3,
        }
    }

    /// Number of mixed monomials (xy in 2D; xy, yz, zx in 3D)
    pub fn num_mixed_terms(self) -> usize {
        match self {
            Dimension::Planar => 1,
            Dimension::Volume => 3,
        }
    }

    /// Number of polynomial terms besides the constant: d linear + d(d+1)/2 quadratic.
    ///
    /// This is also the number of weak-form constraints (5 in 2D, 9 in 3D).
    pub fn num_constraints(self) -> usize {
        let d = self.dim();
        d + d * (d + 1) / 2
    }

    /// Number of unknowns per basis for `num_kernels` centers.
    pub fn num_unknowns(self, num_kernels: usize) -> usize {
        num_kernels + 1 + self.num_constraints()
    }

    pub fn kernel(self, r: f64) -> f64 {
        kernel(self.is_volume(), r)
    }

    pub fn kernel_prime(self, r: f64) -> f64 {
        kernel_prime(self.is_volume(), r)
    }

    /// h'(r)/r, the factor multiplying (x - c) in the kernel gradient.
    pub fn kernel_gradient_factor(self, r: f64) -> f64 {
        if r < KERNEL_CUTOFF {
            return 0.0;
        }
        self.kernel_prime(r) / r
    }
}

/// Harmonic kernel h(r).
pub fn kernel(is_volume: bool, r: f64) -> f64 {
    if r < KERNEL_CUTOFF {
        return 0.0;
    }

    if is_volume { 1.0 / r } else { r.ln() }
}

/// Radial derivative h'(r).
pub fn kernel_prime(is_volume: bool, r: f64) -> f64 {
    if r < KERNEL_CUTOFF {
        return 0.0;
    }

    if is_volume { -1.0 / (r * r) } else { 1.0 / r }
}
