//! Design matrices: kernels and quadratic monomials sampled at points.
//!
//! Column layout for `#K` kernel centers in dimension `d`:
//!
//! ```text
//! ┃ ψ_1 … ψ_#K ┃ 1 ┃ x y [z] ┃ xy  |  xy yz zx ┃ x² y² [z²] ┃
//!   kernels      cst  linear    mixed (2D | 3D)   quadratic
//! ```
//!
//! Multiplying either matrix by the weights matrix yields the values (or
//! the gradient along one axis) of every basis at once.

use crate::error::{BasisError, Result};
use crate::kernel::Dimension;
use nalgebra::DMatrix;

/// Column indices of the kernel/polynomial terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    pub num_kernels: usize,
    pub dimension: Dimension,
}

impl ColumnLayout {
    pub fn new(num_kernels: usize, dimension: Dimension) -> Self {
        Self {
            num_kernels,
            dimension,
        }
    }

    /// Total number of columns (= rows of the weights matrix)
    pub fn len(&self) -> usize {
        self.dimension.num_unknowns(self.num_kernels)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn constant(&self) -> usize {
        self.num_kernels
    }

    pub fn linear(&self, axis: usize) -> usize {
        self.num_kernels + 1 + axis
    }

    pub fn mixed(&self, index: usize) -> usize {
        self.num_kernels + 1 + self.dimension.dim() + index
    }

    pub fn quadratic(&self, axis: usize) -> usize {
        self.num_kernels + 1 + self.dimension.dim() + self.dimension.num_mixed_terms() + axis
    }

    /// First polynomial row after the constant (start of the constrained block)
    pub fn first_constrained(&self) -> usize {
        self.num_kernels + 1
    }
}

fn check_samples(dimension: Dimension, samples: &DMatrix<f64>) -> Result<()> {
    if samples.ncols() != dimension.dim() {
        return Err(BasisError::mismatch(
            "sample coordinates",
            dimension.dim(),
            samples.ncols(),
        ));
    }
    Ok(())
}

fn distance(samples: &DMatrix<f64>, i: usize, centers: &DMatrix<f64>, k: usize) -> f64 {
    let mut r2 = 0.0;
    for d in 0..samples.ncols() {
        let delta = samples[(i, d)] - centers[(k, d)];
        r2 += delta * delta;
    }
    r2.sqrt()
}

/// Kernel and monomial values at `samples` (one row per sample).
pub fn compute_kernels_matrix(
    dimension: Dimension,
    centers: &DMatrix<f64>,
    samples: &DMatrix<f64>,
) -> Result<DMatrix<f64>> {
    check_samples(dimension, samples)?;
    let layout = ColumnLayout::new(centers.nrows(), dimension);
    let dim = dimension.dim();

    let mut a = DMatrix::zeros(samples.nrows(), layout.len());
    for i in 0..samples.nrows() {
        for k in 0..layout.num_kernels {
            a[(i, k)] = dimension.kernel(distance(samples, i, centers, k));
        }

        a[(i, layout.constant())] = 1.0;
        for d in 0..dim {
            a[(i, layout.linear(d))] = samples[(i, d)];
        }

        match dimension {
            Dimension::Planar => {
                a[(i, layout.mixed(0))] = samples[(i, 0)] * samples[(i, 1)];
            }
            Dimension::Volume => {
                // xy, yz, zx
                for d in 0..3 {
                    a[(i, layout.mixed(d))] = samples[(i, d)] * samples[(i, (d + 1) % 3)];
                }
            }
        }

        for d in 0..dim {
            a[(i, layout.quadratic(d))] = samples[(i, d)] * samples[(i, d)];
        }
    }

    Ok(a)
}

/// Derivative of every column of [`compute_kernels_matrix`] along `axis`.
///
/// Kernel columns: ∂ψ_k/∂x_axis = (x_axis - c_axis) · h'(r)/r, zero when the
/// sample coincides with the center.
pub fn compute_kernels_gradient_matrix(
    dimension: Dimension,
    centers: &DMatrix<f64>,
    axis: usize,
    samples: &DMatrix<f64>,
) -> Result<DMatrix<f64>> {
    check_samples(dimension, samples)?;
    let dim = dimension.dim();
    if axis >= dim {
        return Err(BasisError::mismatch("gradient axis", dim, axis));
    }
    let layout = ColumnLayout::new(centers.nrows(), dimension);

    let mut a_prime = DMatrix::zeros(samples.nrows(), layout.len());
    for i in 0..samples.nrows() {
        for k in 0..layout.num_kernels {
            let r = distance(samples, i, centers, k);
            a_prime[(i, k)] =
                (samples[(i, axis)] - centers[(k, axis)]) * dimension.kernel_gradient_factor(r);
        }

        // Constant column stays zero
        a_prime[(i, layout.linear(axis))] = 1.0;

        match dimension {
            Dimension::Planar => {
                a_prime[(i, layout.mixed(0))] = samples[(i, 1 - axis)];
            }
            Dimension::Volume => {
                // ∂(x_a x_{a+1})/∂x_a = x_{a+1}, ∂(x_{a+2} x_a)/∂x_a = x_{a+2}
                a_prime[(i, layout.mixed(axis))] = samples[(i, (axis + 1) % 3)];
                a_prime[(i, layout.mixed((axis + 2) % 3))] = samples[(i, (axis + 2) % 3)];
            }
        }

        a_prime[(i, layout.quadratic(axis))] = 2.0 * samples[(i, axis)];
    }

    Ok(a_prime)
}
