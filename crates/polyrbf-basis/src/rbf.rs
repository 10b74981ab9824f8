//! Harmonic RBF bases augmented with quadratic polynomials.
//!
//! For each FEM basis φ_j that is nonzero on the element we solve the
//! least-squares system `A w_j = rhs_j`:
//!
//! ```text
//!     ┏                                     ┓
//!     ┃ ψ_k(pi) ... 1 xi yi xi*yi xi² yi²   ┃
//! A = ┃   ┊        ┊  ┊  ┊   ┊    ┊    ┊    ┃ ∊ ℝ^{#S x (#K+1+d+d(d+1)/2)}
//!     ┗                                     ┛
//! w = ( w_1 … w_#K  a00  a10 a01  a11  a20 a02 )ᵀ
//! ```
//!
//! where the rows run over the collocation points and `rhs_j` holds the
//! target values of φ_j there. With constraints enabled the weights are
//! restricted to the affine space described in [`crate::constraints`].
//!
//! A basis is built once per element; evaluation afterwards is read-only.

use crate::config::SolverConfig;
use crate::constraints::derive_constraints;
use crate::design::{compute_kernels_gradient_matrix, compute_kernels_matrix};
use crate::diagnostics::{DiagnosticSink, LogSink};
use crate::error::{BasisError, Result};
use crate::kernel::Dimension;
use crate::quadrature::Quadrature;
use crate::solver::{solve_constrained, solve_unconstrained, SolveReport};
use nalgebra::{DMatrix, DVector};

/// Evaluation interface of the bases living on one element.
pub trait LocalBasis {
    /// Spatial dimension of the samples
    fn dim(&self) -> usize;

    /// Number of bases (columns of the weights)
    fn num_bases(&self) -> usize;

    /// Values of every basis: one row per sample, one column per basis
    fn bases_values(&self, samples: &DMatrix<f64>) -> Result<DMatrix<f64>>;

    /// Derivative of every basis along `axis`
    fn bases_grads(&self, axis: usize, samples: &DMatrix<f64>) -> Result<DMatrix<f64>>;

    /// Values of basis `local_index` at `samples`
    fn basis(&self, local_index: usize, samples: &DMatrix<f64>) -> Result<DVector<f64>> {
        self.check_index(local_index)?;
        let values = self.bases_values(samples)?;
        Ok(values.column(local_index).into_owned())
    }

    /// Gradient of basis `local_index`: one row per sample, one column per axis
    fn grad(&self, local_index: usize, samples: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        self.check_index(local_index)?;
        let mut val = DMatrix::zeros(samples.nrows(), self.dim());
        for axis in 0..self.dim() {
            let grads = self.bases_grads(axis, samples)?;
            val.set_column(axis, &grads.column(local_index));
        }
        Ok(val)
    }

    fn check_index(&self, local_index: usize) -> Result<()> {
        if local_index >= self.num_bases() {
            return Err(BasisError::BasisIndexOutOfRange {
                index: local_index,
                num_bases: self.num_bases(),
            });
        }
        Ok(())
    }
}

/// Everything needed to build the bases of one element.
#[derive(Debug, Clone, Copy)]
pub struct BasisInput<'a> {
    /// Kernel centers, one per row
    pub centers: &'a DMatrix<f64>,
    /// Points where the bases must match `rhs`
    pub collocation_points: &'a DMatrix<f64>,
    /// Weak-form contributions from outside the element (#bases × 5 or 9)
    pub local_basis_integral: &'a DMatrix<f64>,
    /// Interior quadrature of the element
    pub quadrature: &'a Quadrature,
    /// Target values (#collocation points × #bases)
    pub rhs: &'a DMatrix<f64>,
    /// Enforce quadratic reproduction through the weak-form constraints
    pub with_constraints: bool,
}

/// Bases of one element, spanned by harmonic kernels and quadratics.
#[derive(Debug, Clone, PartialEq)]
pub struct RbfWithQuadratic {
    centers: DMatrix<f64>,
    dimension: Dimension,
    weights: DMatrix<f64>,
    report: SolveReport,
}

impl RbfWithQuadratic {
    /// Build with default solver settings, reporting through `log`.
    pub fn new(input: &BasisInput<'_>) -> Result<Self> {
        Self::with_config(input, &SolverConfig::default(), &LogSink)
    }

    /// Build the bases, solving for the weights once.
    pub fn with_config(
        input: &BasisInput<'_>,
        config: &SolverConfig,
        sink: &dyn DiagnosticSink,
    ) -> Result<Self> {
        let dimension = Dimension::from_len(input.centers.ncols())?;
        let dim = dimension.dim();
        if input.collocation_points.ncols() != dim {
            return Err(BasisError::mismatch(
                "collocation points",
                dim,
                input.collocation_points.ncols(),
            ));
        }
        if !input.quadrature.is_empty() && input.quadrature.dim() != dim {
            return Err(BasisError::mismatch(
                "quadrature points",
                dim,
                input.quadrature.dim(),
            ));
        }
        if input.rhs.nrows() != input.collocation_points.nrows() {
            return Err(BasisError::mismatch(
                "right-hand side rows",
                input.collocation_points.nrows(),
                input.rhs.nrows(),
            ));
        }

        sink.trace(&format!("#kernel centers: {}", input.centers.nrows()));
        sink.trace(&format!(
            "#collocation points: {}",
            input.collocation_points.nrows()
        ));
        sink.trace(&format!("#quadrature points: {}", input.quadrature.len()));
        sink.trace(&format!("#non-vanishing bases: {}", input.rhs.ncols()));

        let a = compute_kernels_matrix(dimension, input.centers, input.collocation_points)?;

        let (weights, report) = if input.with_constraints {
            let reduction = derive_constraints(
                dimension,
                input.centers,
                input.quadrature,
                input.local_basis_integral,
                input.rhs.ncols(),
            )?;
            solve_constrained(&a, input.rhs, &reduction, config, sink)?
        } else {
            solve_unconstrained(&a, input.rhs, config, sink)?
        };

        Ok(Self {
            centers: input.centers.clone(),
            dimension,
            weights,
            report,
        })
    }

    pub fn centers(&self) -> &DMatrix<f64> {
        &self.centers
    }

    pub fn num_kernels(&self) -> usize {
        self.centers.nrows()
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    pub fn is_volume(&self) -> bool {
        self.dimension.is_volume()
    }

    /// (#K+1+d+d(d+1)/2) × #bases
    pub fn weights(&self) -> &DMatrix<f64> {
        &self.weights
    }

    pub fn solve_report(&self) -> &SolveReport {
        &self.report
    }

    /// Kernel and monomial values at `samples`
    pub fn compute_kernels_matrix(&self, samples: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        compute_kernels_matrix(self.dimension, &self.centers, samples)
    }
}

impl LocalBasis for RbfWithQuadratic {
    fn dim(&self) -> usize {
        self.dimension.dim()
    }

    fn num_bases(&self) -> usize {
        self.weights.ncols()
    }

    fn bases_values(&self, samples: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        let a = self.compute_kernels_matrix(samples)?;
        Ok(a * &self.weights)
    }

    fn bases_grads(&self, axis: usize, samples: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        let a_prime =
            compute_kernels_gradient_matrix(self.dimension, &self.centers, axis, samples)?;
        Ok(a_prime * &self.weights)
    }
}
