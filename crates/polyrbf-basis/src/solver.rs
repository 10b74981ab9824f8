//! Least-squares solves for the basis weights.
//!
//! Unconstrained:  (AᵀA) w = Aᵀ rhs
//! Constrained:    w = L v + t with (LᵀAᵀA L) v = LᵀAᵀ (rhs - A t)
//!
//! The normal equations are equilibrated (D AᵀA D with D = diag(AᵀA)^{-1/2})
//! and factored with Cholesky, so the singularity test sees the shape of the
//! columns rather than the size of the element. A failed or
//! near-singular factorization is a soft failure: it is reported through
//! the diagnostic sink and in the [`SolveReport`], and the weights are
//! still produced (through an SVD of the design matrix when
//! [`SolverConfig::svd_fallback`] is set).

use crate::config::SolverConfig;
use crate::constraints::ConstraintReduction;
use crate::diagnostics::DiagnosticSink;
use crate::error::{BasisError, Result};
use nalgebra::{Cholesky, DMatrix, DVector, Dyn};
use serde::{Deserialize, Serialize};

/// Factorization that produced the weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveMethod {
    /// Cholesky on the normal equations
    Cholesky,
    /// SVD least squares on the design matrix
    Svd,
    /// LU on the normal equations (Cholesky failed, no SVD fallback)
    Lu,
}

/// Outcome of one weights solve.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveReport {
    pub method: SolveMethod,
    /// Size of the solved system (#K+1 when constrained)
    pub unknowns: usize,
    /// The normal equations were singular or nearly so
    pub numerical_issue: bool,
    /// Mean over bases of max |A w - rhs| at the collocation points
    pub mean_max_residual: f64,
}

/// Solve without constraints.
pub fn solve_unconstrained(
    a: &DMatrix<f64>,
    rhs: &DMatrix<f64>,
    config: &SolverConfig,
    sink: &dyn DiagnosticSink,
) -> Result<(DMatrix<f64>, SolveReport)> {
    check_rhs(a, rhs)?;
    sink.trace(&format!(
        "-- Solving system of size {}x{}",
        a.ncols(),
        a.ncols()
    ));

    let (weights, method, numerical_issue) = least_squares(a, rhs, config, sink)?;
    sink.trace("-- Solved!");

    let report = SolveReport {
        method,
        unknowns: a.ncols(),
        numerical_issue,
        mean_max_residual: mean_max_residual(a, &weights, rhs),
    };
    sink.trace(&format!("-- Mean residual: {}", report.mean_max_residual));
    Ok((weights, report))
}

/// Solve in the constraint null space: `w = L v + t`.
pub fn solve_constrained(
    a: &DMatrix<f64>,
    rhs: &DMatrix<f64>,
    reduction: &ConstraintReduction,
    config: &SolverConfig,
    sink: &dyn DiagnosticSink,
) -> Result<(DMatrix<f64>, SolveReport)> {
    check_rhs(a, rhs)?;
    if reduction.l.nrows() != a.ncols() {
        return Err(BasisError::mismatch(
            "constraint reduction rows",
            a.ncols(),
            reduction.l.nrows(),
        ));
    }
    if reduction.t.ncols() != rhs.ncols() {
        return Err(BasisError::mismatch(
            "constraint translation columns",
            rhs.ncols(),
            reduction.t.ncols(),
        ));
    }

    // b = rhs - A t
    let b = rhs - a * &reduction.t;
    let al = a * &reduction.l;

    sink.trace(&format!(
        "-- Solving system of size {}x{}",
        al.ncols(),
        al.ncols()
    ));
    let (v, method, numerical_issue) = least_squares(&al, &b, config, sink)?;
    sink.trace("-- Solved!");

    let weights = &reduction.l * v + &reduction.t;
    let report = SolveReport {
        method,
        unknowns: al.ncols(),
        numerical_issue,
        mean_max_residual: mean_max_residual(a, &weights, rhs),
    };
    sink.trace(&format!("-- Mean residual: {}", report.mean_max_residual));
    Ok((weights, report))
}

fn check_rhs(a: &DMatrix<f64>, rhs: &DMatrix<f64>) -> Result<()> {
    if rhs.nrows() != a.nrows() {
        return Err(BasisError::mismatch(
            "right-hand side rows",
            a.nrows(),
            rhs.nrows(),
        ));
    }
    if a.nrows() == 0 {
        return Err(BasisError::LeastSquares(
            "no collocation points".to_string(),
        ));
    }
    Ok(())
}

/// min(L_ii²) / max(L_ii²) below `tolerance`
fn has_degenerate_pivots(chol: &Cholesky<f64, Dyn>, tolerance: f64) -> bool {
    let l = chol.l_dirty();
    let pivots: Vec<f64> = (0..l.nrows()).map(|i| l[(i, i)] * l[(i, i)]).collect();
    if pivots.iter().any(|p| !p.is_finite()) {
        return true;
    }
    let max = pivots.iter().cloned().fold(0.0, f64::max);
    let min = pivots.iter().cloned().fold(f64::INFINITY, f64::min);
    min <= max * tolerance
}

/// diag(AᵀA)^{-1/2}, with unit scaling for empty columns
fn equilibration(ata: &DMatrix<f64>) -> DVector<f64> {
    ata.diagonal()
        .map(|d| if d > 0.0 { 1.0 / d.sqrt() } else { 1.0 })
}

fn scale_rows(m: &DMatrix<f64>, scale: &DVector<f64>) -> DMatrix<f64> {
    DMatrix::from_fn(m.nrows(), m.ncols(), |i, j| m[(i, j)] * scale[i])
}

fn least_squares(
    a: &DMatrix<f64>,
    b: &DMatrix<f64>,
    config: &SolverConfig,
    sink: &dyn DiagnosticSink,
) -> Result<(DMatrix<f64>, SolveMethod, bool)> {
    let at = a.transpose();
    let ata = &at * a;
    let atb = &at * b;

    // Solve (D AᵀA D) y = D Aᵀb, then x = D y
    let scale = equilibration(&ata);
    let scaled = DMatrix::from_fn(ata.nrows(), ata.ncols(), |i, j| {
        ata[(i, j)] * scale[i] * scale[j]
    });
    let scaled_rhs = scale_rows(&atb, &scale);

    match Cholesky::new(scaled) {
        Some(chol) if !has_degenerate_pivots(&chol, config.pivot_tolerance) => Ok((
            scale_rows(&chol.solve(&scaled_rhs), &scale),
            SolveMethod::Cholesky,
            false,
        )),
        Some(chol) => {
            sink.warn("-- WARNING: Numerical issues when solving the harmonic least square.");
            if config.svd_fallback {
                Ok((svd_least_squares(a, b)?, SolveMethod::Svd, true))
            } else {
                Ok((
                    scale_rows(&chol.solve(&scaled_rhs), &scale),
                    SolveMethod::Cholesky,
                    true,
                ))
            }
        }
        None => {
            sink.warn("-- WARNING: Numerical issues when solving the harmonic least square.");
            if config.svd_fallback {
                Ok((svd_least_squares(a, b)?, SolveMethod::Svd, true))
            } else {
                let x = ata.lu().solve(&atb).ok_or_else(|| {
                    BasisError::LeastSquares("singular normal equations".to_string())
                })?;
                Ok((x, SolveMethod::Lu, true))
            }
        }
    }
}

/// Minimum-norm least-squares solution of `a x = b`.
fn svd_least_squares(a: &DMatrix<f64>, b: &DMatrix<f64>) -> Result<DMatrix<f64>> {
    let svd = a.clone().svd(true, true);
    let largest = svd.singular_values.max();
    let eps = largest * (a.nrows().max(a.ncols()) as f64) * f64::EPSILON;
    svd.solve(b, eps)
        .map_err(|e| BasisError::LeastSquares(e.to_string()))
}

fn mean_max_residual(a: &DMatrix<f64>, weights: &DMatrix<f64>, rhs: &DMatrix<f64>) -> f64 {
    if rhs.ncols() == 0 {
        return 0.0;
    }
    let residual = a * weights - rhs;
    let total: f64 = residual.column_iter().map(|col| col.amax()).sum();
    total / rhs.ncols() as f64
}
