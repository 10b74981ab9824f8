//! Construction settings.

use serde::{Deserialize, Serialize};

/// Least-squares solver settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Normal equations are flagged as numerically singular when
    /// min(L_ii²) / max(L_ii²) of the Cholesky factor of the
    /// column-equilibrated D AᵀA D drops below this.
    pub pivot_tolerance: f64,
    /// Re-solve flagged systems through an SVD of the design matrix
    pub svd_fallback: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            pivot_tolerance: 1e-10,
            svd_fallback: true,
        }
    }
}

impl SolverConfig {
    /// Keep whatever the normal equations produce, only reporting issues.
    pub fn normal_equations_only() -> Self {
        Self {
            svd_fallback: false,
            ..Self::default()
        }
    }
}
