//! Problem definitions consumed by the assembler.
//!
//! A problem supplies the right-hand side, Dirichlet data and (optionally)
//! an exact solution, all evaluated at batches of points stored one per
//! row. Scalar problems return one column; vector problems one column per
//! spatial axis.

use crate::error::{FemError, Result};
use nalgebra::DMatrix;
use serde::Deserialize;
use serde_json::Value;

pub trait Problem: Send + Sync {
    fn name(&self) -> &str;

    fn is_scalar(&self) -> bool;

    /// Source term at `pts` and time `t`
    fn rhs(&self, pts: &DMatrix<f64>, t: f64) -> DMatrix<f64>;

    fn is_rhs_zero(&self) -> bool;

    /// Dirichlet values at boundary points
    fn bc(&self, pts: &DMatrix<f64>, t: f64) -> DMatrix<f64>;

    /// Neumann values at boundary points with outward `normals`
    fn neumann_bc(&self, pts: &DMatrix<f64>, _normals: &DMatrix<f64>, _t: f64) -> DMatrix<f64> {
        self.zeros(pts)
    }

    fn has_exact_sol(&self) -> bool;

    fn exact(&self, _pts: &DMatrix<f64>, _t: f64) -> Option<DMatrix<f64>> {
        None
    }

    /// Gradient of the exact solution, one column per axis (scalar problems)
    fn exact_grad(&self, _pts: &DMatrix<f64>, _t: f64) -> Option<DMatrix<f64>> {
        None
    }

    fn is_time_dependent(&self) -> bool {
        false
    }

    fn is_constant_in_time(&self) -> bool {
        true
    }

    fn initial_solution(&self, pts: &DMatrix<f64>) -> DMatrix<f64> {
        self.zeros(pts)
    }

    fn initial_velocity(&self, pts: &DMatrix<f64>) -> DMatrix<f64> {
        self.zeros(pts)
    }

    fn initial_acceleration(&self, pts: &DMatrix<f64>) -> DMatrix<f64> {
        self.zeros(pts)
    }

    /// Update problem parameters from a JSON object. Unknown keys are ignored.
    fn set_parameters(&mut self, _params: &Value) -> Result<()> {
        Ok(())
    }

    /// Zero field with the problem's value layout
    fn zeros(&self, pts: &DMatrix<f64>) -> DMatrix<f64> {
        let cols = if self.is_scalar() { 1 } else { pts.ncols() };
        DMatrix::zeros(pts.nrows(), cols)
    }
}

/// Δu = 2d·s for u = s Σ x_d², with Dirichlet data taken from u.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QuadraticLaplace {
    #[serde(default = "QuadraticLaplace::default_scale")]
    pub scale: f64,
}

impl QuadraticLaplace {
    pub fn new(scale: f64) -> Self {
        Self { scale }
    }

    fn default_scale() -> f64 {
        1.0
    }

    fn value(&self, pts: &DMatrix<f64>) -> DMatrix<f64> {
        DMatrix::from_fn(pts.nrows(), 1, |i, _| {
            self.scale * pts.row(i).iter().map(|x| x * x).sum::<f64>()
        })
    }
}

impl Default for QuadraticLaplace {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Problem for QuadraticLaplace {
    fn name(&self) -> &str {
        "QuadraticLaplace"
    }

    fn is_scalar(&self) -> bool {
        true
    }

    fn rhs(&self, pts: &DMatrix<f64>, _t: f64) -> DMatrix<f64> {
        DMatrix::from_element(pts.nrows(), 1, 2.0 * pts.ncols() as f64 * self.scale)
    }

    fn is_rhs_zero(&self) -> bool {
        self.scale == 0.0
    }

    fn bc(&self, pts: &DMatrix<f64>, _t: f64) -> DMatrix<f64> {
        self.value(pts)
    }

    fn has_exact_sol(&self) -> bool {
        true
    }

    fn exact(&self, pts: &DMatrix<f64>, _t: f64) -> Option<DMatrix<f64>> {
        Some(self.value(pts))
    }

    fn exact_grad(&self, pts: &DMatrix<f64>, _t: f64) -> Option<DMatrix<f64>> {
        Some(pts * (2.0 * self.scale))
    }

    fn set_parameters(&mut self, params: &Value) -> Result<()> {
        if let Some(scale) = params.get("scale") {
            self.scale = scale.as_f64().ok_or_else(|| FemError::InvalidParameter {
                name: "scale",
                reason: format!("expected a number, found {}", scale),
            })?;
        }
        Ok(())
    }
}
