//! Weak-form consistency checks.
//!
//! Generic, slow counterparts of the closed-form constraint system, assembled
//! from monomial values, gradients and Laplacians. Nothing on the
//! construction path calls into this module; it exists to cross-check the
//! closed-form matrices and to measure how well a built basis satisfies
//! its constraints.

use crate::constraints::{self, MonomialMoments};
use crate::error::{BasisError, Result};
use crate::kernel::Dimension;
use crate::quadrature::Quadrature;
use crate::rbf::LocalBasis;
use nalgebra::DMatrix;

/// x^a y^b z^c
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Monomial {
    pub exponents: [u32; 3],
}

impl Monomial {
    const fn new(a: u32, b: u32, c: u32) -> Self {
        Self { exponents: [a, b, c] }
    }

    pub fn value(&self, p: &[f64]) -> f64 {
        self.exponents
            .iter()
            .enumerate()
            .map(|(d, &e)| if e == 0 { 1.0 } else { p[d].powi(e as i32) })
            .product()
    }

    pub fn derivative(&self, axis: usize, p: &[f64]) -> f64 {
        let e = self.exponents[axis];
        if e == 0 {
            return 0.0;
        }
        let mut lowered = *self;
        lowered.exponents[axis] -= 1;
        e as f64 * lowered.value(p)
    }

    pub fn laplacian(&self, p: &[f64]) -> f64 {
        (0..p.len())
            .filter(|&d| self.exponents[d] >= 2)
            .map(|d| {
                let e = self.exponents[d];
                let mut lowered = *self;
                lowered.exponents[d] -= 2;
                (e * (e - 1)) as f64 * lowered.value(p)
            })
            .sum()
    }
}

const PLANAR_MONOMIALS: [Monomial; 5] = [
    Monomial::new(1, 0, 0),
    Monomial::new(0, 1, 0),
    Monomial::new(1, 1, 0),
    Monomial::new(2, 0, 0),
    Monomial::new(0, 2, 0),
];

const VOLUME_MONOMIALS: [Monomial; 9] = [
    Monomial::new(1, 0, 0),
    Monomial::new(0, 1, 0),
    Monomial::new(0, 0, 1),
    Monomial::new(1, 1, 0),
    Monomial::new(0, 1, 1),
    Monomial::new(1, 0, 1),
    Monomial::new(2, 0, 0),
    Monomial::new(0, 2, 0),
    Monomial::new(0, 0, 2),
];

/// Non-constant quadratic monomials, in weight-column order
pub fn test_monomials(dimension: Dimension) -> &'static [Monomial] {
    match dimension {
        Dimension::Planar => &PLANAR_MONOMIALS,
        Dimension::Volume => &VOLUME_MONOMIALS,
    }
}

fn point(quadr: &Quadrature, q: usize, dim: usize) -> [f64; 3] {
    let mut p = [0.0; 3];
    for (d, x) in p.iter_mut().enumerate().take(dim) {
        *x = quadr.points[(q, d)];
    }
    p
}

/// Report whichever of rows or columns differs.
fn check_shape(
    context: (&'static str, &'static str),
    expected: (usize, usize),
    found: (usize, usize),
) -> Result<()> {
    if found.0 != expected.0 {
        return Err(BasisError::mismatch(context.0, expected.0, found.0));
    }
    if found.1 != expected.1 {
        return Err(BasisError::mismatch(context.1, expected.1, found.1));
    }
    Ok(())
}

fn check_quadrature(dimension: Dimension, quadr: &Quadrature) -> Result<()> {
    if quadr.dim() != dimension.dim() {
        return Err(BasisError::mismatch(
            "quadrature points",
            dimension.dim(),
            quadr.dim(),
        ));
    }
    Ok(())
}

/// ∫∇Q_i·∇u + ∫ΔQ_i u for every field u.
///
/// `values` holds one column per field (rows are quadrature points) and
/// `grads[d]` its derivative along axis d. The result has one row per field
/// and one column per test monomial, the layout of `local_basis_integral`.
pub fn weak_form_integrals(
    dimension: Dimension,
    quadr: &Quadrature,
    values: &DMatrix<f64>,
    grads: &[DMatrix<f64>],
) -> Result<DMatrix<f64>> {
    check_quadrature(dimension, quadr)?;
    let dim = dimension.dim();
    if grads.len() != dim {
        return Err(BasisError::mismatch("gradient components", dim, grads.len()));
    }
    if values.nrows() != quadr.len() {
        return Err(BasisError::mismatch("field values", quadr.len(), values.nrows()));
    }
    for grad in grads {
        check_shape(
            ("field gradient rows", "field gradient columns"),
            values.shape(),
            grad.shape(),
        )?;
    }

    let monomials = test_monomials(dimension);
    let mut integrals = DMatrix::zeros(values.ncols(), monomials.len());
    for q in 0..quadr.len() {
        let p = point(quadr, q, dim);
        let wq = quadr.weights[q];
        for (i, mono) in monomials.iter().enumerate() {
            let lap = mono.laplacian(&p[..dim]);
            for j in 0..values.ncols() {
                let mut val = lap * values[(q, j)];
                for (d, grad) in grads.iter().enumerate() {
                    val += mono.derivative(d, &p[..dim]) * grad[(q, j)];
                }
                integrals[(j, i)] += val * wq;
            }
        }
    }

    Ok(integrals)
}

/// M(i, j) = ∫∇Q_i·∇Q_j + ∫ΔQ_i Q_j over the quadrature rule.
pub fn assemble_monomial_matrix(dimension: Dimension, quadr: &Quadrature) -> Result<DMatrix<f64>> {
    check_quadrature(dimension, quadr)?;
    let dim = dimension.dim();
    let monomials = test_monomials(dimension);
    let n = monomials.len();

    let mut m = DMatrix::zeros(n, n);
    for q in 0..quadr.len() {
        let p = point(quadr, q, dim);
        let p = &p[..dim];
        let wq = quadr.weights[q];
        for (i, qi) in monomials.iter().enumerate() {
            let lap = qi.laplacian(p);
            for (j, qj) in monomials.iter().enumerate() {
                let mut val = lap * qj.value(p);
                for d in 0..dim {
                    val += qi.derivative(d, p) * qj.derivative(d, p);
                }
                m[(i, j)] += val * wq;
            }
        }
    }
    Ok(m)
}

/// Closed-form M built from the element moments.
pub fn moment_matrix(dimension: Dimension, quadr: &Quadrature) -> Result<DMatrix<f64>> {
    check_quadrature(dimension, quadr)?;
    let moments = MonomialMoments::compute(dimension, quadr);
    Ok(constraints::moment_matrix(dimension, &moments))
}

/// max |generic M - closed-form M|
pub fn moment_matrix_discrepancy(dimension: Dimension, quadr: &Quadrature) -> Result<f64> {
    let generic = assemble_monomial_matrix(dimension, quadr)?;
    let closed = moment_matrix(dimension, quadr)?;
    Ok((generic - closed).amax())
}

/// Weak-form integrals of each built basis minus the supplied local integral.
///
/// Zero (up to round-off) for bases built with constraints over the same rule.
pub fn reproduction_residual<B: LocalBasis + ?Sized>(
    basis: &B,
    quadr: &Quadrature,
    local_basis_integral: &DMatrix<f64>,
) -> Result<DMatrix<f64>> {
    let dimension = Dimension::from_len(basis.dim())?;
    let values = basis.bases_values(&quadr.points)?;
    let grads = (0..basis.dim())
        .map(|axis| basis.bases_grads(axis, &quadr.points))
        .collect::<Result<Vec<_>>>()?;

    let integrals = weak_form_integrals(dimension, quadr, &values, &grads)?;
    check_shape(
        ("local basis integral rows", "local basis integral columns"),
        integrals.shape(),
        local_basis_integral.shape(),
    )?;
    Ok(integrals - local_basis_integral)
}
