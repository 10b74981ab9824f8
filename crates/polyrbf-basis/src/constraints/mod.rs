//! Weak-form constraints tying the quadratic coefficients to the kernel weights.
//!
//! For every FEM basis φ_j that does not vanish on the element E we ask
//! that each non-constant quadratic monomial Q be reproduced consistently
//! with the weak form of the Laplacian:
//!
//! ```text
//! ∫_E ∇Q·∇φ_j + ∫_E ΔQ φ_j = -∫_{Ω\E} ∇Q·∇φ_j - ∫_{Ω\E} ΔQ φ_j
//! ```
//!
//! The right-hand side is known in advance (`local_basis_integral`). With
//!
//! ```text
//! φ_j = Σ_k w_k ψ_k + a_0 + Σ_d a_d x_d + (mixed) + Σ_d a_dd x_d²
//! ```
//!
//! the left-hand side is linear in the kernel weights and polynomial
//! coefficients, giving a small square system `M a = c - K̃ w - 2|E| a_0`
//! (5×5 in 2D, 9×9 in 3D) over the non-constant coefficients `a`. Solving
//! it once per element yields the affine reduction
//!
//! ```text
//! weights = L v + t,   v = (w_1 … w_#K, a_0)
//! ```
//!
//! with `L = [I; M⁻¹ L̃]` and `t = [0; M⁻¹ cᵀ]`.

pub mod planar;
pub mod volume;

use crate::design::ColumnLayout;
use crate::error::{BasisError, Result};
use crate::kernel::Dimension;
use crate::quadrature::Quadrature;
use nalgebra::{Const, DMatrix, DVector, FullPivLU};

/// Quadrature integrals of each kernel against the weak-form test monomials.
///
/// Row k belongs to kernel center k.
#[derive(Debug, Clone, PartialEq)]
pub struct KernelIntegrals {
    /// ∫ψ_k
    pub cst: DVector<f64>,
    /// ∫∂_d ψ_k
    pub lin: DMatrix<f64>,
    /// 2D: ∫y ∂_x ψ_k, ∫x ∂_y ψ_k
    /// 3D: ∫(x_{d+1} ∂_d ψ_k + x_d ∂_{d+1} ψ_k)
    pub mix: DMatrix<f64>,
    /// ∫x_d ∂_d ψ_k
    pub sqr: DMatrix<f64>,
}

impl KernelIntegrals {
    pub fn compute(dimension: Dimension, centers: &DMatrix<f64>, quadr: &Quadrature) -> Self {
        let num_kernels = centers.nrows();
        let dim = dimension.dim();

        let mut cst = DVector::zeros(num_kernels);
        let mut lin = DMatrix::zeros(num_kernels, dim);
        let mut mix = DMatrix::zeros(num_kernels, dim);
        let mut sqr = DMatrix::zeros(num_kernels, dim);

        let mut p = [0.0; 3];
        let mut grad = [0.0; 3];
        for k in 0..num_kernels {
            // ∫∂_d ψ_k ≈ Σ_q (x_qd - c_kd) h'(r)/r w_q
            for q in 0..quadr.len() {
                let wq = quadr.weights[q];
                let mut r2 = 0.0;
                for d in 0..dim {
                    p[d] = quadr.points[(q, d)] - centers[(k, d)];
                    r2 += p[d] * p[d];
                }
                let r = r2.sqrt();
                let factor = dimension.kernel_gradient_factor(r) * wq;
                for d in 0..dim {
                    grad[d] = p[d] * factor;
                }

                cst[k] += dimension.kernel(r) * wq;
                for d in 0..dim {
                    let x = quadr.points[(q, d)];
                    lin[(k, d)] += grad[d];
                    sqr[(k, d)] += x * grad[d];
                }

                match dimension {
                    Dimension::Planar => {
                        mix[(k, 0)] += quadr.points[(q, 1)] * grad[0];
                        mix[(k, 1)] += quadr.points[(q, 0)] * grad[1];
                    }
                    Dimension::Volume => {
                        for d in 0..3 {
                            let e = (d + 1) % 3;
                            mix[(k, d)] +=
                                quadr.points[(q, e)] * grad[d] + quadr.points[(q, d)] * grad[e];
                        }
                    }
                }
            }
        }

        Self { cst, lin, mix, sqr }
    }
}

/// Polynomial moments of the element, from the quadrature rule.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MonomialMoments {
    /// |E| = Σ w_q
    pub volume: f64,
    /// ∫x, ∫y, ∫z
    pub lin: [f64; 3],
    /// 2D: [∫xy, 0, 0]; 3D: [∫xy, ∫yz, ∫zx]
    pub mix: [f64; 3],
    /// ∫x², ∫y², ∫z²
    pub sqr: [f64; 3],
}

impl MonomialMoments {
    pub fn compute(dimension: Dimension, quadr: &Quadrature) -> Self {
        let dim = dimension.dim();
        let mut moments = MonomialMoments {
            volume: quadr.volume(),
            ..Default::default()
        };

        let x = |q: usize, d: usize| quadr.points[(q, d)];
        for d in 0..dim {
            moments.lin[d] = quadr.integrate(|q| x(q, d));
            moments.sqr[d] = quadr.integrate(|q| x(q, d) * x(q, d));
        }
        match dimension {
            Dimension::Planar => moments.mix[0] = quadr.integrate(|q| x(q, 0) * x(q, 1)),
            Dimension::Volume => {
                for d in 0..3 {
                    moments.mix[d] = quadr.integrate(|q| x(q, d) * x(q, (d + 1) % 3));
                }
            }
        }

        moments
    }
}

/// Factored moment matrix, one variant per dimension.
#[derive(Debug, Clone)]
pub enum MomentFactorization {
    Planar(FullPivLU<f64, Const<5>, Const<5>>),
    Volume(FullPivLU<f64, Const<9>, Const<9>>),
}

impl MomentFactorization {
    /// Factor the closed-form moment matrix of the element.
    pub fn new(dimension: Dimension, moments: &MonomialMoments) -> Result<Self> {
        let factorization = match dimension {
            Dimension::Planar => {
                MomentFactorization::Planar(planar::moment_matrix(moments).full_piv_lu())
            }
            Dimension::Volume => {
                MomentFactorization::Volume(volume::moment_matrix(moments).full_piv_lu())
            }
        };

        if !factorization.is_invertible() {
            return Err(BasisError::SingularConstraintMatrix {
                dim: dimension.dim(),
            });
        }
        Ok(factorization)
    }

    fn size(&self) -> usize {
        match self {
            MomentFactorization::Planar(_) => 5,
            MomentFactorization::Volume(_) => 9,
        }
    }

    /// Invertible, and the smallest pivot is not lost in round-off.
    fn is_invertible(&self) -> bool {
        let (invertible, pivots): (bool, Vec<f64>) = match self {
            MomentFactorization::Planar(lu) => {
                (lu.is_invertible(), lu.u().diagonal().iter().map(|p| p.abs()).collect())
            }
            MomentFactorization::Volume(lu) => {
                (lu.is_invertible(), lu.u().diagonal().iter().map(|p| p.abs()).collect())
            }
        };
        if !invertible || pivots.iter().any(|p| !p.is_finite()) {
            return false;
        }

        let max = pivots.iter().cloned().fold(0.0, f64::max);
        let min = pivots.iter().cloned().fold(f64::INFINITY, f64::min);
        min > max * (self.size() as f64) * f64::EPSILON
    }

    /// M⁻¹ · rhs, for a rhs with 5 (2D) or 9 (3D) rows.
    pub fn solve(&self, rhs: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        if rhs.nrows() != self.size() {
            return Err(BasisError::mismatch(
                "constraint right-hand side",
                self.size(),
                rhs.nrows(),
            ));
        }
        let solved = match self {
            MomentFactorization::Planar(lu) => lu.solve(rhs),
            MomentFactorization::Volume(lu) => lu.solve(rhs),
        };
        solved.ok_or(BasisError::SingularConstraintMatrix {
            dim: if self.size() == 5 { 2 } else { 3 },
        })
    }
}

/// Closed-form moment matrix as a dense matrix.
pub fn moment_matrix(dimension: Dimension, moments: &MonomialMoments) -> DMatrix<f64> {
    match dimension {
        Dimension::Planar => {
            let m = planar::moment_matrix(moments);
            DMatrix::from_fn(5, 5, |i, j| m[(i, j)])
        }
        Dimension::Volume => {
            let m = volume::moment_matrix(moments);
            DMatrix::from_fn(9, 9, |i, j| m[(i, j)])
        }
    }
}

/// The affine reduction `weights = L v + t`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintReduction {
    /// (#K+1+d+d(d+1)/2) × (#K+1)
    pub l: DMatrix<f64>,
    /// (#K+1+d+d(d+1)/2) × #bases
    pub t: DMatrix<f64>,
}

/// Derive `L` and `t` for the element described by `quadr`.
///
/// `local_basis_integral` holds one row per basis and one column per
/// weak-form constraint (5 in 2D, 9 in 3D).
pub fn derive_constraints(
    dimension: Dimension,
    centers: &DMatrix<f64>,
    quadr: &Quadrature,
    local_basis_integral: &DMatrix<f64>,
    num_bases: usize,
) -> Result<ConstraintReduction> {
    let dim = dimension.dim();
    let num_constraints = dimension.num_constraints();
    if centers.ncols() != dim {
        return Err(BasisError::mismatch("kernel centers", dim, centers.ncols()));
    }
    if quadr.dim() != dim {
        return Err(BasisError::mismatch("quadrature points", dim, quadr.dim()));
    }
    if quadr.is_empty() {
        return Err(BasisError::EmptyQuadrature);
    }
    if local_basis_integral.nrows() != num_bases {
        return Err(BasisError::mismatch(
            "local basis integral rows",
            num_bases,
            local_basis_integral.nrows(),
        ));
    }
    if local_basis_integral.ncols() != num_constraints {
        return Err(BasisError::mismatch(
            "local basis integral columns",
            num_constraints,
            local_basis_integral.ncols(),
        ));
    }

    let layout = ColumnLayout::new(centers.nrows(), dimension);
    let integrals = KernelIntegrals::compute(dimension, centers, quadr);
    let moments = MonomialMoments::compute(dimension, quadr);
    let lu = MomentFactorization::new(dimension, &moments)?;

    // L̃: kernel contributions to each constraint, plus the constant term
    // which only enters the squared-monomial equations through ∫ΔQ a_0.
    let mut l_tilde = match dimension {
        Dimension::Planar => planar::kernel_rows(&integrals),
        Dimension::Volume => volume::kernel_rows(&integrals),
    };
    for d in 0..dim {
        l_tilde[(num_constraints - dim + d, layout.num_kernels)] = -2.0 * moments.volume;
    }

    let first = layout.first_constrained();
    let mut l = DMatrix::zeros(layout.len(), first);
    for i in 0..first {
        l[(i, i)] = 1.0;
    }
    l.rows_mut(first, num_constraints)
        .copy_from(&lu.solve(&l_tilde)?);

    let mut t = DMatrix::zeros(layout.len(), num_bases);
    t.rows_mut(first, num_constraints)
        .copy_from(&lu.solve(&local_basis_integral.transpose())?);

    Ok(ConstraintReduction { l, t })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// n×n midpoint rule on [x0, x0+h]×[y0, y0+h]
    fn midpoint_square(x0: f64, y0: f64, h: f64, n: usize) -> Quadrature {
        let cell = h / n as f64;
        let mut points = DMatrix::zeros(n * n, 2);
        for i in 0..n {
            for j in 0..n {
                points[(i * n + j, 0)] = x0 + (i as f64 + 0.5) * cell;
                points[(i * n + j, 1)] = y0 + (j as f64 + 0.5) * cell;
            }
        }
        Quadrature::new(points, DVector::from_element(n * n, cell * cell)).unwrap()
    }

    fn midpoint_cube(h: f64, n: usize) -> Quadrature {
        let cell = h / n as f64;
        let mut points = DMatrix::zeros(n * n * n, 3);
        let mut row = 0;
        for i in 0..n {
            for j in 0..n {
                for k in 0..n {
                    points[(row, 0)] = (i as f64 + 0.5) * cell;
                    points[(row, 1)] = (j as f64 + 0.5) * cell;
                    points[(row, 2)] = (k as f64 + 0.5) * cell;
                    row += 1;
                }
            }
        }
        Quadrature::new(points, DVector::from_element(n * n * n, cell.powi(3))).unwrap()
    }

    fn ring_centers(n: usize) -> DMatrix<f64> {
        DMatrix::from_fn(n, 2, |k, d| {
            let angle = 2.0 * std::f64::consts::PI * k as f64 / n as f64;
            0.5 + 1.5 * if d == 0 { angle.cos() } else { angle.sin() }
        })
    }

    #[test]
    fn planar_moments_of_unit_square() {
        let quadr = midpoint_square(0.0, 0.0, 1.0, 8);
        let moments = MonomialMoments::compute(Dimension::Planar, &quadr);

        assert_relative_eq!(moments.volume, 1.0, epsilon = 1e-14);
        assert_relative_eq!(moments.lin[0], 0.5, epsilon = 1e-14);
        assert_relative_eq!(moments.mix[0], 0.25, epsilon = 1e-14);
        // Midpoint rule underestimates ∫x² by h²/12 per unit length
        assert_relative_eq!(moments.sqr[1], 1.0 / 3.0 - 1.0 / (12.0 * 64.0), epsilon = 1e-14);
    }

    #[test]
    fn factorization_succeeds_on_regular_elements() {
        let quadr = midpoint_square(-0.3, 0.2, 0.7, 5);
        let moments = MonomialMoments::compute(Dimension::Planar, &quadr);
        assert!(MomentFactorization::new(Dimension::Planar, &moments).is_ok());

        let quadr = midpoint_cube(1.0, 3);
        let moments = MonomialMoments::compute(Dimension::Volume, &quadr);
        assert!(MomentFactorization::new(Dimension::Volume, &moments).is_ok());
    }

    #[test]
    fn zero_volume_element_is_singular() {
        let quadr = Quadrature::new(DMatrix::zeros(4, 2), DVector::zeros(4)).unwrap();
        let moments = MonomialMoments::compute(Dimension::Planar, &quadr);
        assert!(matches!(
            MomentFactorization::new(Dimension::Planar, &moments),
            Err(BasisError::SingularConstraintMatrix { dim: 2 })
        ));
    }

    #[test]
    fn collinear_quadrature_is_singular() {
        // All points on the line y = x: the element has no area in any useful sense
        let points = DMatrix::from_fn(6, 2, |q, _| 0.1 * q as f64);
        let quadr = Quadrature::new(points, DVector::from_element(6, 0.2)).unwrap();
        let result = derive_constraints(
            Dimension::Planar,
            &ring_centers(4),
            &quadr,
            &DMatrix::zeros(1, 5),
            1,
        );
        assert!(matches!(
            result,
            Err(BasisError::SingularConstraintMatrix { dim: 2 })
        ));
    }

    #[test]
    fn reduction_shapes_and_identity_block() {
        let quadr = midpoint_square(0.0, 0.0, 1.0, 4);
        let centers = ring_centers(6);
        let lbi = DMatrix::from_fn(3, 5, |i, j| (i + j) as f64 * 0.1);
        let reduction = derive_constraints(Dimension::Planar, &centers, &quadr, &lbi, 3).unwrap();

        assert_eq!(reduction.l.shape(), (6 + 1 + 5, 7));
        assert_eq!(reduction.t.shape(), (12, 3));
        for i in 0..7 {
            for j in 0..7 {
                assert_eq!(reduction.l[(i, j)], if i == j { 1.0 } else { 0.0 });
            }
            for j in 0..3 {
                assert_eq!(reduction.t[(i, j)], 0.0);
            }
        }
    }

    #[test]
    fn zero_local_integral_gives_zero_translation() {
        let quadr = midpoint_square(0.0, 0.0, 1.0, 4);
        let reduction = derive_constraints(
            Dimension::Planar,
            &ring_centers(5),
            &quadr,
            &DMatrix::zeros(2, 5),
            2,
        )
        .unwrap();
        assert!(reduction.t.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn translation_solves_moment_system() {
        let quadr = midpoint_cube(1.0, 3);
        let moments = MonomialMoments::compute(Dimension::Volume, &quadr);
        let m = moment_matrix(Dimension::Volume, &moments);
        let lbi = DMatrix::from_fn(2, 9, |i, j| 1.0 + i as f64 - 0.3 * j as f64);
        let centers = DMatrix::from_fn(4, 3, |k, d| if k == d { 2.0 } else { -1.0 });

        let reduction = derive_constraints(Dimension::Volume, &centers, &quadr, &lbi, 2).unwrap();
        let a = reduction.t.rows(5, 9).into_owned();
        let residual = &m * a - lbi.transpose();
        assert!(residual.amax() < 1e-10, "residual {}", residual.amax());
    }

    #[test]
    fn rejects_mismatched_inputs() {
        let quadr = midpoint_square(0.0, 0.0, 1.0, 2);
        let centers3 = DMatrix::zeros(2, 3);
        assert!(matches!(
            derive_constraints(Dimension::Planar, &centers3, &quadr, &DMatrix::zeros(1, 5), 1),
            Err(BasisError::DimensionMismatch { context: "kernel centers", .. })
        ));
        assert!(matches!(
            derive_constraints(
                Dimension::Volume,
                &centers3,
                &quadr,
                &DMatrix::zeros(1, 9),
                1
            ),
            Err(BasisError::DimensionMismatch { context: "quadrature points", .. })
        ));
        assert!(matches!(
            derive_constraints(
                Dimension::Planar,
                &ring_centers(3),
                &quadr,
                &DMatrix::zeros(1, 9),
                1
            ),
            Err(BasisError::DimensionMismatch { context: "local basis integral columns", .. })
        ));
        assert!(matches!(
            derive_constraints(
                Dimension::Planar,
                &ring_centers(3),
                &Quadrature::empty(2),
                &DMatrix::zeros(1, 5),
                1
            ),
            Err(BasisError::EmptyQuadrature)
        ));
    }
}
