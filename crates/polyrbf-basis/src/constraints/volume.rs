//! 3D (polyhedral) constraint system.
//!
//! Nine test monomials: x, y, z (ΔQ = 0), xy, yz, zx (ΔQ = 0) and
//! x², y², z² (ΔQ = 2). Equations:
//!
//! ```text
//!     ∫∂_d φ                               = c_d
//!     ∫(x_{d+1} ∂_d φ + x_d ∂_{d+1} φ)     = c_{3+d}
//!     ∫2 x_d ∂_d φ + ∫2φ                   = c_{6+d}
//! ```
//!
//! The squared-monomial rows pick up `2∫Q_j` for every polynomial term Q_j
//! of φ through the ∫2φ term; [`moment_matrix`] adds it after filling the
//! gradient part.

use super::{KernelIntegrals, MonomialMoments};
use nalgebra::{DMatrix, SMatrix};

pub type VolumeMomentMatrix = SMatrix<f64, 9, 9>;

pub fn moment_matrix(moments: &MonomialMoments) -> VolumeMomentMatrix {
    let v = moments.volume;
    let [ix, iy, iz] = moments.lin;
    let [ixy, iyz, izx] = moments.mix;
    let [ixx, iyy, izz] = moments.sqr;

    // Columns: a100 a010 a001 | a110 a011 a101 | a200 a020 a002
    #[rustfmt::skip]
    let mut m = VolumeMomentMatrix::from_row_slice(&[
        v,        0.0,      0.0,      iy,        0.0,       iz,        2.0 * ix,  0.0,       0.0,
        0.0,      v,        0.0,      ix,        iz,        0.0,       0.0,       2.0 * iy,  0.0,
        0.0,      0.0,      v,        0.0,       iy,        ix,        0.0,       0.0,       2.0 * iz,
        iy,       ix,       0.0,      ixx + iyy, izx,       iyz,       2.0 * ixy, 2.0 * ixy, 0.0,
        0.0,      iz,       iy,       izx,       iyy + izz, ixy,       0.0,       2.0 * iyz, 2.0 * iyz,
        iz,       0.0,      ix,       iyz,       ixy,       izz + ixx, 2.0 * izx, 0.0,       2.0 * izx,
        2.0 * ix, 0.0,      0.0,      2.0 * ixy, 0.0,       2.0 * izx, 4.0 * ixx, 0.0,       0.0,
        0.0,      2.0 * iy, 0.0,      2.0 * ixy, 2.0 * iyz, 0.0,       0.0,       4.0 * iyy, 0.0,
        0.0,      0.0,      2.0 * iz, 0.0,       2.0 * iyz, 2.0 * izx, 0.0,       0.0,       4.0 * izz,
    ]);

    // ∫ΔQ φ = 2∫φ for the squared monomials
    let polynomial_moments = [ix, iy, iz, ixy, iyz, izx, ixx, iyy, izz];
    for row in 6..9 {
        for (col, moment) in polynomial_moments.iter().enumerate() {
            m[(row, col)] += 2.0 * moment;
        }
    }

    m
}

/// L̃ restricted to the kernel columns (9 × (#K+1), last column left zero).
pub fn kernel_rows(integrals: &KernelIntegrals) -> DMatrix<f64> {
    let num_kernels = integrals.cst.len();
    let mut rows = DMatrix::zeros(9, num_kernels + 1);

    for k in 0..num_kernels {
        for d in 0..3 {
            rows[(d, k)] = -integrals.lin[(k, d)];
            rows[(3 + d, k)] = -integrals.mix[(k, d)];
            rows[(6 + d, k)] = -2.0 * (integrals.sqr[(k, d)] + integrals.cst[k]);
        }
    }

    rows
}
