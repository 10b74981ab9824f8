//! 2D (polygonal) constraint system.
//!
//! The five test monomials are x, y, xy, x², y². Since Δx = Δy = Δxy = 0
//! and Δx² = Δy² = 2, the equations read
//!
//! ```text
//!     ∫∂_x φ                 = c10
//!     ∫∂_y φ                 = c01
//!     ∫(y ∂_x φ + x ∂_y φ)   = c11
//!     ∫2x ∂_x φ + ∫2φ        = c20
//!     ∫2y ∂_y φ + ∫2φ        = c02
//! ```
//!
//! and, substituting the polynomial part of φ,
//!
//! ```text
//!       a10   a01   a11      a20   a02
//!     ┏                                 ┓
//!     ┃ |E|         ∫y       2∫x        ┃
//!     ┃       |E|   ∫x             2∫y  ┃
//! M = ┃ ∫y    ∫x    ∫x²+∫y²  2∫xy  2∫xy ┃
//!     ┃ 4∫x   2∫y   4∫xy     6∫x²  2∫y² ┃
//!     ┃ 2∫x   4∫y   4∫xy     2∫x²  6∫y² ┃
//!     ┗                                 ┛
//! ```

use super::{KernelIntegrals, MonomialMoments};
use nalgebra::{DMatrix, SMatrix};

pub type PlanarMomentMatrix = SMatrix<f64, 5, 5>;

pub fn moment_matrix(moments: &MonomialMoments) -> PlanarMomentMatrix {
    let v = moments.volume;
    let [ix, iy, _] = moments.lin;
    let ixy = moments.mix[0];
    let [ixx, iyy, _] = moments.sqr;

    #[rustfmt::skip]
    let m = PlanarMomentMatrix::from_row_slice(&[
        v,        0.0,      iy,        2.0 * ix,  0.0,
        0.0,      v,        ix,        0.0,       2.0 * iy,
        iy,       ix,       ixx + iyy, 2.0 * ixy, 2.0 * ixy,
        4.0 * ix, 2.0 * iy, 4.0 * ixy, 6.0 * ixx, 2.0 * iyy,
        2.0 * ix, 4.0 * iy, 4.0 * ixy, 2.0 * ixx, 6.0 * iyy,
    ]);
    m
}

/// L̃ restricted to the kernel columns (5 × (#K+1), last column left zero).
pub fn kernel_rows(integrals: &KernelIntegrals) -> DMatrix<f64> {
    let num_kernels = integrals.cst.len();
    let mut rows = DMatrix::zeros(5, num_kernels + 1);

    for k in 0..num_kernels {
        rows[(0, k)] = -integrals.lin[(k, 0)];
        rows[(1, k)] = -integrals.lin[(k, 1)];
        rows[(2, k)] = -(integrals.mix[(k, 0)] + integrals.mix[(k, 1)]);
        rows[(3, k)] = -2.0 * (integrals.sqr[(k, 0)] + integrals.cst[k]);
        rows[(4, k)] = -2.0 * (integrals.sqr[(k, 1)] + integrals.cst[k]);
    }

    rows
}
