//! Local RBF bases for polygonal and polyhedral finite elements.
//!
//! Each element gets bases spanned by harmonic kernels (ln r in 2D, 1/r in
//! 3D) centered around it, augmented with the full quadratic polynomial
//! space. Weights come from a least-squares fit to prescribed values at
//! collocation points, optionally restricted so that quadratic solutions of
//! the Laplacian are reproduced in the weak form.
//!
//! - [`kernel`]: harmonic kernels and their radial derivatives
//! - [`design`]: value and gradient design matrices
//! - [`constraints`]: the weak-form constraint reduction
//! - [`solver`]: normal-equation least squares with SVD fallback
//! - [`rbf`]: the built basis and its evaluation
//! - [`consistency`]: generic cross-checks of the constraint system
//! - [`batch`]: parallel construction over many elements

pub mod batch;
pub mod config;
pub mod consistency;
pub mod constraints;
pub mod design;
pub mod diagnostics;
pub mod error;
pub mod kernel;
pub mod quadrature;
pub mod rbf;
pub mod solver;

pub use batch::{build_element_bases, build_element_bases_with};
pub use config::SolverConfig;
pub use constraints::{derive_constraints, ConstraintReduction};
pub use design::{compute_kernels_gradient_matrix, compute_kernels_matrix, ColumnLayout};
pub use diagnostics::{DiagnosticSink, LogSink, MemorySink};
pub use error::{BasisError, Result};
pub use kernel::{kernel, kernel_prime, Dimension, KERNEL_CUTOFF};
pub use quadrature::Quadrature;
pub use rbf::{BasisInput, LocalBasis, RbfWithQuadratic};
pub use solver::{SolveMethod, SolveReport};
