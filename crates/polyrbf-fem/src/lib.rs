//! Contracts of the finite element pipeline around the polyrbf bases.
//!
//! - [`problem`]: right-hand sides, boundary data and exact solutions
//! - [`newmark`]: implicit Newmark time stepping

pub mod error;
pub mod newmark;
pub mod problem;

pub use error::{FemError, Result};
pub use newmark::{ImplicitNewmark, NewmarkConfig, TimeIntegrator};
pub use problem::{Problem, QuadraticLaplace};
