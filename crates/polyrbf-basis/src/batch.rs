//! Per-element construction over a whole mesh.
//!
//! Elements are independent: each build owns its weights and only reads
//! its own inputs, so they run on the rayon thread pool.

use crate::config::SolverConfig;
use crate::diagnostics::{DiagnosticSink, LogSink};
use crate::error::Result;
use crate::rbf::{BasisInput, RbfWithQuadratic};
use rayon::prelude::*;

/// Build one basis per element, reporting through `log`.
///
/// Results come back in input order; a failing element does not stop the
/// others.
pub fn build_element_bases(
    inputs: &[BasisInput<'_>],
    config: &SolverConfig,
) -> Vec<Result<RbfWithQuadratic>> {
    build_element_bases_with(inputs, config, &LogSink)
}

/// Same as [`build_element_bases`] with an explicit sink.
pub fn build_element_bases_with(
    inputs: &[BasisInput<'_>],
    config: &SolverConfig,
    sink: &dyn DiagnosticSink,
) -> Vec<Result<RbfWithQuadratic>> {
    sink.trace(&format!("-- Building bases for {} elements", inputs.len()));
    inputs
        .par_iter()
        .map(|input| RbfWithQuadratic::with_config(input, config, sink))
        .collect()
}
