//! Error types for polyrbf-fem

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FemError>;

#[derive(Error, Debug)]
pub enum FemError {
    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Time integrator used before init")]
    NotInitialized,

    #[error("Size mismatch in {context}: expected {expected}, found {found}")]
    SizeMismatch {
        context: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
