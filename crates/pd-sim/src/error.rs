//! Error types for integration.

use pd_core::CoreError;
use thiserror::Error;

/// Errors encountered while stepping or running a trajectory.
#[derive(Error, Debug)]
pub enum SimError {
    /// Shape mismatches and missing fields from state algebra.
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Malformed Butcher tableau: {what}")]
    MalformedTableau { what: String },

    #[error("Numeric domain error: {what}")]
    NumericDomain { what: String },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: String },

    #[error("Run cancelled after step {step}")]
    Cancelled { step: usize },
}

pub type SimResult<T> = Result<T, SimError>;
