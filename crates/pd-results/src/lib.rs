//! pd-results: run cache and history storage.

pub mod hash;
pub mod store;
pub mod types;

pub use hash::compute_run_id;
pub use store::RunStore;
pub use types::*;

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Run not found: {run_id}")]
    RunNotFound { run_id: String },

    #[error("Invalid path: {message}")]
    InvalidPath { message: String },

    #[error("Invalid run id: {run_id:?}")]
    InvalidRunId { run_id: String },

    #[error("Non-finite value in history at step {step}, field {field}: {value}")]
    NonFiniteValue {
        step: usize,
        field: String,
        value: f64,
    },
}
