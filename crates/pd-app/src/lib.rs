//! Shared application service layer for the pendulum workspace.
//!
//! Centralizes project management, run-spec compilation, cached run
//! execution, and history export for the CLI.

pub mod error;
pub mod export;
pub mod progress;
pub mod project_service;
pub mod run_service;

// Re-export key types for convenience
pub use error::{AppError, AppResult};
pub use export::{export_csv, field_series};
pub use progress::{RunProgressEvent, RunStage};
pub use project_service::{init_project, load_project, save_project, validate_project};
pub use run_service::{
    RunOptions, RunRequest, RunResponse, SOLVER_VERSION, build_run_spec, ensure_run,
    ensure_run_with_progress, history_records, list_runs, load_run, provider_for,
};
