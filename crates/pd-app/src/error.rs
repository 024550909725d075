//! Error types for the pd-app service layer.

/// Application error type that wraps errors from the backend crates
/// and provides a unified error interface for the CLI.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Project error: {0}")]
    Project(#[from] pd_project::ProjectError),

    #[error("Simulation error: {0}")]
    Simulation(#[from] pd_sim::SimError),

    #[error("Results error: {0}")]
    Results(#[from] pd_results::ResultsError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
