use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Shape mismatch: fields {left:?} cannot be combined with {right:?}")]
    ShapeMismatch {
        left: Vec<String>,
        right: Vec<String>,
    },

    #[error("Missing field: {name}")]
    MissingField { name: String },

    #[error("Duplicate field: {name}")]
    DuplicateField { name: String },

    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: String, value: f64 },
}
