//! pd-core: shared foundation for the pendulum workspace.
//!
//! Contains:
//! - state (named-field `StateVector` with checked elementwise algebra)
//! - params (read-only `ParameterVector`)
//! - numeric (Real + tolerances + float helpers)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod params;
pub mod state;

// Re-exports: nice ergonomics for downstream crates
pub use error::{CoreError, CoreResult};
pub use numeric::*;
pub use params::ParameterVector;
pub use state::StateVector;
