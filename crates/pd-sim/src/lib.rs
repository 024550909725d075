//! Fixed-step explicit Runge-Kutta integration over named-field states.
//!
//! Provides:
//! - Butcher tableau descriptors with validation and a set of built-in schemes
//! - `DerivativeProvider` trait for pluggable rate-of-change laws
//! - Table-driven explicit RK stepper (`single_step`, `ExplicitRk`)
//! - Fixed-count driver producing a `History`
//! - Elastic pendulum reference model

pub mod error;
pub mod integrator;
pub mod pendulum;
pub mod provider;
pub mod sim;
pub mod tableau;

// Re-exports for public API
pub use error::{SimError, SimResult};
pub use integrator::{ExplicitRk, Integrator, single_step};
pub use pendulum::{ElasticPendulum, PendulumParams};
pub use provider::DerivativeProvider;
pub use sim::{History, RunSpec, SimProgress, run, run_with_progress};
pub use tableau::ButcherTable;
