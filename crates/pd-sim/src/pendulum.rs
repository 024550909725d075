//! Elastic pendulum: a point mass on a spring anchored at the origin.
//!
//! State fields: `x`, `y` (position, m), `vx`, `vy` (velocity, m/s).
//! Parameters: `m` (mass, kg), `gamma` (viscous friction, kg/s),
//! `k` (spring stiffness, N/m), `l` (natural length, m), `g` (gravity, m/s^2).
//!
//! The spring is two-sided: it pulls when stretched beyond `l` and pushes when
//! compressed below it.

use pd_core::{ParameterVector, Real, StateVector, ensure_finite};

use crate::error::{SimError, SimResult};
use crate::provider::DerivativeProvider;

pub const STATE_FIELDS: [&str; 4] = ["x", "y", "vx", "vy"];
pub const PARAM_FIELDS: [&str; 5] = ["m", "gamma", "k", "l", "g"];

/// Below this radius the spring direction is undefined and the elastic force is zero.
pub const MIN_RADIUS: Real = 1e-6;

/// Typed view of the pendulum parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PendulumParams {
    pub m: Real,
    pub gamma: Real,
    pub k: Real,
    pub l: Real,
    pub g: Real,
}

impl PendulumParams {
    /// Read and check the parameters. Mass must be finite and positive.
    pub fn from_vector(params: &ParameterVector) -> SimResult<Self> {
        let p = Self {
            m: params.field("m")?,
            gamma: params.field("gamma")?,
            k: params.field("k")?,
            l: params.field("l")?,
            g: params.field("g")?,
        };
        for (name, value) in [
            ("m", p.m),
            ("gamma", p.gamma),
            ("k", p.k),
            ("l", p.l),
            ("g", p.g),
        ] {
            finite(value, name)?;
        }
        if p.m <= 0.0 {
            return Err(SimError::NumericDomain {
                what: format!("mass must be positive, got {}", p.m),
            });
        }
        Ok(p)
    }

    pub fn to_vector(&self) -> ParameterVector {
        // Field names are fixed and distinct.
        ParameterVector::from(pendulum_vector([
            ("m", self.m),
            ("gamma", self.gamma),
            ("k", self.k),
            ("l", self.l),
            ("g", self.g),
        ]))
    }
}

/// Elastic force on the mass at `(x, y)`.
///
/// Exactly `(0.0, 0.0)` when the radius is below [`MIN_RADIUS`].
pub fn elastic_force(x: Real, y: Real, k: Real, l: Real) -> (Real, Real) {
    let r = (x * x + y * y).sqrt();
    if r < MIN_RADIUS {
        return (0.0, 0.0);
    }
    let elastic_term = k * (1.0 - l / r);
    (-elastic_term * x, -elastic_term * y)
}

/// Derivative provider for the elastic pendulum.
#[derive(Clone, Copy, Debug, Default)]
pub struct ElasticPendulum;

impl ElasticPendulum {
    /// Reference scenario: released at (3, 0) moving left at 5 m/s.
    pub fn default_state() -> StateVector {
        pendulum_vector([("x", 3.0), ("y", 0.0), ("vx", -5.0), ("vy", 0.0)])
    }

    pub fn default_params() -> ParameterVector {
        PendulumParams {
            m: 0.5,
            gamma: 0.1,
            k: 3.0,
            l: 1.0,
            g: 9.81,
        }
        .to_vector()
    }

    /// Kinetic + gravitational + spring potential energy (J).
    pub fn mechanical_energy(state: &StateVector, params: &ParameterVector) -> SimResult<Real> {
        let p = PendulumParams::from_vector(params)?;
        let [x, y, vx, vy] = read_state(state)?;
        let r = (x * x + y * y).sqrt();
        let kinetic = 0.5 * p.m * (vx * vx + vy * vy);
        let gravity = p.m * p.g * y;
        let spring = 0.5 * p.k * (r - p.l).powi(2);
        Ok(kinetic + gravity + spring)
    }
}

impl DerivativeProvider for ElasticPendulum {
    fn derivative(
        &self,
        state: &StateVector,
        params: &ParameterVector,
    ) -> SimResult<StateVector> {
        let p = PendulumParams::from_vector(params)?;
        let [x, y, vx, vy] = read_state(state)?;

        let (elastic_x, elastic_y) = elastic_force(x, y, p.k, p.l);
        let friction_x = -p.gamma * vx;
        let friction_y = -p.gamma * vy;
        let gravity_y = -p.m * p.g;

        let ax = (elastic_x + friction_x) / p.m;
        let ay = (elastic_y + friction_y + gravity_y) / p.m;

        Ok(StateVector::new([
            ("x", vx),
            ("y", vy),
            ("vx", ax),
            ("vy", ay),
        ])?)
    }
}

fn read_state(state: &StateVector) -> SimResult<[Real; 4]> {
    let mut out = [0.0; 4];
    for (slot, name) in out.iter_mut().zip(STATE_FIELDS) {
        *slot = finite(state.field(name)?, name)?;
    }
    Ok(out)
}

/// Non-finite inputs are outside the model's domain.
fn finite(value: Real, name: &str) -> SimResult<Real> {
    ensure_finite(value, name).map_err(|e| SimError::NumericDomain {
        what: e.to_string(),
    })
}

fn pendulum_vector<const N: usize>(fields: [(&str, Real); N]) -> StateVector {
    match StateVector::new(fields) {
        Ok(v) => v,
        Err(e) => unreachable!("pendulum field names are distinct: {e}"),
    }
}
