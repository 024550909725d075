//! Table-driven explicit Runge-Kutta stepping.

use pd_core::{ParameterVector, Real, StateVector};

use crate::error::{SimError, SimResult};
use crate::provider::DerivativeProvider;
use crate::tableau::ButcherTable;

/// Trait for fixed-step time integrators.
pub trait Integrator {
    /// Advance `state` by one step of size `h`.
    fn step<P: DerivativeProvider + ?Sized>(
        &self,
        provider: &P,
        state: &StateVector,
        params: &ParameterVector,
        h: Real,
    ) -> SimResult<StateVector>;
}

/// Explicit Runge-Kutta integrator over a tableau validated at construction.
#[derive(Clone, Debug)]
pub struct ExplicitRk {
    table: ButcherTable,
}

impl ExplicitRk {
    pub fn new(table: ButcherTable) -> SimResult<Self> {
        table.validate()?;
        Ok(Self { table })
    }

    pub fn rk4() -> Self {
        Self {
            table: ButcherTable::rk4(),
        }
    }

    pub fn table(&self) -> &ButcherTable {
        &self.table
    }
}

impl Integrator for ExplicitRk {
    fn step<P: DerivativeProvider + ?Sized>(
        &self,
        provider: &P,
        state: &StateVector,
        params: &ParameterVector,
        h: Real,
    ) -> SimResult<StateVector> {
        check_step_size(h)?;
        rk_step(&self.table, provider, state, params, h)
    }
}

/// One explicit RK step with an unvalidated table.
///
/// The table is validated first; a malformed table is rejected before the
/// provider is ever called.
pub fn single_step<P: DerivativeProvider + ?Sized>(
    table: &ButcherTable,
    provider: &P,
    state: &StateVector,
    params: &ParameterVector,
    h: Real,
) -> SimResult<StateVector> {
    table.validate()?;
    check_step_size(h)?;
    rk_step(table, provider, state, params, h)
}

pub(crate) fn check_step_size(h: Real) -> SimResult<()> {
    if h.is_finite() && h > 0.0 {
        Ok(())
    } else {
        Err(SimError::InvalidArg {
            what: format!("step size must be finite and positive, got {h}"),
        })
    }
}

/// Stage loop. Requires a validated table.
///
/// Stage `i` sees `state + h * sum_{j<i} a[i][j] * k[j]`; the result is
/// `state + h * sum_i b[i] * k[i]`. Zero coefficients are skipped.
fn rk_step<P: DerivativeProvider + ?Sized>(
    table: &ButcherTable,
    provider: &P,
    state: &StateVector,
    params: &ParameterVector,
    h: Real,
) -> SimResult<StateVector> {
    let mut k: Vec<StateVector> = Vec::with_capacity(table.stages());

    for row in &table.a {
        let stage_input = if k.is_empty() {
            state.clone()
        } else {
            state.add_scaled(&weighted_sum(state, row, &k)?, h)?
        };
        let ki = provider.derivative(&stage_input, params)?;
        state.check_shape(&ki)?;
        k.push(ki);
    }

    Ok(state.add_scaled(&weighted_sum(state, &table.b, &k)?, h)?)
}

/// `sum_j weights[j] * k[j]` over the stages computed so far.
fn weighted_sum(
    state: &StateVector,
    weights: &[Real],
    k: &[StateVector],
) -> SimResult<StateVector> {
    let mut acc = state.zeros_like();
    for (&w, kj) in weights.iter().zip(k) {
        if w != 0.0 {
            acc = acc.add_scaled(kj, w)?;
        }
    }
    Ok(acc)
}
