//! Rate-of-change laws consumed by the stepper.

use pd_core::{ParameterVector, StateVector};

use crate::error::SimResult;

/// Maps `(state, params)` to the time derivative of `state`.
///
/// The returned vector must have the same key set as `state`. Implementations
/// are evaluated several times per step at intermediate stage states, so the
/// result must depend on the two arguments only; `&self` keeps providers from
/// accumulating state between calls.
///
/// Guards against known degeneracies (e.g. a vanishing radius) belong here,
/// not in the stepper. Inputs the law cannot handle at all should be reported
/// as [`SimError::NumericDomain`](crate::SimError::NumericDomain).
pub trait DerivativeProvider {
    fn derivative(&self, state: &StateVector, params: &ParameterVector)
    -> SimResult<StateVector>;
}

impl<F> DerivativeProvider for F
where
    F: Fn(&StateVector, &ParameterVector) -> SimResult<StateVector>,
{
    fn derivative(
        &self,
        state: &StateVector,
        params: &ParameterVector,
    ) -> SimResult<StateVector> {
        self(state, params)
    }
}
