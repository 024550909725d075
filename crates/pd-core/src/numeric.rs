use crate::{CoreError, CoreResult, StateVector};

/// Floating point type used throughout system
pub type Real = f64;

/// One tolerance for everything
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

/// Fieldwise `nearly_equal`. Vectors of different shape are an error, not `false`.
pub fn nearly_equal_states(a: &StateVector, b: &StateVector, tol: Tolerances) -> CoreResult<bool> {
    a.check_shape(b)?;
    Ok(a
        .values()
        .iter()
        .zip(b.values())
        .all(|(&x, &y)| nearly_equal(x, y, tol)))
}

pub fn ensure_finite(v: Real, what: &str) -> CoreResult<Real> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite {
            what: what.to_string(),
            value: v,
        })
    }
}
