//! Read-only physical constants handed to derivative providers.

use crate::{CoreResult, Real, StateVector};

/// Same storage as [`StateVector`], but exposes lookups only.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct ParameterVector(StateVector);

impl ParameterVector {
    pub fn new<I, K>(fields: I) -> CoreResult<Self>
    where
        I: IntoIterator<Item = (K, Real)>,
        K: Into<String>,
    {
        StateVector::new(fields).map(Self)
    }

    pub fn get(&self, name: &str) -> Option<Real> {
        self.0.get(name)
    }

    pub fn field(&self, name: &str) -> CoreResult<Real> {
        self.0.field(name)
    }

    pub fn keys(&self) -> &[String] {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Real)> + '_ {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_finite(&self) -> bool {
        self.0.is_finite()
    }
}

impl From<StateVector> for ParameterVector {
    fn from(values: StateVector) -> Self {
        Self(values)
    }
}
