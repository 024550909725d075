//! Named-field state vector with checked elementwise algebra.

use core::fmt;
use std::sync::Arc;

use crate::{CoreError, CoreResult, Real};

/// A fixed set of named `f64` fields.
///
/// - Field names are kept sorted, so the shape does not depend on construction order.
/// - The key set is shared between values derived from one another (`Arc`), so
///   algebra on same-shape vectors only copies the numbers.
/// - Every operation returns a new vector; nothing is mutated in place.
#[derive(Clone, Debug, PartialEq)]
pub struct StateVector {
    keys: Arc<[String]>,
    values: Vec<Real>,
}

impl StateVector {
    /// Build a vector from `(name, value)` pairs. Duplicate names are rejected.
    pub fn new<I, K>(fields: I) -> CoreResult<Self>
    where
        I: IntoIterator<Item = (K, Real)>,
        K: Into<String>,
    {
        let mut pairs: Vec<(String, Real)> = fields
            .into_iter()
            .map(|(name, value)| (name.into(), value))
            .collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));

        if let Some(dup) = pairs.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(CoreError::DuplicateField {
                name: dup[0].0.clone(),
            });
        }

        let (keys, values): (Vec<String>, Vec<Real>) = pairs.into_iter().unzip();
        Ok(Self {
            keys: keys.into(),
            values,
        })
    }

    /// Same key set, every field zero.
    pub fn zeros_like(&self) -> Self {
        Self {
            keys: Arc::clone(&self.keys),
            values: vec![0.0; self.values.len()],
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Field names in canonical (sorted) order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Field values, aligned with [`keys`](Self::keys).
    pub fn values(&self) -> &[Real] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Real)> + '_ {
        self.keys
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }

    pub fn get(&self, name: &str) -> Option<Real> {
        self.position(name).map(|i| self.values[i])
    }

    /// Like [`get`](Self::get) but a missing name is an error.
    pub fn field(&self, name: &str) -> CoreResult<Real> {
        self.get(name).ok_or_else(|| CoreError::MissingField {
            name: name.to_string(),
        })
    }

    pub fn same_shape(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.keys, &other.keys) || self.keys == other.keys
    }

    pub fn check_shape(&self, other: &Self) -> CoreResult<()> {
        if self.same_shape(other) {
            Ok(())
        } else {
            Err(CoreError::ShapeMismatch {
                left: self.keys.to_vec(),
                right: other.keys.to_vec(),
            })
        }
    }

    pub fn is_finite(&self) -> bool {
        self.values.iter().all(|v| v.is_finite())
    }

    /// `self + other`
    pub fn add(&self, other: &Self) -> CoreResult<Self> {
        self.zip_with(other, |a, b| a + b)
    }

    /// `self - other`
    pub fn sub(&self, other: &Self) -> CoreResult<Self> {
        self.zip_with(other, |a, b| a - b)
    }

    /// `factor * self`
    pub fn scale(&self, factor: Real) -> Self {
        Self {
            keys: Arc::clone(&self.keys),
            values: self.values.iter().map(|v| v * factor).collect(),
        }
    }

    /// `self + factor * other` in a single pass.
    pub fn add_scaled(&self, other: &Self, factor: Real) -> CoreResult<Self> {
        self.zip_with(other, |a, b| a + factor * b)
    }

    fn zip_with(&self, other: &Self, op: impl Fn(Real, Real) -> Real) -> CoreResult<Self> {
        self.check_shape(other)?;
        Ok(Self {
            keys: Arc::clone(&self.keys),
            values: self
                .values
                .iter()
                .zip(&other.values)
                .map(|(&a, &b)| op(a, b))
                .collect(),
        })
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.keys.binary_search_by(|k| k.as_str().cmp(name)).ok()
    }
}

impl fmt::Display for StateVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, value)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}: {value}")?;
        }
        write!(f, "}}")
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for StateVector {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, &value)?;
        }
        map.end()
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for StateVector {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let fields = std::collections::BTreeMap::<String, Real>::deserialize(deserializer)?;
        Self::new(fields).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn xy(x: Real, y: Real) -> StateVector {
        StateVector::new([("x", x), ("y", y)]).unwrap()
    }

    #[test]
    fn construction_order_does_not_matter() {
        let a = StateVector::new([("y", 2.0), ("x", 1.0)]).unwrap();
        let b = xy(1.0, 2.0);
        assert_eq!(a, b);
        assert_eq!(a.keys(), ["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn duplicate_field_rejected() {
        let err = StateVector::new([("x", 1.0), ("x", 2.0)]).unwrap_err();
        assert_eq!(
            err,
            CoreError::DuplicateField {
                name: "x".to_string()
            }
        );
    }

    #[test]
    fn add_and_scale() {
        let sum = xy(1.0, 2.0).add(&xy(0.5, -1.0)).unwrap();
        assert_eq!(sum.get("x"), Some(1.5));
        assert_eq!(sum.get("y"), Some(1.0));

        let scaled = xy(1.0, -2.0).scale(3.0);
        assert_eq!(scaled.values(), &[3.0, -6.0]);
    }

    #[test]
    fn add_scaled_matches_add_of_scale() {
        let a = xy(1.0, 2.0);
        let b = xy(0.25, -4.0);
        let fused = a.add_scaled(&b, 0.1).unwrap();
        let split = a.add(&b.scale(0.1)).unwrap();
        assert_eq!(fused, split);
    }

    #[test]
    fn mismatched_keys_are_rejected() {
        let a = xy(1.0, 2.0);
        let b = StateVector::new([("x", 1.0), ("z", 2.0)]).unwrap();

        for result in [a.add(&b), a.sub(&b), a.add_scaled(&b, 2.0)] {
            match result {
                Err(CoreError::ShapeMismatch { left, right }) => {
                    assert_eq!(left, vec!["x", "y"]);
                    assert_eq!(right, vec!["x", "z"]);
                }
                other => panic!("expected ShapeMismatch, got {other:?}"),
            }
        }
    }

    #[test]
    fn copies_are_independent() {
        let original = xy(1.0, 2.0);
        let mut copy = original.clone();
        copy = copy.scale(10.0);
        assert_eq!(original.values(), &[1.0, 2.0]);
        assert_eq!(copy.values(), &[10.0, 20.0]);
    }

    #[test]
    fn field_lookup() {
        let v = xy(1.0, 2.0);
        assert_eq!(v.field("y").unwrap(), 2.0);
        assert!(matches!(
            v.field("vx"),
            Err(CoreError::MissingField { name }) if name == "vx"
        ));
    }

    #[test]
    fn zeros_like_keeps_shape() {
        let z = xy(3.0, 4.0).zeros_like();
        assert!(z.same_shape(&xy(0.0, 0.0)));
        assert_eq!(z.values(), &[0.0, 0.0]);
    }

    #[test]
    fn finiteness() {
        assert!(xy(1.0, 2.0).is_finite());
        assert!(!xy(Real::NAN, 2.0).is_finite());
        assert!(!xy(1.0, Real::INFINITY).is_finite());
    }

    #[test]
    fn display_lists_fields_in_order() {
        assert_eq!(xy(1.0, 2.5).to_string(), "{x: 1, y: 2.5}");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serializes_as_map() {
        let v = xy(1.0, 2.0);
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, r#"{"x":1.0,"y":2.0}"#);
        let back: StateVector = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
    }

    proptest! {
        #[test]
        fn add_commutes(a in -1e6f64..1e6, b in -1e6f64..1e6, c in -1e6f64..1e6, d in -1e6f64..1e6) {
            let u = xy(a, b);
            let v = xy(c, d);
            prop_assert_eq!(u.add(&v).unwrap(), v.add(&u).unwrap());
        }

        #[test]
        fn sub_undoes_add(a in -1e3f64..1e3, b in -1e3f64..1e3, c in -1e3f64..1e3, d in -1e3f64..1e3) {
            let u = xy(a, b);
            let v = xy(c, d);
            let back = u.add(&v).unwrap().sub(&v).unwrap();
            for (x, y) in back.values().iter().zip(u.values()) {
                prop_assert!((x - y).abs() <= 1e-9);
            }
        }
    }
}
