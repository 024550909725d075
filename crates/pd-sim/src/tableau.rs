//! Butcher tableaux for explicit Runge-Kutta schemes.
//!
//! A tableau is plain data. It is checked by [`ButcherTable::validate`], which
//! the stepper and driver call before any stage is evaluated.

use pd_core::{Real, Tolerances, nearly_equal};

use crate::error::{SimError, SimResult};

/// Names accepted by [`ButcherTable::named`].
pub const BUILTIN_NAMES: [&str; 7] = [
    "euler", "midpoint", "heun", "ralston", "kutta3", "rk4", "rk38",
];

/// Coefficients `(a, b, c)` of an `s`-stage scheme.
///
/// `a[i][j]` weights stage `j` when forming the input of stage `i`; for an
/// explicit scheme it must be zero for every `j >= i`.
#[derive(Clone, Debug, PartialEq)]
pub struct ButcherTable {
    pub name: String,
    pub a: Vec<Vec<Real>>,
    pub b: Vec<Real>,
    pub c: Vec<Real>,
}

impl ButcherTable {
    pub fn new(name: impl Into<String>, a: Vec<Vec<Real>>, b: Vec<Real>, c: Vec<Real>) -> Self {
        Self {
            name: name.into(),
            a,
            b,
            c,
        }
    }

    /// Stage count `s` (length of `b`).
    pub fn stages(&self) -> usize {
        self.b.len()
    }

    /// Check dimensions, finiteness, and strict lower-triangularity of `a`.
    pub fn validate(&self) -> SimResult<()> {
        let s = self.stages();
        if s == 0 {
            return Err(malformed("table has no stages".to_string()));
        }
        if self.c.len() != s {
            return Err(malformed(format!(
                "c has {} entries but b has {s}",
                self.c.len()
            )));
        }
        if self.a.len() != s {
            return Err(malformed(format!("a has {} rows, expected {s}", self.a.len())));
        }
        for (i, row) in self.a.iter().enumerate() {
            if row.len() != s {
                return Err(malformed(format!(
                    "a row {i} has {} entries, expected {s}",
                    row.len()
                )));
            }
        }

        let mut entries = self.a.iter().flatten().chain(&self.b).chain(&self.c);
        if let Some(v) = entries.find(|v| !v.is_finite()) {
            return Err(malformed(format!("non-finite coefficient {v}")));
        }

        for (i, row) in self.a.iter().enumerate() {
            for (j, &v) in row.iter().enumerate().skip(i) {
                if v != 0.0 {
                    return Err(malformed(format!(
                        "a[{i}][{j}] = {v} is on or above the diagonal (implicit schemes are not supported)"
                    )));
                }
            }
        }

        for (i, (row, &ci)) in self.a.iter().zip(&self.c).enumerate() {
            let row_sum: Real = row.iter().sum();
            if !nearly_equal(row_sum, ci, Tolerances::default()) {
                tracing::warn!(
                    tableau = %self.name,
                    stage = i,
                    row_sum,
                    c = ci,
                    "row sum of a differs from node c"
                );
            }
        }

        Ok(())
    }

    /// Look up a built-in table by case-insensitive name.
    pub fn named(name: &str) -> SimResult<Self> {
        match name.to_ascii_lowercase().as_str() {
            "euler" => Ok(Self::euler()),
            "midpoint" => Ok(Self::midpoint()),
            "heun" => Ok(Self::heun()),
            "ralston" => Ok(Self::ralston()),
            "kutta3" => Ok(Self::kutta3()),
            "rk4" => Ok(Self::rk4()),
            "rk38" => Ok(Self::rk38()),
            _ => Err(SimError::InvalidArg {
                what: format!("unknown tableau '{name}' (known: {})", BUILTIN_NAMES.join(", ")),
            }),
        }
    }

    /// Forward Euler, order 1.
    pub fn euler() -> Self {
        Self::new("euler", vec![vec![0.0]], vec![1.0], vec![0.0])
    }

    /// Explicit midpoint, order 2.
    pub fn midpoint() -> Self {
        Self::new(
            "midpoint",
            vec![vec![0.0, 0.0], vec![0.5, 0.0]],
            vec![0.0, 1.0],
            vec![0.0, 0.5],
        )
    }

    /// Heun's method (explicit trapezoid), order 2.
    pub fn heun() -> Self {
        Self::new(
            "heun",
            vec![vec![0.0, 0.0], vec![1.0, 0.0]],
            vec![0.5, 0.5],
            vec![0.0, 1.0],
        )
    }

    /// Ralston's minimum-error second-order scheme.
    pub fn ralston() -> Self {
        Self::new(
            "ralston",
            vec![vec![0.0, 0.0], vec![2.0 / 3.0, 0.0]],
            vec![0.25, 0.75],
            vec![0.0, 2.0 / 3.0],
        )
    }

    /// Kutta's third-order scheme.
    pub fn kutta3() -> Self {
        Self::new(
            "kutta3",
            vec![
                vec![0.0, 0.0, 0.0],
                vec![0.5, 0.0, 0.0],
                vec![-1.0, 2.0, 0.0],
            ],
            vec![1.0 / 6.0, 2.0 / 3.0, 1.0 / 6.0],
            vec![0.0, 0.5, 1.0],
        )
    }

    /// Classical fourth-order Runge-Kutta.
    pub fn rk4() -> Self {
        Self::new(
            "rk4",
            vec![
                vec![0.0, 0.0, 0.0, 0.0],
                vec![0.5, 0.0, 0.0, 0.0],
                vec![0.0, 0.5, 0.0, 0.0],
                vec![0.0, 0.0, 1.0, 0.0],
            ],
            vec![1.0 / 6.0, 1.0 / 3.0, 1.0 / 3.0, 1.0 / 6.0],
            vec![0.0, 0.5, 0.5, 1.0],
        )
    }

    /// Kutta's 3/8 rule, order 4.
    pub fn rk38() -> Self {
        Self::new(
            "rk38",
            vec![
                vec![0.0, 0.0, 0.0, 0.0],
                vec![1.0 / 3.0, 0.0, 0.0, 0.0],
                vec![-1.0 / 3.0, 1.0, 0.0, 0.0],
                vec![1.0, -1.0, 1.0, 0.0],
            ],
            vec![1.0 / 8.0, 3.0 / 8.0, 3.0 / 8.0, 1.0 / 8.0],
            vec![0.0, 1.0 / 3.0, 2.0 / 3.0, 1.0],
        )
    }
}

fn malformed(what: String) -> SimError {
    SimError::MalformedTableau { what }
}
