//! Fixed-count trajectory driver and its recorded history.

use std::ops::ControlFlow;
use std::time::Instant;

use pd_core::{ParameterVector, Real, StateVector};

use crate::error::{SimError, SimResult};
use crate::integrator::{ExplicitRk, Integrator, check_step_size};
use crate::provider::DerivativeProvider;
use crate::tableau::ButcherTable;

/// Upper bound on the up-front history reservation; longer runs grow as they go.
const MAX_RESERVED_STATES: usize = 1 << 16;

/// Everything a run needs besides the derivative law.
#[derive(Clone, Debug, PartialEq)]
pub struct RunSpec {
    pub table: ButcherTable,
    pub initial_state: StateVector,
    pub params: ParameterVector,
    /// Fixed step size (seconds)
    pub h: Real,
    pub n_steps: usize,
}

impl RunSpec {
    pub fn run<P: DerivativeProvider + ?Sized>(&self, provider: &P) -> SimResult<History> {
        self.run_with_progress(provider, None)
    }

    pub fn run_with_progress<P: DerivativeProvider + ?Sized>(
        &self,
        provider: &P,
        progress: Option<&mut dyn FnMut(&SimProgress) -> ControlFlow<()>>,
    ) -> SimResult<History> {
        run_with_progress(
            &self.table,
            provider,
            &self.initial_state,
            &self.params,
            self.h,
            self.n_steps,
            progress,
        )
    }
}

/// Progress snapshot reported after every completed step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimProgress {
    pub step: usize,
    pub n_steps: usize,
    /// Simulated time reached (seconds)
    pub time_s: Real,
}

impl SimProgress {
    pub fn fraction_complete(&self) -> f64 {
        if self.n_steps == 0 {
            1.0
        } else {
            self.step as f64 / self.n_steps as f64
        }
    }
}

/// Ordered states of one trajectory: index 0 is the initial state, index `n`
/// the state after `n` steps. Never empty.
#[derive(Clone, Debug, PartialEq)]
pub struct History {
    h: Real,
    states: Vec<StateVector>,
}

impl History {
    /// Step size the history was produced with.
    pub fn h(&self) -> Real {
        self.h
    }

    /// Number of snapshots (`n_steps + 1`).
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn n_steps(&self) -> usize {
        self.states.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<&StateVector> {
        self.states.get(index)
    }

    pub fn initial(&self) -> &StateVector {
        &self.states[0]
    }

    pub fn last(&self) -> &StateVector {
        &self.states[self.states.len() - 1]
    }

    pub fn states(&self) -> &[StateVector] {
        &self.states
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StateVector> {
        self.states.iter()
    }

    /// Simulated time of each snapshot, `i * h`.
    pub fn times(&self) -> impl Iterator<Item = Real> + '_ {
        (0..self.states.len()).map(|i| i as Real * self.h)
    }

    pub fn into_states(self) -> Vec<StateVector> {
        self.states
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = &'a StateVector;
    type IntoIter = std::slice::Iter<'a, StateVector>;

    fn into_iter(self) -> Self::IntoIter {
        self.states.iter()
    }
}

/// Run `n_steps` explicit RK steps from `initial_state`.
pub fn run<P: DerivativeProvider + ?Sized>(
    table: &ButcherTable,
    provider: &P,
    initial_state: &StateVector,
    params: &ParameterVector,
    h: Real,
    n_steps: usize,
) -> SimResult<History> {
    run_with_progress(table, provider, initial_state, params, h, n_steps, None)
}

/// Like [`run`], reporting progress after each step.
///
/// Returning `ControlFlow::Break` from the callback cancels the run with
/// [`SimError::Cancelled`]. A failed or cancelled run returns no history.
pub fn run_with_progress<P: DerivativeProvider + ?Sized>(
    table: &ButcherTable,
    provider: &P,
    initial_state: &StateVector,
    params: &ParameterVector,
    h: Real,
    n_steps: usize,
    mut progress: Option<&mut dyn FnMut(&SimProgress) -> ControlFlow<()>>,
) -> SimResult<History> {
    let integrator = ExplicitRk::new(table.clone())?;
    check_step_size(h)?;

    tracing::debug!(
        tableau = %table.name,
        stages = table.stages(),
        h,
        n_steps,
        "starting run"
    );
    let started = Instant::now();

    let mut states = Vec::with_capacity(n_steps.min(MAX_RESERVED_STATES) + 1);
    states.push(initial_state.clone());

    let mut current = initial_state.clone();
    let mut reported_non_finite = false;
    for step in 1..=n_steps {
        current = integrator.step(provider, &current, params, h)?;

        if !reported_non_finite && !current.is_finite() {
            tracing::warn!(step, state = %current, "state is no longer finite");
            reported_non_finite = true;
        }
        states.push(current.clone());

        if let Some(callback) = progress.as_deref_mut() {
            let snapshot = SimProgress {
                step,
                n_steps,
                time_s: step as Real * h,
            };
            if callback(&snapshot).is_break() {
                tracing::debug!(step, "run cancelled");
                return Err(SimError::Cancelled { step });
            }
        }
    }

    tracing::debug!(
        n_steps,
        elapsed_s = started.elapsed().as_secs_f64(),
        "run finished"
    );

    Ok(History { h, states })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xy(x: Real, y: Real) -> StateVector {
        StateVector::new([("x", x), ("y", y)]).unwrap()
    }

    fn no_params() -> ParameterVector {
        ParameterVector::new([("unused", 0.0)]).unwrap()
    }

    fn still(state: &StateVector, _: &ParameterVector) -> SimResult<StateVector> {
        Ok(state.zeros_like())
    }

    fn rotate(state: &StateVector, _: &ParameterVector) -> SimResult<StateVector> {
        Ok(xy(-state.field("y")?, state.field("x")?))
    }

    #[test]
    fn zero_derivative_keeps_initial_state() {
        let initial = xy(3.0, -1.5);
        for table in [ButcherTable::euler(), ButcherTable::rk4(), ButcherTable::kutta3()] {
            let history = run(&table, &still, &initial, &no_params(), 0.25, 7).unwrap();
            assert_eq!(history.len(), 8);
            assert!(history.iter().all(|s| *s == initial));
        }
    }

    #[test]
    fn zero_steps_yields_only_initial_state() {
        let initial = xy(1.0, 0.0);
        let history = run(&ButcherTable::rk4(), &rotate, &initial, &no_params(), 0.1, 0).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history.n_steps(), 0);
        assert_eq!(history.initial(), &initial);
        assert_eq!(history.last(), &initial);
    }

    #[test]
    fn each_step_consumes_the_previous_result() {
        let initial = xy(1.0, 0.0);
        let params = no_params();
        let table = ButcherTable::rk4();
        let history = run(&table, &rotate, &initial, &params, 0.1, 5).unwrap();

        let mut expected = initial.clone();
        for (i, state) in history.iter().enumerate().skip(1) {
            expected = single_step_ref(&table, &expected, &params);
            assert_eq!(state, &expected, "step {i}");
        }
    }

    fn single_step_ref(table: &ButcherTable, s: &StateVector, p: &ParameterVector) -> StateVector {
        crate::integrator::single_step(table, &rotate, s, p, 0.1).unwrap()
    }

    #[test]
    fn rotation_stays_on_unit_circle() {
        let history = run(&ButcherTable::rk4(), &rotate, &xy(1.0, 0.0), &no_params(), 0.01, 628)
            .unwrap();
        let end = history.last();
        let radius = end.field("x").unwrap().hypot(end.field("y").unwrap());
        assert!((radius - 1.0).abs() < 1e-9);
    }

    #[test]
    fn times_follow_step_size() {
        let history = run(&ButcherTable::euler(), &still, &xy(0.0, 0.0), &no_params(), 0.5, 3)
            .unwrap();
        let times: Vec<Real> = history.times().collect();
        assert_eq!(times, vec![0.0, 0.5, 1.0, 1.5]);
        assert_eq!(history.h(), 0.5);
    }

    #[test]
    fn failing_provider_aborts_run() {
        let fails_late = |s: &StateVector, _: &ParameterVector| -> SimResult<StateVector> {
            if s.field("x")? > 2.0 {
                return Err(SimError::NumericDomain {
                    what: "x out of range".to_string(),
                });
            }
            Ok(xy(1.0, 0.0))
        };
        let result = run(&ButcherTable::euler(), &fails_late, &xy(0.0, 0.0), &no_params(), 1.0, 10);
        assert!(matches!(result, Err(SimError::NumericDomain { .. })));
    }

    #[test]
    fn malformed_table_fails_before_any_step() {
        let mut table = ButcherTable::midpoint();
        table.a[0][0] = 0.1;
        let result = run(&table, &still, &xy(0.0, 0.0), &no_params(), 0.1, 3);
        assert!(matches!(result, Err(SimError::MalformedTableau { .. })));
    }

    #[test]
    fn progress_reports_every_step() {
        let mut seen = Vec::new();
        let mut callback = |p: &SimProgress| -> ControlFlow<()> {
            seen.push((p.step, p.fraction_complete()));
            ControlFlow::Continue(())
        };
        run_with_progress(
            &ButcherTable::rk4(),
            &still,
            &xy(0.0, 0.0),
            &no_params(),
            0.1,
            4,
            Some(&mut callback),
        )
        .unwrap();
        assert_eq!(seen, vec![(1, 0.25), (2, 0.5), (3, 0.75), (4, 1.0)]);
    }

    #[test]
    fn callback_can_cancel() {
        let mut callback = |p: &SimProgress| -> ControlFlow<()> {
            if p.step == 3 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        };
        let result = run_with_progress(
            &ButcherTable::rk4(),
            &still,
            &xy(0.0, 0.0),
            &no_params(),
            0.1,
            10,
            Some(&mut callback),
        );
        assert!(matches!(result, Err(SimError::Cancelled { step: 3 })));
    }

    #[test]
    fn huge_step_count_starts_without_reserving_it() {
        let mut callback = |_: &SimProgress| -> ControlFlow<()> { ControlFlow::Break(()) };
        let result = run_with_progress(
            &ButcherTable::euler(),
            &still,
            &xy(0.0, 0.0),
            &no_params(),
            0.1,
            usize::MAX,
            Some(&mut callback),
        );
        assert!(matches!(result, Err(SimError::Cancelled { step: 1 })));
    }

    #[test]
    fn run_spec_matches_free_function() {
        let spec = RunSpec {
            table: ButcherTable::heun(),
            initial_state: xy(1.0, 0.0),
            params: no_params(),
            h: 0.05,
            n_steps: 20,
        };
        let a = spec.run(&rotate).unwrap();
        let b = run(&spec.table, &rotate, &spec.initial_state, &spec.params, 0.05, 20).unwrap();
        assert_eq!(a, b);
    }
}
