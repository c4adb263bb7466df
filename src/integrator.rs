// hji_core - Core numerical engine for time-dependent Hamilton-Jacobi-Isaacs PDEs

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! The CFL-constrained TVD Runge-Kutta time integrator.

use std::marker::PhantomData;

use crate::error::{NumericalError, SolveError};
use crate::grid::PhiField;
use crate::ode::{ExplicitPdeSolver, PdeIVP, StopCondition};
use crate::scheme_data::Accuracy;

/// TVD Runge-Kutta order, matched to [`Accuracy`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RkOrder {
    One,
    Two,
    Three,
}

impl RkOrder {
    pub fn from_accuracy(accuracy: Accuracy) -> Self {
        match accuracy {
            Accuracy::Low => RkOrder::One,
            Accuracy::Medium => RkOrder::Two,
            Accuracy::High => RkOrder::Three,
            Accuracy::VeryHigh => RkOrder::Three,
        }
    }
}

/// Options controlling how the integrator proposes and accepts steps.
#[derive(Clone, Debug)]
pub struct IntegratorOptions {
    pub factor_cfl: f64,
    pub max_step: f64,
    pub single_step: bool,
    pub stats: bool,
    pub max_cfl_retries: usize,
}

impl Default for IntegratorOptions {
    fn default() -> Self {
        IntegratorOptions {
            factor_cfl: 0.8,
            max_step: f64::INFINITY,
            single_step: false,
            stats: false,
            max_cfl_retries: 10,
        }
    }
}

/// Step-acceptance bookkeeping, returned when `IntegratorOptions::stats` is
/// enabled.
#[derive(Clone, Copy, Debug, Default)]
pub struct StepStats {
    pub accepted: usize,
    pub rejected: usize,
}

/// A single accepted macro-step's outcome.
pub struct StepOutcome {
    pub t: f64,
    pub y: PhiField,
    pub stats: StepStats,
}

/// CFL tolerance slack: a step whose realized `dt` exceeds
/// `factorCFL * stepBound` by less than this fraction is still accepted.
const CFL_TOLERANCE: f64 = 1e-9;

/// Drives a [`PdeIVP`] forward in time with CFL-constrained TVD RK stepping.
pub struct Integrator<P: PdeIVP> {
    pub order: RkOrder,
    pub options: IntegratorOptions,
    _problem: PhantomData<P>,
}

impl<P: PdeIVP> Integrator<P> {
    pub fn new(order: RkOrder, options: IntegratorOptions) -> Self {
        Integrator {
            order,
            options,
            _problem: PhantomData,
        }
    }

    /// One macro-step from `t_now` toward (but not past) `t_target`,
    /// Proposes `dt`, takes an RK stage, and if the realized CFL bound is
    /// violated, halves `dt` and retries up to `max_cfl_retries` times.
    pub fn step(
        &self,
        t_now: f64,
        t_target: f64,
        phi: &PhiField,
        mut rhs_fn: impl FnMut(f64, &PhiField) -> Result<(Vec<f64>, f64), SolveError>,
    ) -> Result<StepOutcome, SolveError> {
        let (ydot0, step_bound0) = rhs_fn(t_now, phi)?;
        let mut dt = (self.options.factor_cfl * step_bound0).min(t_target - t_now).min(self.options.max_step);
        let mut stats = StepStats::default();

        loop {
            let (y1, min_step_bound) = self.rk_stage(t_now, phi, dt, &ydot0, step_bound0, &mut rhs_fn)?;
            let realized_cfl_ok = dt <= self.options.factor_cfl * min_step_bound * (1.0 + CFL_TOLERANCE);
            if realized_cfl_ok {
                stats.accepted += 1;
                tracing::debug!(t_now, dt, "CFL step accepted");
                return Ok(StepOutcome {
                    t: t_now + dt,
                    y: y1,
                    stats,
                });
            }
            stats.rejected += 1;
            tracing::debug!(t_now, dt, min_step_bound, "CFL step rejected, shrinking dt");
            if stats.rejected > self.options.max_cfl_retries {
                return Err(NumericalError::CflRetriesExhausted {
                    t_now,
                    retries: stats.rejected,
                    dt,
                    last_good: Box::new(phi.clone()),
                }
                .into());
            }
            dt *= 0.5;
        }
    }

    fn rk_stage(
        &self,
        t0: f64,
        y0: &PhiField,
        dt: f64,
        ydot0: &[f64],
        step_bound0: f64,
        rhs_fn: &mut impl FnMut(f64, &PhiField) -> Result<(Vec<f64>, f64), SolveError>,
    ) -> Result<(PhiField, f64), SolveError> {
        let shape = y0.shape().to_vec();
        match self.order {
            RkOrder::One => {
                let y1 = lincomb(&shape, &[(1.0, y0.as_slice()), (dt, ydot0)]);
                Ok((y1, step_bound0))
            }
            RkOrder::Two => {
                let y_s1 = lincomb(&shape, &[(1.0, y0.as_slice()), (dt, ydot0)]);
                let (ydot1, sb1) = rhs_fn(t0 + dt, &y_s1)?;
                let y1 = lincomb(&shape, &[(0.5, y0.as_slice()), (0.5, y_s1.as_slice()), (0.5 * dt, &ydot1)]);
                Ok((y1, step_bound0.min(sb1)))
            }
            RkOrder::Three => {
                let y_s1 = lincomb(&shape, &[(1.0, y0.as_slice()), (dt, ydot0)]);
                let (ydot1, sb1) = rhs_fn(t0 + dt, &y_s1)?;
                let y_s2 = lincomb(&shape, &[(0.75, y0.as_slice()), (0.25, y_s1.as_slice()), (0.25 * dt, &ydot1)]);
                let (ydot2, sb2) = rhs_fn(t0 + 0.5 * dt, &y_s2)?;
                let y1 = lincomb(
                    &shape,
                    &[(1.0 / 3.0, y0.as_slice()), (2.0 / 3.0, y_s2.as_slice()), (2.0 / 3.0 * dt, &ydot2)],
                );
                Ok((y1, step_bound0.min(sb1).min(sb2)))
            }
        }
    }
}

impl<P: PdeIVP> ExplicitPdeSolver for Integrator<P> {
    type Problem = P;

    fn integrate(&mut self, p: &mut P) -> Result<(), SolveError> {
        let (mut t, mut y) = p.initial_state();
        if let StopCondition::Stop = p.end_step(t, &y) {
            p.final_state(t, y);
            return Ok(());
        }

        while let Some(t_target) = p.next_target(t) {
            loop {
                let outcome = self.step(t, t_target, &y, |t, y| p.rhs(t, y))?;
                t = outcome.t;
                y = outcome.y;
                match p.end_step(t, &y) {
                    StopCondition::Stop => {
                        p.final_state(t, y);
                        return Ok(());
                    }
                    StopCondition::ContinueUntil(bound) if t >= bound => break,
                    _ => {}
                }
                if self.options.single_step || t >= t_target - CFL_TOLERANCE {
                    break;
                }
            }
        }
        p.final_state(t, y);
        Ok(())
    }
}

/// `sum_k coeffs[k].0 * coeffs[k].1[i]`, a flat linear combination of
/// same-shape fields. Used for every RK stage update.
fn lincomb(shape: &[usize], terms: &[(f64, &[f64])]) -> PhiField {
    let len = terms[0].1.len();
    let mut out = vec![0.0; len];
    for (coeff, data) in terms {
        for (o, v) in out.iter_mut().zip(data.iter()) {
            *o += coeff * v;
        }
    }
    PhiField::new(out, shape.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::BoundaryCondition;
    use crate::grid::{Grid, GridSpec};

    #[test]
    fn rk1_euler_matches_hand_computation() {
        let grid = Grid::from_spec(GridSpec::new(1).n(vec![4]).bdry(vec![BoundaryCondition::Periodic])).unwrap();
        let phi = PhiField::new(vec![1.0, 2.0, 3.0, 4.0], grid.shape().to_vec());
        let integrator: Integrator<DummyProblem> = Integrator::new(RkOrder::One, IntegratorOptions::default());
        let outcome = integrator
            .step(0.0, 1.0, &phi, |_t, y| Ok((vec![1.0; y.len()], 10.0)))
            .unwrap();
        assert!((outcome.t - 1.0).abs() < 1e-12);
        assert_eq!(outcome.y.as_slice(), &[2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn cfl_retry_shrinks_dt_until_accepted() {
        let grid = Grid::from_spec(GridSpec::new(1).n(vec![4]).bdry(vec![BoundaryCondition::Periodic])).unwrap();
        let phi = PhiField::new(vec![0.0, 0.0, 0.0, 0.0], grid.shape().to_vec());
        let integrator: Integrator<DummyProblem> = Integrator::new(RkOrder::One, IntegratorOptions::default());
        // stepBound is tiny relative to the requested macro-step, so the
        // very first proposal should already satisfy CFL (since dt is
        // proposed *from* stepBound); assert no retries are needed and the
        // step obeys factorCFL * stepBound.
        let outcome = integrator.step(0.0, 100.0, &phi, |_t, y| Ok((vec![0.0; y.len()], 0.01))).unwrap();
        assert!(outcome.t <= 0.8 * 0.01 + 1e-9);
        assert_eq!(outcome.stats.rejected, 0);
    }

    #[test]
    fn cfl_retry_emits_debug_logs_under_a_subscriber() {
        // Library code never installs a global subscriber; this confirms the
        // tracing calls in `step` don't panic when one is actually present.
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let grid = Grid::from_spec(GridSpec::new(1).n(vec![4]).bdry(vec![BoundaryCondition::Periodic])).unwrap();
        let phi = PhiField::new(vec![0.0, 0.0, 0.0, 0.0], grid.shape().to_vec());
        let integrator: Integrator<DummyProblem> = Integrator::new(RkOrder::One, IntegratorOptions::default());
        let outcome = integrator.step(0.0, 1.0, &phi, |_t, y| Ok((vec![0.0; y.len()], 0.1))).unwrap();
        assert!(outcome.t > 0.0);
    }

    struct DummyProblem;
    impl PdeIVP for DummyProblem {
        fn rhs(&mut self, _t: f64, y: &PhiField) -> Result<(Vec<f64>, f64), SolveError> {
            Ok((vec![0.0; y.len()], 1.0))
        }
        fn initial_state(&mut self) -> (f64, PhiField) {
            (0.0, PhiField::zeros(vec![1]))
        }
        fn next_target(&mut self, _t_now: f64) -> Option<f64> {
            None
        }
        fn end_step(&mut self, _t: f64, _y: &PhiField) -> StopCondition {
            StopCondition::Continue
        }
        fn final_state(&mut self, _t: f64, _y: PhiField) {}
    }
}
