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

//! A small solver/problem trait pair separating "the numerical integrator"
//! from "the problem being integrated", for a CFL-constrained PDE
//! right-hand side instead of a plain `y'=f(t,y)` ODE: `rhs` also reports a
//! stability bound, and the problem drives its own target-time schedule
//! (`tau`) instead of integrating without bound.

use crate::error::SolveError;
use crate::grid::PhiField;

/// Stop condition for integration.
pub enum StopCondition {
    Continue,
    ContinueUntil(f64),
    Stop,
}

/// A time-dependent PDE initial value problem driven by an
/// [`crate::integrator::Integrator`]. Has no generic solver-state
/// parameter, since the only solver state worth exposing
/// (accepted/rejected step counts) is already carried on
/// [`crate::integrator::StepStats`] and surfaced by `final_state`.
pub trait PdeIVP {
    /// Right-hand side `(ydot, stepBound)` at `(t, y)`.
    fn rhs(&mut self, t: f64, y: &PhiField) -> Result<(Vec<f64>, f64), SolveError>;

    /// Initial `(t_0, y_0)`.
    fn initial_state(&mut self) -> (f64, PhiField);

    /// Next macro-step target time strictly greater than `t_now`, or `None`
    /// once the schedule (`tau`) is exhausted.
    fn next_target(&mut self, t_now: f64) -> Option<f64>;

    /// Called after each accepted macro-step (and once for `t_0`).
    fn end_step(&mut self, t: f64, y: &PhiField) -> StopCondition;

    /// Called once integration has stopped, with the final accepted state.
    fn final_state(&mut self, t: f64, y: PhiField);
}

/// A minimal interface for an explicit solver for [`PdeIVP`]s.
pub trait ExplicitPdeSolver: Sized {
    type Problem: PdeIVP;

    fn integrate(&mut self, p: &mut Self::Problem) -> Result<(), SolveError>;
}
