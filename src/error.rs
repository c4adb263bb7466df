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

//! Error taxonomy for the HJI core: [`GridError`] for grid normalization,
//! [`ContractError`] for interface violations between components,
//! [`NumericalError`] for failures of the PDE itself, and [`SolveError`]
//! as the top-level enum returned by [`crate::driver::solve`].

use crate::grid::PhiField;

/// Inconsistent or invalid grid specification.
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    #[error("grid dimension must be positive (got {0})")]
    NonPositiveDimension(i64),
    #[error("axis {axis}: max ({max}) must be strictly greater than min ({min})")]
    MinNotLessThanMax { axis: usize, min: f64, max: f64 },
    #[error("axis {axis}: N must be at least 2 (got {n})")]
    TooFewPoints { axis: usize, n: usize },
    #[error("axis {axis}: dx must be strictly positive (got {dx})")]
    NonPositiveSpacing { axis: usize, dx: f64 },
    #[error(
        "axis {axis}: N ({n}) and dx ({dx}) are inconsistent with min/max \
         (expected dx ~= {expected_dx}, difference {diff} exceeds tolerance {tol})"
    )]
    InconsistentNAndDx {
        axis: usize,
        n: usize,
        dx: f64,
        expected_dx: f64,
        diff: f64,
        tol: f64,
    },
    #[error("axis {axis}: coordinate vector is not strictly increasing at index {index}")]
    NonMonotoneAxis { axis: usize, index: usize },
    #[error("per-axis field {field} has length {got}, expected {expected} (== dim)")]
    WrongAxisCount {
        field: &'static str,
        expected: usize,
        got: usize,
    },
}

/// A component violated the interface contract of its caller.
#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    #[error("boundary operator on axis {axis} returned {got} entries, expected {expected}")]
    BadPadWidth {
        axis: usize,
        expected: usize,
        got: usize,
    },
    #[error("Hamiltonian {what} returned {got} values, expected {expected} (grid cell count)")]
    WrongHamiltonianShape {
        what: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("inner-term list has {got} entries, data list has {expected}")]
    InnerTermLengthMismatch { expected: usize, got: usize },
}

/// A failure of the numerical scheme itself: NaN/Inf, a negative step bound,
/// or CFL retry exhaustion.
///
/// Carries enough state (`t_now`, the offending flat cell index, and the
/// last good field) that the driver can checkpoint instead of discarding
/// the partial solve.
#[derive(Debug, thiserror::Error)]
pub enum NumericalError {
    #[error("non-finite value in right-hand side at t={t_now}, cell {cell}")]
    NonFiniteRhs {
        t_now: f64,
        cell: usize,
        last_good: Box<PhiField>,
    },
    #[error("non-finite value in derivative at t={t_now}, axis {axis}, cell {cell}")]
    NonFiniteDeriv {
        t_now: f64,
        axis: usize,
        cell: usize,
        last_good: Box<PhiField>,
    },
    #[error("negative CFL step bound ({step_bound}) at t={t_now}")]
    NegativeStepBound {
        t_now: f64,
        step_bound: f64,
        last_good: Box<PhiField>,
    },
    #[error("CFL retries exhausted ({retries}) at t={t_now}, dt shrunk to {dt}")]
    CflRetriesExhausted {
        t_now: f64,
        retries: usize,
        dt: f64,
        last_good: Box<PhiField>,
    },
}

impl NumericalError {
    /// The time at which the failure was detected, for driver-side
    /// checkpointing.
    pub fn t_now(&self) -> f64 {
        match self {
            NumericalError::NonFiniteRhs { t_now, .. }
            | NumericalError::NonFiniteDeriv { t_now, .. }
            | NumericalError::NegativeStepBound { t_now, .. }
            | NumericalError::CflRetriesExhausted { t_now, .. } => *t_now,
        }
    }

    /// The last successfully-integrated field, for driver-side
    /// checkpointing.
    pub fn last_good(&self) -> &PhiField {
        match self {
            NumericalError::NonFiniteRhs { last_good, .. }
            | NumericalError::NonFiniteDeriv { last_good, .. }
            | NumericalError::NegativeStepBound { last_good, .. }
            | NumericalError::CflRetriesExhausted { last_good, .. } => last_good,
        }
    }
}

/// An argument given to [`crate::driver::solve`] was malformed or
/// inconsistent.
#[derive(Debug, thiserror::Error)]
pub enum SpecificationError {
    #[error("tau must have length >= 2 (got {0})")]
    TauTooShort(usize),
    #[error("tau must be strictly monotone, violated at index {0}")]
    TauNotMonotone(usize),
    #[error("initial data shape {got:?} does not match grid shape {expected:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },
    #[error("unrecognized option string: {0}")]
    UnknownOption(String),
    #[error("targetFunction is required for compMethod {0}")]
    MissingTargetFunction(&'static str),
    #[error("grid: {0}")]
    Grid(#[from] GridError),
}

/// Top-level error type returned by [`crate::driver::solve`].
#[derive(Debug, thiserror::Error)]
pub enum SolveError {
    #[error("specification error: {0}")]
    Specification(#[from] SpecificationError),
    #[error("contract error: {0}")]
    Contract(#[from] ContractError),
    #[error("numerical error: {0}")]
    Numerical(#[from] NumericalError),
    #[error("computation cancelled after {completed} of {requested} steps")]
    Cancelled {
        completed: usize,
        requested: usize,
    },
}
