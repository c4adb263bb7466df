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

//! The Lax-Friedrichs term approximator and its composition variants.
//! `Term::rhs` is the one entry point the integrator calls once per stage.

use std::cell::RefCell;

use crate::error::{ContractError, NumericalError, SolveError};
use crate::grid::PhiField;
use crate::scheme_data::SchemeData;

/// Sign constraint used by [`Term::Restrict`] to implement `minWithZero`
/// and friends: the masked update must never push `phi`
/// across the named side of zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sign {
    /// Preserve `phi <= 0`: zero the update wherever `phi[i] <= 0` and the
    /// inner update would make it positive.
    NonNegative,
    /// Preserve `phi >= 0`: zero the update wherever `phi[i] >= 0` and the
    /// inner update would make it negative.
    NonPositive,
}

/// The leaf term: the actual Lax-Friedrichs assembly steps. Owns the
/// thread pool used to parallelize the final elementwise combination.
pub struct LaxFriedrichs {
    #[cfg(not(target_arch = "wasm32"))]
    pool: RefCell<scoped_threadpool::Pool>,
}

impl LaxFriedrichs {
    #[cfg(not(target_arch = "wasm32"))]
    pub fn new(num_threads: u32) -> Self {
        LaxFriedrichs {
            pool: RefCell::new(scoped_threadpool::Pool::new(num_threads)),
        }
    }

    #[cfg(target_arch = "wasm32")]
    pub fn new(_num_threads: u32) -> Self {
        LaxFriedrichs {}
    }

    /// Builds the one-sided and centered derivatives per axis, calls the
    /// Hamiltonian for its value and dissipation, and combines them into
    /// `ydot = -(ham - diss)`.
    fn rhs(&self, t: f64, phi: &PhiField, scheme: &mut SchemeData) -> Result<(Vec<f64>, f64), SolveError> {
        let dim = scheme.grid.dim();
        let deriv_scheme = scheme.accuracy.deriv_scheme();

        let mut deriv_l = Vec::with_capacity(dim);
        let mut deriv_r = Vec::with_capacity(dim);
        let mut deriv_c = Vec::with_capacity(dim);
        for axis in 0..dim {
            let (l, r) = deriv_scheme.derivatives(&scheme.grid, phi, axis)?;
            for (cell, (&lv, &rv)) in l.iter().zip(r.iter()).enumerate() {
                if !lv.is_finite() || !rv.is_finite() {
                    return Err(NumericalError::NonFiniteDeriv {
                        t_now: t,
                        axis,
                        cell,
                        last_good: Box::new(phi.clone()),
                    }
                    .into());
                }
            }
            let c: Vec<f64> = l.iter().zip(r.iter()).map(|(a, b)| 0.5 * (a + b)).collect();
            deriv_l.push(l);
            deriv_r.push(r);
            deriv_c.push(c);
        }

        let ham = scheme.ham.value(t, phi, &deriv_c, &scheme.grid)?;
        if ham.len() != phi.len() {
            return Err(ContractError::WrongHamiltonianShape {
                what: "value",
                expected: phi.len(),
                got: ham.len(),
            }
            .into());
        }
        let (diss, step_bound) = scheme.ham.dissipation(t, phi, &deriv_l, &deriv_r, &scheme.grid, scheme.diss_type)?;
        if diss.len() != phi.len() {
            return Err(ContractError::WrongHamiltonianShape {
                what: "dissipation",
                expected: phi.len(),
                got: diss.len(),
            }
            .into());
        }

        let ydot = self.combine(&ham, &diss);

        for (i, &v) in ydot.iter().enumerate() {
            if !v.is_finite() {
                return Err(NumericalError::NonFiniteRhs {
                    t_now: t,
                    cell: i,
                    last_good: Box::new(phi.clone()),
                }
                .into());
            }
        }
        if step_bound < 0.0 {
            return Err(NumericalError::NegativeStepBound {
                t_now: t,
                step_bound,
                last_good: Box::new(phi.clone()),
            }
            .into());
        }

        Ok((ydot, step_bound))
    }

    /// `ydot[i] = -(ham[i] - diss[i])`, data-parallel across cells.
    #[cfg(not(target_arch = "wasm32"))]
    fn combine(&self, ham: &[f64], diss: &[f64]) -> Vec<f64> {
        let n = ham.len();
        let mut ydot = vec![0.0; n];
        struct SyncMutPtr(*mut f64);
        unsafe impl Sync for SyncMutPtr {}
        let out_ptr = SyncMutPtr(ydot.as_mut_ptr());
        let mut pool = self.pool.borrow_mut();
        crate::helpers::parallel_for_rows(&mut pool, n, 1, |_row, offset| {
            let v = -(ham[offset] - diss[offset]);
            unsafe {
                *out_ptr.0.add(offset) = v;
            }
        });
        ydot
    }

    #[cfg(target_arch = "wasm32")]
    fn combine(&self, ham: &[f64], diss: &[f64]) -> Vec<f64> {
        ham.iter().zip(diss.iter()).map(|(h, d)| -(h - d)).collect()
    }
}

/// A recursive term, composing leaf Lax-Friedrichs assemblies into
/// sum-of-terms and restrict-update combinations.
pub enum Term {
    Leaf(LaxFriedrichs),
    /// Sums `ydot` across terms, takes the minimum `stepBound`.
    Sum(Vec<Term>),
    /// Zeroes the update where it would violate `sign`.
    Restrict { sign: Sign, inner: Box<Term> },
}

impl Term {
    pub fn rhs(&self, t: f64, phi: &PhiField, scheme: &mut SchemeData) -> Result<(Vec<f64>, f64), SolveError> {
        match self {
            Term::Leaf(lf) => lf.rhs(t, phi, scheme),
            Term::Sum(terms) => {
                if terms.is_empty() {
                    return Ok((vec![0.0; phi.len()], f64::INFINITY));
                }
                let mut ydot = vec![0.0; phi.len()];
                let mut step_bound = f64::INFINITY;
                for term in terms {
                    let (y, sb) = term.rhs(t, phi, scheme)?;
                    if y.len() != ydot.len() {
                        return Err(ContractError::InnerTermLengthMismatch {
                            expected: ydot.len(),
                            got: y.len(),
                        }
                        .into());
                    }
                    for (acc, v) in ydot.iter_mut().zip(y.into_iter()) {
                        *acc += v;
                    }
                    step_bound = step_bound.min(sb);
                }
                Ok((ydot, step_bound))
            }
            Term::Restrict { sign, inner } => {
                let (mut ydot, step_bound) = inner.rhs(t, phi, scheme)?;
                let data = phi.as_slice();
                for i in 0..ydot.len() {
                    let blocked = match sign {
                        Sign::NonNegative => data[i] <= 0.0 && ydot[i] > 0.0,
                        Sign::NonPositive => data[i] >= 0.0 && ydot[i] < 0.0,
                    };
                    if blocked {
                        ydot[i] = 0.0;
                    }
                }
                Ok((ydot, step_bound))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::BoundaryCondition;
    use crate::error::ContractError as CE;
    use crate::grid::{Grid, GridSpec};
    use crate::hamiltonian::Hamiltonian;
    use crate::scheme_data::{Accuracy, DissipationKind};

    /// H = p (pure transport with speed 1), alpha = 1 everywhere: the
    /// textbook scalar-advection test Hamiltonian.
    struct Transport;

    impl Hamiltonian for Transport {
        fn value(&mut self, _t: f64, _data: &PhiField, deriv_c: &[Vec<f64>], _grid: &crate::grid::Grid) -> Result<Vec<f64>, CE> {
            Ok(deriv_c[0].clone())
        }

        fn dissipation(
            &mut self,
            _t: f64,
            data: &PhiField,
            deriv_l: &[Vec<f64>],
            deriv_r: &[Vec<f64>],
            grid: &crate::grid::Grid,
            _diss_type: DissipationKind,
        ) -> Result<(Vec<f64>, f64), CE> {
            let n = data.len();
            let diss: Vec<f64> = (0..n).map(|i| (deriv_r[0][i] - deriv_l[0][i]) / 2.0).collect();
            let step_bound = grid.dx(0);
            Ok((diss, step_bound))
        }
    }

    #[test]
    fn leaf_rhs_matches_negative_slope_for_transport() {
        let grid = Grid::from_spec(GridSpec::new(1).n(vec![32]).bdry(vec![BoundaryCondition::Periodic])).unwrap();
        let phi = PhiField::from_grid(&grid, |c| c[0].sin());
        let mut scheme = SchemeData::new(
            Grid::from_spec(GridSpec::new(1).n(vec![32]).bdry(vec![BoundaryCondition::Periodic])).unwrap(),
            Accuracy::VeryHigh,
            DissipationKind::Global,
            Box::new(Transport),
        );
        let term = Term::Leaf(LaxFriedrichs::new(2));
        let (ydot, step_bound) = term.rhs(0.0, &phi, &mut scheme).unwrap();
        assert_eq!(ydot.len(), phi.len());
        assert!(step_bound > 0.0);
    }

    #[test]
    fn restrict_masks_sign_violations() {
        let grid = Grid::from_spec(GridSpec::new(1).n(vec![8]).bdry(vec![BoundaryCondition::Periodic])).unwrap();
        let phi = PhiField::from_grid(&grid, |_c| -1.0); // all negative
        let mut scheme = SchemeData::new(
            Grid::from_spec(GridSpec::new(1).n(vec![8]).bdry(vec![BoundaryCondition::Periodic])).unwrap(),
            Accuracy::Low,
            DissipationKind::Global,
            Box::new(Transport),
        );
        // Inner term always pushes ydot positive (so the restriction must
        // zero everything, since phi<=0 everywhere).
        struct PushPositive;
        impl Hamiltonian for PushPositive {
            fn value(&mut self, _t: f64, data: &PhiField, _deriv_c: &[Vec<f64>], _grid: &crate::grid::Grid) -> Result<Vec<f64>, CE> {
                Ok(vec![-1.0; data.len()])
            }
            fn dissipation(
                &mut self,
                _t: f64,
                data: &PhiField,
                _deriv_l: &[Vec<f64>],
                _deriv_r: &[Vec<f64>],
                _grid: &crate::grid::Grid,
                _diss_type: DissipationKind,
            ) -> Result<(Vec<f64>, f64), CE> {
                Ok((vec![0.0; data.len()], 1.0))
            }
        }
        scheme.ham = Box::new(PushPositive);
        let inner = Term::Leaf(LaxFriedrichs::new(1));
        let restricted = Term::Restrict {
            sign: Sign::NonNegative,
            inner: Box::new(inner),
        };
        let (ydot, _) = restricted.rhs(0.0, &phi, &mut scheme).unwrap();
        assert!(ydot.iter().all(|&v| v == 0.0));
    }
}
