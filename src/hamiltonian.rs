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

//! The Hamiltonian interface: the external collaborator that supplies the
//! analytic H(x,t,phi,p) and its Lax-Friedrichs dissipation bound. No
//! concrete implementation lives in this crate; callers are expected to
//! wrap a dynamical system (state dimension, optimal control/disturbance
//! law) behind this trait.

use crate::error::ContractError;
use crate::grid::{Grid, PhiField};
use crate::scheme_data::DissipationKind;

/// A Hamiltonian consumed by [`crate::lax_friedrichs::LaxFriedrichs`].
/// Implementations own their parameter state and may mutate it across
/// calls.
pub trait Hamiltonian {
    /// Evaluates `H(x, t, phi, p)` at every grid cell from centered
    /// costate components `deriv_c[axis][cell]`. Must be pure with respect
    /// to `t`, `data`, `deriv_c`, `grid` aside from `self`'s own state.
    fn value(&mut self, t: f64, data: &PhiField, deriv_c: &[Vec<f64>], grid: &Grid) -> Result<Vec<f64>, ContractError>;

    /// Returns the Lax-Friedrichs dissipation field (non-negative,
    /// shape `grid.shape()`) and the maximum admissible `dt`, given
    /// one-sided derivatives and the selected dissipation strategy.
    fn dissipation(
        &mut self,
        t: f64,
        data: &PhiField,
        deriv_l: &[Vec<f64>],
        deriv_r: &[Vec<f64>],
        grid: &Grid,
        diss_type: DissipationKind,
    ) -> Result<(Vec<f64>, f64), ContractError>;
}
