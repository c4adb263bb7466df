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

//! Core numerical engine for time-dependent Hamilton-Jacobi-Isaacs PDEs on
//! Cartesian grids: grid and boundary operators, upwind/ENO/WENO spatial
//! derivatives, the Lax-Friedrichs term approximator, and a CFL-constrained
//! TVD Runge-Kutta time integrator. The analytic Hamiltonian itself is
//! supplied by the caller through the [`hamiltonian::Hamiltonian`] trait;
//! this crate has no concrete dynamical-system Hamiltonians built in.
//!
//! Usage
//! -----
//! Basic usage follows the same pattern regardless of the Hamiltonian:
//!
//! ```
//! use hji_core::boundary::BoundaryCondition;
//! use hji_core::grid::{Grid, GridSpec, PhiField};
//! use hji_core::scheme_data::{Accuracy, DissipationKind, SchemeData};
//! use hji_core::hamiltonian::Hamiltonian;
//! use hji_core::driver::{solve, CompMethod, ExtraArgs};
//! use hji_core::error::ContractError;
//!
//! struct Transport;
//! impl Hamiltonian for Transport {
//!     fn value(&mut self, _t: f64, _data: &PhiField, deriv_c: &[Vec<f64>], _grid: &Grid)
//!         -> Result<Vec<f64>, ContractError>
//!     {
//!         Ok(deriv_c[0].clone())
//!     }
//!     fn dissipation(&mut self, _t: f64, data: &PhiField, _deriv_l: &[Vec<f64>],
//!         _deriv_r: &[Vec<f64>], grid: &Grid, _diss_type: DissipationKind)
//!         -> Result<(Vec<f64>, f64), ContractError>
//!     {
//!         Ok((vec![0.0; data.len()], grid.dx(0)))
//!     }
//! }
//!
//! let grid = Grid::from_spec(
//!     GridSpec::new(1).n(vec![32]).bdry(vec![BoundaryCondition::Periodic])
//! ).unwrap();
//! let phi0 = PhiField::from_grid(&grid, |c| c[0].sin());
//! let scheme = SchemeData::new(
//!     Grid::from_spec(GridSpec::new(1).n(vec![32]).bdry(vec![BoundaryCondition::Periodic])).unwrap(),
//!     Accuracy::Low,
//!     DissipationKind::Global,
//!     Box::new(Transport),
//! );
//! let (history, _tau, _extra_outs) =
//!     solve(phi0, vec![0.0, 0.1], scheme, CompMethod::Set, ExtraArgs::default()).unwrap();
//! assert_eq!(history.last().len(), grid.len());
//! ```

pub mod boundary;
pub mod deriv;
pub mod driver;
pub mod error;
pub mod grid;
pub mod hamiltonian;
mod helpers;
pub mod integrator;
pub mod lax_friedrichs;
pub mod ode;
pub mod scheme_data;
