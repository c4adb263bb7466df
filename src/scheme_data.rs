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

//! The scheme-data bundle: the configuration record threaded through the
//! pipeline, parameterized by the [`Hamiltonian`] trait. Owns the grid,
//! selects the derivative scheme and dissipation strategy, and holds the
//! Hamiltonian.

use crate::deriv::{DerivScheme, Eno, Upwind1, Weno5};
use crate::grid::Grid;
use crate::hamiltonian::Hamiltonian;

/// Selects the spatial derivative scheme, and with it the paired RK order
/// (see [`crate::integrator::RkOrder::from_accuracy`]). `Low -> Upwind1`,
/// `Medium -> ENO2`, `High -> ENO3`, `VeryHigh -> WENO5`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Accuracy {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl Accuracy {
    /// Builds the boxed [`DerivScheme`] this accuracy level selects.
    pub fn deriv_scheme(&self) -> Box<dyn DerivScheme> {
        match self {
            Accuracy::Low => Box::new(Upwind1),
            Accuracy::Medium => Box::new(Eno::order2()),
            Accuracy::High => Box::new(Eno::order3()),
            Accuracy::VeryHigh => Box::new(Weno5::default()),
        }
    }
}

/// Lax-Friedrichs dissipation strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DissipationKind {
    /// `alpha_d` is a single grid-wide bound per axis.
    Global,
    /// `alpha_d(x)` is a neighborhood-local bound.
    Local,
    /// `alpha_d(x)` uses only that cell's own derivative extrema.
    LocalLocal,
}

/// The configuration record carried through the pipeline. `grid` is shared
/// read-only by the derivative, dissipation and time-stepping stages; `ham`
/// is the only mutable piece, since the Hamiltonian is allowed to thread
/// state through itself across calls.
pub struct SchemeData {
    pub grid: Grid,
    pub accuracy: Accuracy,
    pub diss_type: DissipationKind,
    pub ham: Box<dyn Hamiltonian>,
}

impl SchemeData {
    pub fn new(grid: Grid, accuracy: Accuracy, diss_type: DissipationKind, ham: Box<dyn Hamiltonian>) -> Self {
        SchemeData {
            grid,
            accuracy,
            diss_type,
            ham,
        }
    }
}
