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

//! Derivative schemes: one-sided finite-difference approximations
//! `(derivL, derivR)` of `d(phi)/dx_axis`, computed independently along
//! each axis.

mod eno;
mod upwind1;
mod weno5;

pub use eno::Eno;
pub use upwind1::Upwind1;
pub use weno5::{EpsilonMode, Weno5};

use crate::error::ContractError;
use crate::grid::{Grid, PhiField};
use crate::helpers::RowMajor;

/// Common interface for one-sided derivative approximations along a single
/// axis: a small, closed contract that the rest of the crate programs
/// against instead of a concrete scheme.
pub trait DerivScheme: Send + Sync {
    /// Number of ghost cells this scheme needs on each side of an axis.
    fn ghost_width(&self) -> usize;

    /// Computes `(derivL, derivR)` along `axis`, each the same shape as
    /// `data`. `derivL[i]` uses data at `i` and below; `derivR[i]` uses data
    /// at `i` and above.
    fn derivatives(&self, grid: &Grid, data: &PhiField, axis: usize) -> Result<(Vec<f64>, Vec<f64>), ContractError>;
}

/// Gathers every 1D fiber along `axis` (padded with `width` ghost entries per
/// [`Grid::pad`]), hands each to `line_fn`, and scatters the two resulting
/// per-cell outputs back into full-shape arrays. Every [`DerivScheme`] impl
/// is just this plus a stencil formula; the row-major bookkeeping lives here
/// once, per the crate's no-flattening-outside-`helpers` rule.
pub(crate) fn for_each_line(
    grid: &Grid,
    data: &PhiField,
    axis: usize,
    width: usize,
    line_fn: impl Fn(&[f64], f64) -> (Vec<f64>, Vec<f64>),
) -> Result<(Vec<f64>, Vec<f64>), ContractError> {
    let n_axis = grid.n(axis);
    let dx = grid.dx(axis);
    let (padded, padded_indexer) = grid.pad(data.as_slice(), axis, width)?;
    let orig_indexer = grid.indexer();
    let stride = orig_indexer.stride(axis);
    let padded_stride = padded_indexer.stride(axis);

    let mut deriv_l = vec![0.0; data.len()];
    let mut deriv_r = vec![0.0; data.len()];

    let mut fiber_shape = grid.shape().to_vec();
    fiber_shape[axis] = 1;
    let fiber_indexer = RowMajor::new(fiber_shape);

    for mut idx in fiber_indexer.iter_indices() {
        idx[axis] = 0;
        let orig_base = orig_indexer.flatten(&idx);
        let padded_base = padded_indexer.flatten(&idx);
        let line: Vec<f64> = (0..(n_axis + 2 * width)).map(|i| padded[padded_base + i * padded_stride]).collect();
        let (l, r) = line_fn(&line, dx);
        debug_assert_eq!(l.len(), n_axis);
        debug_assert_eq!(r.len(), n_axis);
        for i in 0..n_axis {
            deriv_l[orig_base + i * stride] = l[i];
            deriv_r[orig_base + i * stride] = r[i];
        }
    }
    Ok((deriv_l, deriv_r))
}
