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

//! Boundary operators: pure functions mapping a 1D line of data + a ghost
//! width to a padded line. Applied per-axis by [`crate::grid::Grid`].

/// Per-axis boundary condition kind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BoundaryCondition {
    /// Wraps with the axis' period: `ghost[-k] = interior[N-k]`.
    Periodic,
    /// Linear extrapolation from the two nearest interior entries.
    Extrapolate,
    /// All ghost entries equal a fixed constant.
    Dirichlet(f64),
    /// Zero-slope copy of the boundary interior entry.
    Neumann,
}

impl BoundaryCondition {
    /// Pads a single line of `len` interior samples with `width` ghost
    /// entries on each side, returning a line of length `len + 2*width`.
    ///
    /// `line[0]` is the first interior sample, `line[len-1]` the last.
    pub fn pad(&self, line: &[f64], width: usize) -> Vec<f64> {
        let len = line.len();
        let mut out = vec![0.0; len + 2 * width];
        out[width..width + len].copy_from_slice(line);
        match self {
            BoundaryCondition::Periodic => {
                for k in 1..=width {
                    out[width - k] = line[(len - k % len) % len];
                    out[width + len - 1 + k] = line[(k - 1) % len];
                }
            }
            BoundaryCondition::Extrapolate => {
                let lo_slope = line[0] - line.get(1).copied().unwrap_or(line[0]);
                let hi_slope = line[len - 1] - line.get(len.saturating_sub(2)).copied().unwrap_or(line[len - 1]);
                for k in 1..=width {
                    out[width - k] = line[0] + (k as f64) * lo_slope;
                    out[width + len - 1 + k] = line[len - 1] + (k as f64) * hi_slope;
                }
            }
            BoundaryCondition::Dirichlet(v) => {
                for k in 0..width {
                    out[k] = *v;
                    out[width + len + k] = *v;
                }
            }
            BoundaryCondition::Neumann => {
                for k in 0..width {
                    out[k] = line[0];
                    out[width + len + k] = line[len - 1];
                }
            }
        }
        out
    }
}
