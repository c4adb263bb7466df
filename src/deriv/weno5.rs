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

//! Fifth-order weighted essentially non-oscillatory derivative using
//! Jiang-Shu smoothness indicators.

use super::{for_each_line, DerivScheme};
use crate::error::ContractError;
use crate::grid::{Grid, PhiField};

/// How the WENO5 smoothness-indicator regularization epsilon is derived.
#[derive(Clone, Copy, Debug)]
pub enum EpsilonMode {
    /// `1e-6 * max(v_a^2..v_e^2, 1) `, recomputed per 5-point stencil.
    Fixed(f64),
    /// `1e-6 * (max|phi| over the whole line)^2`, a single value per
    /// derivative call rather than per stencil.
    MaxOverGrid,
}

impl Default for EpsilonMode {
    fn default() -> Self {
        EpsilonMode::MaxOverGrid
    }
}

/// Fifth-order WENO derivative along one axis. Ghost width 3.
#[derive(Clone, Copy, Debug, Default)]
pub struct Weno5 {
    pub epsilon: EpsilonMode,
}

impl Weno5 {
    pub fn new(epsilon: EpsilonMode) -> Self {
        Weno5 { epsilon }
    }
}

impl DerivScheme for Weno5 {
    fn ghost_width(&self) -> usize {
        3
    }

    fn derivatives(&self, grid: &Grid, data: &PhiField, axis: usize) -> Result<(Vec<f64>, Vec<f64>), ContractError> {
        let epsilon = self.epsilon;
        for_each_line(grid, data, axis, self.ghost_width(), move |line, dx| {
            let n = line.len() - 6;
            // First divided differences (slopes), one per adjacent pair.
            let d1: Vec<f64> = (0..line.len() - 1).map(|j| (line[j + 1] - line[j]) / dx).collect();

            let eps_floor = match epsilon {
                EpsilonMode::Fixed(e) => e,
                EpsilonMode::MaxOverGrid => {
                    let max_abs = line.iter().fold(0.0_f64, |acc, &v| acc.max(v.abs()));
                    1e-6 * max_abs.max(1.0).powi(2)
                }
            };

            let mut l = vec![0.0; n];
            let mut r = vec![0.0; n];
            for i in 0..n {
                let g = i + 3; // index of cell i within `line`
                // Left-biased: slopes at g-3/2 .. g+1/2, i.e. d1[g-3..g+2].
                let v = [d1[g - 3], d1[g - 2], d1[g - 1], d1[g], d1[g + 1]];
                l[i] = weno5_combine(v, eps_floor);
                // Right-biased: mirror image, slopes at g+3/2 .. g-1/2 reversed.
                let u = [d1[g + 2], d1[g + 1], d1[g], d1[g - 1], d1[g - 2]];
                r[i] = weno5_combine(u, eps_floor);
            }
            (l, r)
        })
    }
}

/// Jiang-Shu WENO5 combination of five consecutive one-sided slopes
/// `v = [v1..v5]` into a single derivative estimate. Used for both the
/// left-biased stencil (`v` in increasing-index order) and the
/// right-biased one (`v` in decreasing-index order; the smoothness
/// indicators are the same formula, just fed the differences reversed).
fn weno5_combine(v: [f64; 5], eps: f64) -> f64 {
    let [v1, v2, v3, v4, v5] = v;

    let d0 = v1 / 3.0 - 7.0 * v2 / 6.0 + 11.0 * v3 / 6.0;
    let d1 = -v2 / 6.0 + 5.0 * v3 / 6.0 + v4 / 3.0;
    let d2 = v3 / 3.0 + 5.0 * v4 / 6.0 - v5 / 6.0;

    let beta0 = 13.0 / 12.0 * (v1 - 2.0 * v2 + v3).powi(2) + 0.25 * (v1 - 4.0 * v2 + 3.0 * v3).powi(2);
    let beta1 = 13.0 / 12.0 * (v2 - 2.0 * v3 + v4).powi(2) + 0.25 * (v2 - v4).powi(2);
    let beta2 = 13.0 / 12.0 * (v3 - 2.0 * v4 + v5).powi(2) + 0.25 * (3.0 * v3 - 4.0 * v4 + v5).powi(2);

    let alpha0 = 0.1 / (eps + beta0).powi(2);
    let alpha1 = 0.6 / (eps + beta1).powi(2);
    let alpha2 = 0.3 / (eps + beta2).powi(2);
    let alpha_sum = alpha0 + alpha1 + alpha2;

    (alpha0 * d0 + alpha1 * d1 + alpha2 * d2) / alpha_sum
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::BoundaryCondition;
    use crate::grid::GridSpec;

    #[test]
    fn smooth_field_converges_to_analytic_derivative() {
        let grid = Grid::from_spec(GridSpec::new(1).n(vec![40]).bdry(vec![BoundaryCondition::Periodic])).unwrap();
        let phi = PhiField::from_grid(&grid, |c| c[0].sin());
        let scheme = Weno5::default();
        let (l, r) = scheme.derivatives(&grid, &phi, 0).unwrap();
        for i in 0..grid.n(0) {
            let x = grid.x(0, i);
            let expected = x.cos();
            assert!((l[i] - expected).abs() < 1e-3, "l[{i}]={} expected {}", l[i], expected);
            assert!((r[i] - expected).abs() < 1e-3, "r[{i}]={} expected {}", r[i], expected);
        }
    }

    #[test]
    fn weights_sum_to_one_on_smooth_constants() {
        // All slopes equal: smoothness indicators collapse to 0, so the
        // combination should exactly reproduce the common slope.
        let v = [2.0, 2.0, 2.0, 2.0, 2.0];
        let out = weno5_combine(v, 1e-12);
        assert!((out - 2.0).abs() < 1e-9);
    }

    #[test]
    fn fixed_epsilon_mode_is_used_when_selected() {
        let grid = Grid::from_spec(GridSpec::new(1).n(vec![20]).bdry(vec![BoundaryCondition::Periodic])).unwrap();
        let phi = PhiField::from_grid(&grid, |c| c[0].sin());
        let scheme = Weno5::new(EpsilonMode::Fixed(1e-6));
        let (l, _) = scheme.derivatives(&grid, &phi, 0).unwrap();
        assert_eq!(l.len(), grid.n(0));
    }
}
