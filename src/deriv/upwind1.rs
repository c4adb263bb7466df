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

//! First-order one-sided difference.

use super::{for_each_line, DerivScheme};
use crate::error::ContractError;
use crate::grid::{Grid, PhiField};

/// `derivL[i] = (phi[i]-phi[i-1])/dx`, `derivR[i] = (phi[i+1]-phi[i])/dx`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Upwind1;

impl DerivScheme for Upwind1 {
    fn ghost_width(&self) -> usize {
        1
    }

    fn derivatives(&self, grid: &Grid, data: &PhiField, axis: usize) -> Result<(Vec<f64>, Vec<f64>), ContractError> {
        for_each_line(grid, data, axis, self.ghost_width(), |line, dx| {
            let n = line.len() - 2;
            let mut l = vec![0.0; n];
            let mut r = vec![0.0; n];
            for i in 0..n {
                let g = i + 1;
                l[i] = (line[g] - line[g - 1]) / dx;
                r[i] = (line[g + 1] - line[g]) / dx;
            }
            (l, r)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::BoundaryCondition;
    use crate::grid::GridSpec;

    #[test]
    fn linear_field_exact() {
        let grid = Grid::from_spec(GridSpec::new(1).n(vec![6]).bdry(vec![BoundaryCondition::Extrapolate])).unwrap();
        let phi = PhiField::from_grid(&grid, |c| 3.0 * c[0] + 1.0);
        let (l, r) = Upwind1.derivatives(&grid, &phi, 0).unwrap();
        for i in 0..grid.len() {
            assert!((l[i] - 3.0).abs() < 1e-10, "l[{i}]={}", l[i]);
            assert!((r[i] - 3.0).abs() < 1e-10, "r[{i}]={}", r[i]);
        }
    }

    #[test]
    fn periodic_matches_hand_computation() {
        let grid = Grid::from_spec(GridSpec::new(1).n(vec![4]).bdry(vec![BoundaryCondition::Periodic])).unwrap();
        let phi = PhiField::new(vec![1.0, 2.0, 4.0, 8.0], vec![4]);
        let (l, r) = Upwind1.derivatives(&grid, &phi, 0).unwrap();
        let dx = grid.dx(0);
        assert!((l[0] - (1.0 - 8.0) / dx).abs() < 1e-12);
        assert!((r[0] - (2.0 - 1.0) / dx).abs() < 1e-12);
        assert!((l[3] - (8.0 - 4.0) / dx).abs() < 1e-12);
        assert!((r[3] - (1.0 - 8.0) / dx).abs() < 1e-12);
    }
}
