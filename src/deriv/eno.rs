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

//! Essentially non-oscillatory derivatives of order 2 and 3: build a divided-difference table of `phi` along the axis,
//! and at each cell grow a one-sided stencil one point at a time, at each
//! step picking whichever side's next divided difference has the smaller
//! magnitude (ties favor the more leftward stencil). The derivative is then
//! the Newton-form derivative of the interpolating polynomial through the
//! chosen stencil, evaluated at the cell.
//!
//! Numerical results need not match any particular reference implementation
//! bit-for-bit, only the stated convergence order and ENO stencil-selection
//! rule, so this uses a single re-anchored Newton-form evaluation rather
//! than the closed-form shortcuts found in some textbooks.

use super::{for_each_line, DerivScheme};
use crate::error::ContractError;
use crate::grid::{Grid, PhiField};

/// ENO derivative of the given `order` (2 or 3). Ghost width is `2*order-1`,
/// generous enough that the stencil selection never walks off the padded
/// line regardless of which side it grows toward.
#[derive(Clone, Copy, Debug)]
pub struct Eno {
    order: usize,
}

impl Eno {
    pub fn order2() -> Self {
        Eno { order: 2 }
    }

    pub fn order3() -> Self {
        Eno { order: 3 }
    }

    pub fn order(&self) -> usize {
        self.order
    }
}

impl DerivScheme for Eno {
    fn ghost_width(&self) -> usize {
        2 * self.order - 1
    }

    fn derivatives(&self, grid: &Grid, data: &PhiField, axis: usize) -> Result<(Vec<f64>, Vec<f64>), ContractError> {
        let order = self.order;
        for_each_line(grid, data, axis, self.ghost_width(), move |line, dx| {
            let gw = (2 * order - 1) as i64;
            let n = line.len() - 2 * gw as usize;
            let dd = build_divided_differences(line, dx, order);
            let mut l = vec![0.0; n];
            let mut r = vec![0.0; n];
            for i in 0..n {
                let gi = gw + i as i64;
                l[i] = one_sided_derivative(&dd, dx, gi, order, true);
                r[i] = one_sided_derivative(&dd, dx, gi, order, false);
            }
            (l, r)
        })
    }
}

/// `dd[0]` is `phi` itself; `dd[s][j]` is the `s`-th order divided
/// difference of `phi` over the `s+1` consecutive nodes `j..=j+s`, scaled by
/// the uniform spacing `dx` (`dd[s][j] = (dd[s-1][j+1]-dd[s-1][j])/(s*dx)`).
fn build_divided_differences(line: &[f64], dx: f64, order: usize) -> Vec<Vec<f64>> {
    let mut dd = Vec::with_capacity(order + 1);
    dd.push(line.to_vec());
    for s in 1..=order {
        let prev = &dd[s - 1];
        let next: Vec<f64> = (0..prev.len() - 1).map(|j| (prev[j + 1] - prev[j]) / (s as f64 * dx)).collect();
        dd.push(next);
    }
    dd
}

/// Grows a one-sided stencil from the 2-point base at `gi` (using nodes
/// `gi-1, gi` for the left-biased derivative, `gi, gi+1` for the
/// right-biased one) up to `order`, picking the smaller-magnitude candidate
/// divided difference at each step, then evaluates the Newton-form
/// derivative of the resulting polynomial at `x_gi`.
fn one_sided_derivative(dd: &[Vec<f64>], dx: f64, gi: i64, order: usize, left_biased: bool) -> f64 {
    let mut k_l: i64 = if left_biased { gi - 1 } else { gi };
    let mut coeffs = vec![0.0; order + 1];
    let mut bases = vec![0i64; order + 1];
    let mut extended_left = vec![false; order + 1];
    coeffs[1] = dd[1][k_l as usize];
    bases[1] = k_l;
    for s in 2..=order {
        let left_cand = dd[s][(k_l - 1) as usize];
        let right_cand = dd[s][k_l as usize];
        if left_cand.abs() <= right_cand.abs() {
            k_l -= 1;
            coeffs[s] = left_cand;
            extended_left[s] = true;
        } else {
            coeffs[s] = right_cand;
        }
        bases[s] = k_l;
    }

    // `coeffs[s]` is the divided difference over the `s+1` nodes
    // `bases[s]..=bases[s]+s`, but the basis polynomial it multiplies is the
    // product over the `s` nodes present *before* this step grew the
    // stencil. When step `s` grew rightward those are the bottom `s` nodes
    // (`bases[s]..bases[s]+s`), but when it grew leftward the pre-step
    // stencil was the *top* `s` nodes (`bases[s]+1..=bases[s]+s`), so the
    // anchor shifts by one.
    let mut deriv = coeffs[1];
    for s in 2..=order {
        let anchor = bases[s] + if extended_left[s] { 1 } else { 0 };
        let offset = (gi - anchor) as f64;
        deriv += coeffs[s] * newton_basis_derivative(offset, s) * dx.powi(s as i32 - 1);
    }
    deriv
}

/// `d/dx [ (x-x_0)(x-x_1)...(x-x_{s-1}) ]` evaluated at the point `offset`
/// nodes to the right of `x_0`, in units where adjacent nodes are 1 apart:
/// `sum_m prod_{l != m} (offset - l)`.
fn newton_basis_derivative(offset: f64, s: usize) -> f64 {
    let mut total = 0.0;
    for m in 0..s {
        let mut prod = 1.0;
        for l in 0..s {
            if l != m {
                prod *= offset - l as f64;
            }
        }
        total += prod;
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::BoundaryCondition;
    use crate::grid::GridSpec;

    #[test]
    fn eno2_exact_on_quadratic() {
        let grid = Grid::from_spec(GridSpec::new(1).n(vec![12]).bdry(vec![BoundaryCondition::Extrapolate])).unwrap();
        let phi = PhiField::from_grid(&grid, |c| c[0] * c[0]);
        let scheme = Eno::order2();
        let (l, r) = scheme.derivatives(&grid, &phi, 0).unwrap();
        for i in 2..grid.n(0) - 2 {
            let x = grid.x(0, i);
            assert!((l[i] - 2.0 * x).abs() < 1e-8, "l[{i}]={} expected {}", l[i], 2.0 * x);
            assert!((r[i] - 2.0 * x).abs() < 1e-8, "r[{i}]={} expected {}", r[i], 2.0 * x);
        }
    }

    #[test]
    fn eno3_exact_on_cubic() {
        let grid = Grid::from_spec(GridSpec::new(1).n(vec![14]).bdry(vec![BoundaryCondition::Extrapolate])).unwrap();
        let phi = PhiField::from_grid(&grid, |c| c[0] * c[0] * c[0]);
        let scheme = Eno::order3();
        let (l, r) = scheme.derivatives(&grid, &phi, 0).unwrap();
        for i in 4..grid.n(0) - 4 {
            let x = grid.x(0, i);
            assert!((l[i] - 3.0 * x * x).abs() < 1e-6, "l[{i}]={} expected {}", l[i], 3.0 * x * x);
            assert!((r[i] - 3.0 * x * x).abs() < 1e-6, "r[{i}]={} expected {}", r[i], 3.0 * x * x);
        }
    }

    #[test]
    fn ghost_width_matches_order() {
        assert_eq!(Eno::order2().ghost_width(), 3);
        assert_eq!(Eno::order3().ghost_width(), 5);
    }
}
