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

//! The grid: per-axis coordinate vectors, spacings, extents, and
//! boundary-condition handles for a regular Cartesian product grid of up to
//! 5 dimensions.

use crate::boundary::BoundaryCondition;
use crate::error::{ContractError, GridError};
use crate::helpers::RowMajor;

/// Maximum supported dimension count.
pub const MAX_DIMENSION: usize = 5;

/// A partial grid specification as accepted at the external interface.
/// Any field may be omitted; see [`Grid::from_spec`] for normalization
/// rules.
#[derive(Clone, Debug, Default)]
pub struct GridSpec {
    pub dim: Option<usize>,
    pub min: Option<Vec<f64>>,
    pub max: Option<Vec<f64>>,
    pub n: Option<Vec<usize>>,
    pub dx: Option<Vec<f64>>,
    pub bdry: Option<Vec<BoundaryCondition>>,
}

impl GridSpec {
    pub fn new(dim: usize) -> Self {
        GridSpec {
            dim: Some(dim),
            ..Default::default()
        }
    }

    pub fn min(mut self, min: Vec<f64>) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: Vec<f64>) -> Self {
        self.max = Some(max);
        self
    }

    pub fn n(mut self, n: Vec<usize>) -> Self {
        self.n = Some(n);
        self
    }

    pub fn dx(mut self, dx: Vec<f64>) -> Self {
        self.dx = Some(dx);
        self
    }

    pub fn bdry(mut self, bdry: Vec<BoundaryCondition>) -> Self {
        self.bdry = Some(bdry);
        self
    }
}

/// A regular Cartesian product grid.
///
/// Immutable once constructed; shared read-only by the derivative, term and
/// integrator components.
#[derive(Clone, Debug)]
pub struct Grid {
    dim: usize,
    min: Vec<f64>,
    max: Vec<f64>,
    dx: Vec<f64>,
    n: Vec<usize>,
    vs: Vec<Vec<f64>>,
    bdry: Vec<BoundaryCondition>,
    indexer: RowMajor,
}

impl Grid {
    /// Normalizes a partial [`GridSpec`] into a full [`Grid`]:
    /// - derive `dx` from `N` or vice versa; assert consistency if both given
    /// - default `min=0`, `max=1`, `N=101`, `bdry=periodic`
    /// - build `vs`, validate monotonicity and `dim <= 5`
    pub fn from_spec(spec: GridSpec) -> Result<Grid, GridError> {
        let dim = match spec.dim {
            Some(d) => d,
            None => return Err(GridError::NonPositiveDimension(0)),
        };
        if dim == 0 {
            return Err(GridError::NonPositiveDimension(0));
        }
        if dim > MAX_DIMENSION {
            tracing::warn!(dim, max = MAX_DIMENSION, "grid dimension exceeds the supported maximum; proceeding anyway");
        }

        let min = Self::fill_or_default(spec.min, dim, "min", 0.0)?;
        let max = Self::fill_or_default(spec.max, dim, "max", 1.0)?;
        for axis in 0..dim {
            if max[axis] <= min[axis] {
                return Err(GridError::MinNotLessThanMax {
                    axis,
                    min: min[axis],
                    max: max[axis],
                });
            }
        }

        let (n, dx) = Self::resolve_n_dx(&spec, dim, &min, &max)?;
        for axis in 0..dim {
            if n[axis] < 2 {
                return Err(GridError::TooFewPoints { axis, n: n[axis] });
            }
            if dx[axis] <= 0.0 {
                return Err(GridError::NonPositiveSpacing { axis, dx: dx[axis] });
            }
        }

        let bdry = match spec.bdry {
            Some(b) => {
                if b.len() != dim {
                    return Err(GridError::WrongAxisCount {
                        field: "bdry",
                        expected: dim,
                        got: b.len(),
                    });
                }
                b
            }
            None => vec![BoundaryCondition::Periodic; dim],
        };

        let mut vs = Vec::with_capacity(dim);
        for axis in 0..dim {
            let mut v = Vec::with_capacity(n[axis]);
            for i in 0..n[axis] {
                v.push(min[axis] + dx[axis] * i as f64);
            }
            for i in 1..v.len() {
                if v[i] <= v[i - 1] {
                    return Err(GridError::NonMonotoneAxis { axis, index: i });
                }
            }
            vs.push(v);
        }

        let indexer = RowMajor::new(n.clone());
        Ok(Grid {
            dim,
            min,
            max,
            dx,
            n,
            vs,
            bdry,
            indexer,
        })
    }

    fn fill_or_default(
        field: Option<Vec<f64>>,
        dim: usize,
        name: &'static str,
        default: f64,
    ) -> Result<Vec<f64>, GridError> {
        match field {
            Some(v) if v.len() == 1 && dim > 1 => Ok(vec![v[0]; dim]),
            Some(v) => {
                if v.len() != dim {
                    return Err(GridError::WrongAxisCount {
                        field: name,
                        expected: dim,
                        got: v.len(),
                    });
                }
                Ok(v)
            }
            None => Ok(vec![default; dim]),
        }
    }

    fn resolve_n_dx(
        spec: &GridSpec,
        dim: usize,
        min: &[f64],
        max: &[f64],
    ) -> Result<(Vec<usize>, Vec<f64>), GridError> {
        const DEFAULT_N: usize = 101;
        match (&spec.n, &spec.dx) {
            (Some(n), Some(dx)) => {
                if n.len() != dim {
                    return Err(GridError::WrongAxisCount {
                        field: "N",
                        expected: dim,
                        got: n.len(),
                    });
                }
                if dx.len() != dim {
                    return Err(GridError::WrongAxisCount {
                        field: "dx",
                        expected: dim,
                        got: dx.len(),
                    });
                }
                for axis in 0..dim {
                    let expected_dx = (max[axis] - min[axis]) / (n[axis] as f64 - 1.0);
                    let tol = f64::EPSILON * min[axis].abs().max(max[axis].abs()).max(1.0);
                    let diff = (dx[axis] - expected_dx).abs();
                    if diff > tol.max(expected_dx * 1e-9) {
                        return Err(GridError::InconsistentNAndDx {
                            axis,
                            n: n[axis],
                            dx: dx[axis],
                            expected_dx,
                            diff,
                            tol,
                        });
                    }
                }
                Ok((n.clone(), dx.clone()))
            }
            (Some(n), None) => {
                if n.len() != dim {
                    return Err(GridError::WrongAxisCount {
                        field: "N",
                        expected: dim,
                        got: n.len(),
                    });
                }
                let dx = (0..dim).map(|i| (max[i] - min[i]) / (n[i] as f64 - 1.0)).collect();
                Ok((n.clone(), dx))
            }
            (None, Some(dx)) => {
                if dx.len() != dim {
                    return Err(GridError::WrongAxisCount {
                        field: "dx",
                        expected: dim,
                        got: dx.len(),
                    });
                }
                let n = (0..dim)
                    .map(|i| (((max[i] - min[i]) / dx[i]).round() as usize) + 1)
                    .collect();
                Ok((n, dx.clone()))
            }
            (None, None) => {
                let n = vec![DEFAULT_N; dim];
                let dx = (0..dim).map(|i| (max[i] - min[i]) / (n[i] as f64 - 1.0)).collect();
                Ok((n, dx))
            }
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn shape(&self) -> &[usize] {
        self.indexer.shape()
    }

    pub fn n(&self, axis: usize) -> usize {
        self.n[axis]
    }

    pub fn dx(&self, axis: usize) -> f64 {
        self.dx[axis]
    }

    pub fn min(&self, axis: usize) -> f64 {
        self.min[axis]
    }

    pub fn max(&self, axis: usize) -> f64 {
        self.max[axis]
    }

    pub fn vs(&self, axis: usize) -> &[f64] {
        &self.vs[axis]
    }

    /// Coordinate of the grid cell at logical index `idx` along `axis`.
    pub fn x(&self, axis: usize, idx: usize) -> f64 {
        self.vs[axis][idx]
    }

    pub fn bdry(&self, axis: usize) -> BoundaryCondition {
        self.bdry[axis]
    }

    pub fn indexer(&self) -> &RowMajor {
        &self.indexer
    }

    pub fn len(&self) -> usize {
        self.indexer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indexer.is_empty()
    }

    /// Produces a padded array along `axis` with `width` extra entries on
    /// each end, leaving the interior identical.
    /// The returned [`RowMajor`] describes the padded array's shape (the
    /// same as `self.shape()` except `axis`, which grows by `2*width`).
    pub fn pad(&self, data: &[f64], axis: usize, width: usize) -> Result<(Vec<f64>, RowMajor), ContractError> {
        let n_axis = self.n[axis];
        let mut padded_shape: Vec<usize> = self.shape().to_vec();
        padded_shape[axis] += 2 * width;
        let padded_indexer = RowMajor::new(padded_shape);
        let mut out = vec![0.0; padded_indexer.len()];

        let bdry = self.bdry[axis];
        let stride = self.indexer.stride(axis);
        let padded_stride = padded_indexer.stride(axis);

        // Iterate over every 1D fiber along `axis`: all combinations of the
        // other axes' indices.
        let mut fiber_shape = self.shape().to_vec();
        fiber_shape[axis] = 1;
        let fiber_indexer = RowMajor::new(fiber_shape);

        for mut idx in fiber_indexer.iter_indices() {
            idx[axis] = 0;
            let base = self.indexer.flatten(&idx);
            let line: Vec<f64> = (0..n_axis).map(|i| data[base + i * stride]).collect();
            let padded_line = bdry.pad(&line, width);
            if padded_line.len() != n_axis + 2 * width {
                return Err(ContractError::BadPadWidth {
                    axis,
                    expected: n_axis + 2 * width,
                    got: padded_line.len(),
                });
            }
            let mut padded_idx = idx.clone();
            padded_idx[axis] = 0;
            let padded_base = padded_indexer.flatten(&padded_idx);
            for (i, v) in padded_line.into_iter().enumerate() {
                out[padded_base + i * padded_stride] = v;
            }
        }
        Ok((out, padded_indexer))
    }
}

/// A dense tensor of shape `G.shape` holding the value function. Row-major contiguous.
#[derive(Clone, Debug, PartialEq)]
pub struct PhiField {
    data: Vec<f64>,
    indexer: RowMajor,
}

impl PhiField {
    pub fn new(data: Vec<f64>, shape: Vec<usize>) -> Self {
        let indexer = RowMajor::new(shape);
        assert_eq!(data.len(), indexer.len(), "data length must match shape");
        PhiField { data, indexer }
    }

    pub fn zeros(shape: Vec<usize>) -> Self {
        let indexer = RowMajor::new(shape);
        let data = vec![0.0; indexer.len()];
        PhiField { data, indexer }
    }

    /// Builds a field by evaluating `f` at every grid coordinate, in
    /// row-major order.
    pub fn from_grid<F>(grid: &Grid, f: F) -> Self
    where
        F: Fn(&[f64]) -> f64,
    {
        let indexer = grid.indexer().clone();
        let mut data = Vec::with_capacity(indexer.len());
        for idx in indexer.iter_indices() {
            let coords: Vec<f64> = (0..grid.dim()).map(|axis| grid.x(axis, idx[axis])).collect();
            data.push(f(&coords));
        }
        PhiField { data, indexer }
    }

    pub fn shape(&self) -> &[usize] {
        self.indexer.shape()
    }

    pub fn indexer(&self) -> &RowMajor {
        &self.indexer
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, idx: &[usize]) -> f64 {
        self.data[self.indexer.flatten(idx)]
    }
}
