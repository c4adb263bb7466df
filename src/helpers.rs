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

//! Crate internal helper functions: row-major indexing and parallel chunk
//! dispatch. Kept separate so the canonical flattening never leaks into the
//! derivative schemes, which want logical N-D indexing.

/// Calculates ceil(x/y) for x > 0.
pub(crate) fn ceil_div(x: usize, y: usize) -> usize {
    assert!(x > 0);
    1 + (x - 1) / y
}

/// Row-major strides and flattening/unflattening for an N-dimensional shape.
///
/// This is the single place that knows how logical grid indices map onto a
/// flat `Vec<f64>`; every other component only ever sees either the flat
/// slice or a full set of logical indices, never a stride computation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowMajor {
    shape: Vec<usize>,
    strides: Vec<usize>,
    len: usize,
}

impl RowMajor {
    pub fn new(shape: Vec<usize>) -> Self {
        let mut strides = vec![1usize; shape.len()];
        for i in (0..shape.len().saturating_sub(1)).rev() {
            strides[i] = strides[i + 1] * shape[i + 1];
        }
        let len = if shape.is_empty() { 0 } else { shape.iter().product() };
        RowMajor { shape, strides, len }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn dim(&self) -> usize {
        self.shape.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn stride(&self, axis: usize) -> usize {
        self.strides[axis]
    }

    /// Flatten logical indices into a flat offset.
    pub fn flatten(&self, idx: &[usize]) -> usize {
        debug_assert_eq!(idx.len(), self.shape.len());
        idx.iter().zip(self.strides.iter()).map(|(i, s)| i * s).sum()
    }

    /// Unflatten a flat offset into logical indices.
    pub fn unflatten(&self, mut flat: usize) -> Vec<usize> {
        let mut idx = vec![0usize; self.shape.len()];
        for i in 0..self.shape.len() {
            idx[i] = flat / self.strides[i];
            flat %= self.strides[i];
        }
        idx
    }

    /// Iterate over all logical indices in row-major order.
    pub fn iter_indices(&self) -> impl Iterator<Item = Vec<usize>> + '_ {
        (0..self.len).map(move |flat| self.unflatten(flat))
    }
}

/// Splits a loop over `num_rows` row-aligned chunks along the slowest axis
/// and runs `body` on each chunk in parallel using `pool`, falling back to
/// serial execution when the pool has fewer than two threads. `row_len` is
/// the number of flat elements per row of the slowest axis (i.e. the
/// product of all but the first axis' extents). `body(row, flat_offset)` is
/// called once per row with the flat offset of that row's first element.
///
/// Row chunks are contiguous slices along the slowest axis, so no two
/// chunks ever touch the same element.
#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn parallel_for_rows<F>(pool: &mut scoped_threadpool::Pool, num_rows: usize, row_len: usize, body: F)
where
    F: Fn(usize, usize) + Sync,
{
    let num_threads = pool.thread_count() as usize;
    if num_threads < 2 || num_rows < 2 {
        for row in 0..num_rows {
            body(row, row * row_len);
        }
        return;
    }
    let chunk_rows = ceil_div(num_rows, num_threads);
    pool.scoped(|s| {
        for t in 0..num_threads {
            let body = &body;
            s.execute(move || {
                let start = t * chunk_rows;
                let end = (start + chunk_rows).min(num_rows);
                for row in start..end {
                    body(row, row * row_len);
                }
            });
        }
    });
}

#[cfg(target_arch = "wasm32")]
pub(crate) fn parallel_for_rows<F>(_pool: &mut (), num_rows: usize, row_len: usize, body: F)
where
    F: Fn(usize, usize),
{
    for row in 0..num_rows {
        body(row, row * row_len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_major_flatten_roundtrip() {
        let rm = RowMajor::new(vec![3, 4, 2]);
        assert_eq!(rm.len(), 24);
        for flat in 0..rm.len() {
            let idx = rm.unflatten(flat);
            assert_eq!(rm.flatten(&idx), flat);
        }
    }

    #[test]
    fn row_major_strides_row_major_order() {
        let rm = RowMajor::new(vec![2, 3]);
        // Fastest-varying axis is the last one.
        assert_eq!(rm.flatten(&[0, 0]), 0);
        assert_eq!(rm.flatten(&[0, 1]), 1);
        assert_eq!(rm.flatten(&[1, 0]), 3);
    }

    #[test]
    fn ceil_div_basic() {
        assert_eq!(ceil_div(10, 3), 4);
        assert_eq!(ceil_div(9, 3), 3);
        assert_eq!(ceil_div(1, 3), 1);
    }
}
