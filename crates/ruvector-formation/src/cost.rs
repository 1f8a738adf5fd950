//! Dense pairwise cost matrix between two formations.
//!
//! Entry `(i, j)` is the cost of moving source point `i` to target point `j`.
//! The matrix is built once per planning call and is read-only afterwards.
//!
//! Straight-line distance is the default metric. Squared distance is offered
//! as a separate, explicitly selected objective: it is monotonic per pair, but
//! a minimum sum of squares is not in general a minimum sum of distances (it
//! penalises long moves harder), so it is never substituted silently.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::budget::BudgetEnforcer;
use crate::error::{PlanningError, Result};
use crate::types::PointCloud;
use crate::validation::validate_costs;

/// Pairwise cost function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostMetric {
    /// Straight-line distance in meters.
    #[default]
    Euclidean,
    /// Squared straight-line distance; minimises the sum of squared moves.
    SquaredEuclidean,
}

impl std::fmt::Display for CostMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CostMetric::Euclidean => write!(f, "euclidean"),
            CostMetric::SquaredEuclidean => write!(f, "squared-euclidean"),
        }
    }
}

/// Row-major dense `rows x cols` matrix of finite, non-negative costs.
///
/// Rows index source points, columns index target points. Dimensions always
/// equal `(source.len(), target.len())` of the clouds it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct CostMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl CostMatrix {
    /// Wrap an existing row-major buffer.
    ///
    /// # Errors
    ///
    /// Returns [`PlanningError::InvalidInput`] if the buffer length does not
    /// equal `rows * cols` or any entry is negative or not finite.
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        validate_costs(rows, cols, &data)?;
        Ok(Self { rows, cols, data })
    }

    /// Build from nested rows; convenient for small literal fixtures.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        if let Some(bad) = rows.iter().position(|r| r.len() != cols) {
            return Err(crate::error::ValidationError::DimensionMismatch(format!(
                "row {bad} has {} entries, expected {cols}",
                rows[bad].len(),
            ))
            .into());
        }
        Self::new(rows.len(), cols, rows.concat())
    }

    /// Compute the cost of moving every source point to every target point.
    ///
    /// The allocation is charged to `budget` before it happens. With the
    /// `parallel` feature, rows are filled concurrently; each entry depends
    /// only on its own pair, so the result is identical to the sequential
    /// build.
    ///
    /// # Errors
    ///
    /// Returns [`PlanningError::BudgetExhausted`] if the matrix would exceed
    /// the memory budget.
    pub fn build(
        source: &PointCloud,
        target: &PointCloud,
        metric: CostMetric,
        budget: &mut BudgetEnforcer,
    ) -> Result<Self> {
        let rows = source.len();
        let cols = target.len();
        let bytes = rows
            .saturating_mul(cols)
            .saturating_mul(std::mem::size_of::<f64>());
        budget.check_memory(bytes)?;

        let mut data = vec![0.0f64; rows * cols];
        let src = source.as_slice();
        let dst = target.as_slice();

        let fill_row = |i: usize, row: &mut [f64]| {
            let a = &src[i];
            for (slot, b) in row.iter_mut().zip(dst) {
                *slot = match metric {
                    CostMetric::Euclidean => a.distance_to(b),
                    CostMetric::SquaredEuclidean => a.squared_distance_to(b),
                };
            }
        };

        if cols > 0 {
            #[cfg(feature = "parallel")]
            {
                use rayon::prelude::*;
                data.par_chunks_mut(cols)
                    .enumerate()
                    .for_each(|(i, row)| fill_row(i, row));
            }

            #[cfg(not(feature = "parallel"))]
            for (i, row) in data.chunks_mut(cols).enumerate() {
                fill_row(i, row);
            }
        }

        debug!(rows, cols, %metric, "cost matrix built");
        Ok(Self { rows, cols, data })
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// Entry `(row, col)`. Callers inside the crate guarantee bounds.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        debug_assert!(row < self.rows && col < self.cols);
        self.data[row * self.cols + col]
    }

    /// Bounds-checked entry access.
    ///
    /// # Errors
    ///
    /// Returns [`PlanningError::IndexOutOfRange`] for the offending index.
    pub fn try_get(&self, row: usize, col: usize) -> Result<f64> {
        if row >= self.rows {
            return Err(PlanningError::IndexOutOfRange { index: row, len: self.rows });
        }
        if col >= self.cols {
            return Err(PlanningError::IndexOutOfRange { index: col, len: self.cols });
        }
        Ok(self.get(row, col))
    }

    /// Costs from source `row` to every target.
    #[inline]
    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    /// Largest entry, or `0.0` for an empty matrix.
    pub fn max_entry(&self) -> f64 {
        self.data.iter().copied().fold(0.0, f64::max)
    }

    /// Square copy of side `max(rows, cols)`; the added rows/columns are
    /// zero-cost dummies.
    pub fn padded_square(&self) -> CostMatrix {
        let n = self.rows.max(self.cols);
        let mut data = vec![0.0f64; n * n];
        for i in 0..self.rows {
            data[i * n..i * n + self.cols].copy_from_slice(self.row(i));
        }
        CostMatrix { rows: n, cols: n, data }
    }

    /// Total cost of a target-indexed mapping (`mapping[j]` = source of `j`).
    /// Unassigned and out-of-range entries contribute nothing.
    pub fn total_cost(&self, mapping: &[Option<usize>]) -> f64 {
        mapping
            .iter()
            .enumerate()
            .filter_map(|(j, s)| match s {
                Some(i) if *i < self.rows && j < self.cols => Some(self.get(*i, j)),
                _ => None,
            })
            .sum()
    }
}
