//! Bipartite matching between tracks (rows) and detections (columns).

use munkres::{solve_assignment, WeightMatrix};

use crate::cost::CostMatrix;
use crate::error::Error;

/// Cost of pairing a real row or column with a padding one; any constant
/// works since every complete matching uses the same number of them.
const PADDING_COST: f32 = 1.0;

pub trait AssignmentSolver {
    /// Returns `(row, column)` pairs, each row and column at most once,
    /// chosen to maximize the summed affinity. Pairs come back sorted by row.
    fn solve(&self, affinity: &CostMatrix) -> Result<Vec<(usize, usize)>, Error>;
}

/// Optimal assignment through the Hungarian (Kuhn-Munkres) method.
#[derive(Debug, Default, Clone, Copy)]
pub struct MunkresSolver;

impl AssignmentSolver for MunkresSolver {
    fn solve(&self, affinity: &CostMatrix) -> Result<Vec<(usize, usize)>, Error> {
        let (rows, cols) = (affinity.nrows(), affinity.ncols());

        if rows == 0 || cols == 0 {
            return Ok(Vec::new());
        }

        let m = affinity.view();
        let n = rows.max(cols);

        let mut weights = WeightMatrix::from_fn(n, |(r, c)| {
            if r < rows && c < cols {
                1.0 - m[(r, c)]
            } else {
                PADDING_COST
            }
        });

        let positions = solve_assignment(&mut weights)
            .map_err(|err| Error::Assignment(format!("{:?}", err)))?;

        let mut pairs: Vec<_> = positions
            .into_iter()
            .filter(|p| p.row < rows && p.column < cols)
            .map(|p| (p.row, p.column))
            .collect();

        pairs.sort_unstable();

        Ok(pairs)
    }
}

/// Picks the best remaining pair first. Not optimal, but cheap on large
/// and sparse matrices. Zero-affinity pairs are never proposed.
#[derive(Debug, Default, Clone, Copy)]
pub struct GreedySolver;

impl AssignmentSolver for GreedySolver {
    fn solve(&self, affinity: &CostMatrix) -> Result<Vec<(usize, usize)>, Error> {
        let (rows, cols) = (affinity.nrows(), affinity.ncols());
        let m = affinity.view();

        let mut candidates: Vec<(f32, usize, usize)> = m
            .indexed_iter()
            .filter(|(_, &v)| v > 0.0)
            .map(|((r, c), &v)| (v, r, c))
            .collect();

        // Stable sort keeps row-major order among equal affinities
        candidates.sort_by(|a, b| b.0.total_cmp(&a.0));

        let mut used_rows = vec![false; rows];
        let mut used_cols = vec![false; cols];
        let mut pairs = Vec::new();

        for (_, r, c) in candidates {
            if !used_rows[r] && !used_cols[c] {
                used_rows[r] = true;
                used_cols[c] = true;
                pairs.push((r, c));
            }
        }

        pairs.sort_unstable();

        Ok(pairs)
    }
}
