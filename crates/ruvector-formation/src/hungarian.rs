//! Kuhn–Munkres (Hungarian) minimum-cost perfect matching.
//!
//! Solves the square assignment problem in O(n³) time and O(n) scratch space
//! (beyond the cost matrix) using the shortest-augmenting-path formulation
//! with row/column potentials.
//!
//! # Tie-breaking
//!
//! The optimum is rarely unique for symmetric formations. After the primary
//! solve, the final potentials identify the *tight* edges (zero reduced cost,
//! up to the rounding error of the potentials); every perfect matching made
//! only of tight edges is optimal. Costs that differ by more than rounding
//! never count as tied. Among the tight matchings the solver prefers, in
//! order:
//!
//! 1. the fewest displaced indices (`mapping[j] != j`), found by a sparse
//!    Kuhn–Munkres pass over the tight subgraph with 0/1 costs, seeded with
//!    every tight fixed point;
//! 2. the lexicographically smallest mapping, found by walking targets in
//!    order and taking the smallest source reachable through an alternating
//!    cycle of still-tight edges.
//!
//! Both refinement passes are skipped when the tight subgraph is itself a
//! perfect matching, which is the common case for generic inputs. Every step
//! is sequential and index-ordered, so the output is bit-for-bit reproducible.

use tracing::{debug, instrument, trace};

use crate::budget::BudgetEnforcer;
use crate::cost::CostMatrix;
use crate::error::{PlanningError, Result, ValidationError};
use crate::traits::AssignmentSolver;
use crate::types::MatchingMethod;

/// Rounding slack, in ulps per row, under which a reduced cost counts as
/// zero.
const ROUNDING_ULPS: f64 = 8.0;

/// Optimal assignment solver.
///
/// # Example
///
/// ```rust
/// use ruvector_formation::budget::BudgetEnforcer;
/// use ruvector_formation::cost::CostMatrix;
/// use ruvector_formation::hungarian::HungarianSolver;
/// use ruvector_formation::traits::AssignmentSolver;
///
/// let costs = CostMatrix::from_rows(&[
///     vec![4.0, 1.0, 3.0],
///     vec![2.0, 0.0, 5.0],
///     vec![3.0, 2.0, 2.0],
/// ]).unwrap();
///
/// let mapping = HungarianSolver::new()
///     .solve(&costs, &mut BudgetEnforcer::unlimited())
///     .unwrap();
/// // target 0 <- source 1, target 1 <- source 0, target 2 <- source 2
/// assert_eq!(mapping, vec![1, 0, 2]);
/// ```
#[derive(Debug, Clone)]
pub struct HungarianSolver {
    /// Apply the deterministic tie-breaking passes. Disabling them still
    /// yields an optimal, deterministic matching, just not the canonical one.
    pub refine_ties: bool,
}

impl Default for HungarianSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl HungarianSolver {
    pub fn new() -> Self {
        Self { refine_ties: true }
    }

    pub fn without_tie_refinement() -> Self {
        Self { refine_ties: false }
    }
}

impl AssignmentSolver for HungarianSolver {
    #[instrument(skip_all, fields(n = costs.rows()))]
    fn solve(&self, costs: &CostMatrix, budget: &mut BudgetEnforcer) -> Result<Vec<usize>> {
        if !costs.is_square() {
            return Err(PlanningError::AssignmentCardinalityMismatch {
                sources: costs.rows(),
                targets: costs.cols(),
            });
        }
        let n = costs.rows();
        if n == 0 {
            return Ok(Vec::new());
        }

        let (assignment, primary) = shortest_augmenting_path(n, |i, j| costs.get(i, j), budget)?;
        if !self.refine_ties {
            return Ok(assignment);
        }

        let tol = ROUNDING_ULPS * n as f64 * f64::EPSILON * costs.max_entry();
        // Matched edges stay tight even if rounding pushed them over `tol`.
        let tight = tight_columns(n, budget, |i, j| {
            assignment[j] == i || primary.reduced_cost(costs.get(i, j), i, j) <= tol
        })?;

        let tight_edges: usize = tight.iter().map(Vec::len).sum();
        if tight_edges == n {
            trace!("tight subgraph is a perfect matching; optimum is unique");
            return Ok(assignment);
        }
        debug!(tight_edges, "optimum is not unique; breaking ties");

        // Pass 2: fewest displaced indices among tight matchings.
        let displaced = displaced_count(&assignment);
        let (mapping, secondary) = if displaced == 0 {
            (assignment.clone(), None)
        } else {
            let (second, duals) = fewest_displaced(&tight, budget)?;
            debug!(
                before = displaced,
                after = displaced_count(&second),
                "minimised displaced indices"
            );
            (second, Some(duals))
        };

        // Pass 3: lexicographically smallest among matchings that are
        // optimal for both passes.
        let adjacency: Vec<Vec<usize>> = match &secondary {
            None => tight,
            Some(duals) => tight
                .into_iter()
                .enumerate()
                .map(|(j, rows)| {
                    rows.into_iter()
                        .filter(|&i| duals.reduced_cost(unit_cost(i, j), i, j) < 0.5)
                        .collect()
                })
                .collect(),
        };
        let refined = lexicographic_minimum(mapping, &adjacency, budget)?;

        let primary_total = mapping_cost(costs, &assignment);
        let refined_total = mapping_cost(costs, &refined);
        if refined_total > primary_total + n as f64 * tol {
            debug!(primary_total, refined_total, "refinement lost optimality; keeping primary");
            return Ok(assignment);
        }
        Ok(refined)
    }

    fn method(&self) -> MatchingMethod {
        MatchingMethod::Optimal
    }
}

// ---------------------------------------------------------------------------
// Core Kuhn–Munkres
// ---------------------------------------------------------------------------

/// Dual potentials of one Kuhn–Munkres pass, indexed by row and column.
struct Potentials {
    u: Vec<f64>,
    v: Vec<f64>,
}

impl Potentials {
    #[inline]
    fn reduced_cost(&self, cost: f64, i: usize, j: usize) -> f64 {
        cost - self.u[i] - self.v[j]
    }
}

fn no_augmenting_path(row: usize) -> PlanningError {
    ValidationError::ParameterOutOfRange {
        name: "cost matrix".into(),
        value: format!("row {row}"),
        expected: "finite costs admitting an augmenting path".into(),
    }
    .into()
}

/// Shortest-augmenting-path Hungarian method over an `n x n` cost function.
///
/// Adds one row per outer iteration, growing a Dijkstra-like tree over
/// columns until a free column is reached, then flips the path. Among
/// columns at the same distance a free one wins, then the lowest index; on
/// tied formations this ends most searches after one scan. Returns the
/// column-indexed assignment (`assignment[j]` = row matched to column `j`)
/// and the final potentials.
fn shortest_augmenting_path<F>(
    n: usize,
    cost: F,
    budget: &mut BudgetEnforcer,
) -> Result<(Vec<usize>, Potentials)>
where
    F: Fn(usize, usize) -> f64,
{
    // 1-based: index 0 is the virtual column holding the row being added.
    let mut u = vec![0.0f64; n + 1];
    let mut v = vec![0.0f64; n + 1];
    let mut p = vec![0usize; n + 1];
    let mut way = vec![0usize; n + 1];
    let mut minv = vec![f64::INFINITY; n + 1];
    let mut used = vec![false; n + 1];

    for row in 1..=n {
        budget.check_iteration()?;

        p[0] = row;
        let mut j0 = 0usize;
        minv.fill(f64::INFINITY);
        used.fill(false);

        loop {
            used[j0] = true;
            let i0 = p[j0];
            let mut delta = f64::INFINITY;
            let mut j1 = 0usize;

            for j in 1..=n {
                if used[j] {
                    continue;
                }
                let cur = cost(i0 - 1, j - 1) - u[i0] - v[j];
                if cur < minv[j] {
                    minv[j] = cur;
                    way[j] = j0;
                }
                if minv[j] < delta
                    || (minv[j] == delta && delta.is_finite() && p[j] == 0 && p[j1] != 0)
                {
                    delta = minv[j];
                    j1 = j;
                }
            }

            if j1 == 0 {
                return Err(no_augmenting_path(i0 - 1));
            }

            for j in 0..=n {
                if used[j] {
                    u[p[j]] += delta;
                    v[j] -= delta;
                } else {
                    minv[j] -= delta;
                }
            }

            j0 = j1;
            if p[j0] == 0 {
                break;
            }
        }

        // Flip the augmenting path.
        loop {
            let j1 = way[j0];
            p[j0] = p[j1];
            j0 = j1;
            if j0 == 0 {
                break;
            }
        }
    }

    let assignment = p[1..].iter().map(|&row| row - 1).collect();
    let potentials = Potentials {
        u: u[1..].to_vec(),
        v: v[1..].to_vec(),
    };
    Ok((assignment, potentials))
}

// ---------------------------------------------------------------------------
// Tie-breaking helpers
// ---------------------------------------------------------------------------

/// Cost of an edge in the displaced-index pass.
#[inline]
fn unit_cost(i: usize, j: usize) -> f64 {
    if i == j {
        0.0
    } else {
        1.0
    }
}

fn displaced_count(mapping: &[usize]) -> usize {
    mapping.iter().enumerate().filter(|&(j, &i)| i != j).count()
}

fn mapping_cost(costs: &CostMatrix, mapping: &[usize]) -> f64 {
    mapping.iter().enumerate().map(|(j, &i)| costs.get(i, j)).sum()
}

/// Ascending rows per column for which `tight(row, column)` holds. The
/// lists are charged to the memory budget as they are built.
fn tight_columns(
    n: usize,
    budget: &mut BudgetEnforcer,
    tight: impl Fn(usize, usize) -> bool,
) -> Result<Vec<Vec<usize>>> {
    let mut columns = Vec::with_capacity(n);
    for j in 0..n {
        budget.check_iteration()?;
        let rows: Vec<usize> = (0..n).filter(|&i| tight(i, j)).collect();
        budget.check_memory(rows.len() * std::mem::size_of::<usize>())?;
        columns.push(rows);
    }
    Ok(columns)
}

/// Minimum-displacement perfect matching of the tight subgraph (`tight[j]` =
/// rows allowed for column `j`), with the potentials that certify it.
///
/// Sparse shortest augmenting paths over 0/1 costs. Every tight fixed point
/// starts matched at zero potential, so only the remaining rows need a
/// search, and each search only touches columns reachable through tight
/// edges. The tight subgraph must contain a perfect matching.
fn fewest_displaced(
    tight: &[Vec<usize>],
    budget: &mut BudgetEnforcer,
) -> Result<(Vec<usize>, Potentials)> {
    let n = tight.len();

    let edges: usize = tight.iter().map(Vec::len).sum();
    budget.check_memory(edges * std::mem::size_of::<usize>())?;
    let mut by_row: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (j, rows) in tight.iter().enumerate() {
        for &i in rows {
            by_row[i].push(j);
        }
    }

    let mut u = vec![0.0f64; n];
    let mut v = vec![0.0f64; n];
    // owner[j] = row matched to column j; matched[i] = column matched to row i.
    let mut owner: Vec<Option<usize>> = vec![None; n];
    let mut matched: Vec<Option<usize>> = vec![None; n];
    for (j, rows) in tight.iter().enumerate() {
        if rows.binary_search(&j).is_ok() {
            owner[j] = Some(j);
            matched[j] = Some(j);
        }
    }

    let mut dist = vec![f64::INFINITY; n];
    let mut pred = vec![0usize; n];
    let mut settled = vec![false; n];
    let mut touched: Vec<usize> = Vec::new();
    let mut order: Vec<usize> = Vec::new();

    for root in 0..n {
        if matched[root].is_some() {
            continue;
        }
        budget.check_iteration()?;

        for &j in &touched {
            dist[j] = f64::INFINITY;
            settled[j] = false;
        }
        touched.clear();
        order.clear();

        let mut row = root;
        let mut base = 0.0f64;
        let sink = loop {
            for &j in &by_row[row] {
                if settled[j] {
                    continue;
                }
                let d = base + unit_cost(row, j) - u[row] - v[j];
                if d < dist[j] {
                    if dist[j] == f64::INFINITY {
                        touched.push(j);
                    }
                    dist[j] = d;
                    pred[j] = row;
                }
            }

            // Nearest unsettled column; free columns win ties, then the
            // lowest index.
            let mut best: Option<usize> = None;
            for &j in &touched {
                if settled[j] {
                    continue;
                }
                let better = match best {
                    None => true,
                    Some(b) => {
                        dist[j] < dist[b]
                            || (dist[j] == dist[b]
                                && (owner[j].is_none(), std::cmp::Reverse(j))
                                    > (owner[b].is_none(), std::cmp::Reverse(b)))
                    }
                };
                if better {
                    best = Some(j);
                }
            }
            let Some(col) = best else {
                return Err(no_augmenting_path(root));
            };

            settled[col] = true;
            order.push(col);
            match owner[col] {
                None => break col,
                Some(next) => {
                    row = next;
                    base = dist[col];
                }
            }
        };

        let reach = dist[sink];
        u[root] += reach;
        for &j in &order {
            // The sink is still free here, so only tree columns move.
            if let Some(i) = owner[j] {
                let gain = reach - dist[j];
                u[i] += gain;
                v[j] -= gain;
            }
        }

        // Flip the path back to the root.
        let mut col = sink;
        loop {
            let row = pred[col];
            let previous = matched[row];
            owner[col] = Some(row);
            matched[row] = Some(col);
            match previous {
                Some(p) => col = p,
                None => break,
            }
        }
    }

    let mut mapping = vec![0usize; n];
    for (i, col) in matched.iter().enumerate() {
        match col {
            Some(j) => mapping[*j] = i,
            None => return Err(no_augmenting_path(i)),
        }
    }
    Ok((mapping, Potentials { u, v }))
}

/// Rewrite `mapping` into the lexicographically smallest perfect matching of
/// the bipartite graph `adjacency` (`adjacency[j]` = ascending rows allowed
/// for column `j`). `mapping` must already be a perfect matching of it.
fn lexicographic_minimum(
    mut mapping: Vec<usize>,
    adjacency: &[Vec<usize>],
    budget: &mut BudgetEnforcer,
) -> Result<Vec<usize>> {
    let n = mapping.len();
    let extra: usize = adjacency.iter().map(Vec::len).sum::<usize>().saturating_sub(n);
    if extra == 0 {
        return Ok(mapping);
    }

    let mut owner = vec![0usize; n];
    for (j, &i) in mapping.iter().enumerate() {
        owner[i] = j;
    }

    let mut stamp = vec![0usize; n];
    let mut epoch = 0usize;
    let mut stack: Vec<(usize, usize, usize)> = Vec::new();

    for j in 0..n {
        budget.check_iteration()?;

        let current = mapping[j];
        for &candidate in &adjacency[j] {
            if candidate >= current {
                break;
            }
            let holder = owner[candidate];
            if holder < j {
                continue;
            }

            // Search for an alternating cycle: `holder` gives up `candidate`
            // and takes another row, whose holder does the same, until some
            // column takes `current`, which `j` just released.
            epoch += 1;
            stack.clear();
            stamp[holder] = epoch;
            // (column, next adjacency cursor, row chosen for column)
            stack.push((holder, 0, usize::MAX));
            let mut found = false;

            while let Some(frame) = stack.last_mut() {
                let (col, cursor, _) = *frame;
                let Some(&row) = adjacency[col].get(cursor) else {
                    stack.pop();
                    continue;
                };
                frame.1 += 1;

                if row == candidate {
                    continue;
                }
                if row == current {
                    frame.2 = row;
                    found = true;
                    break;
                }
                let next = owner[row];
                if next <= j || stamp[next] == epoch {
                    continue;
                }
                frame.2 = row;
                stamp[next] = epoch;
                stack.push((next, 0, usize::MAX));
            }

            if found {
                for &(col, _, row) in &stack {
                    mapping[col] = row;
                    owner[row] = col;
                }
                mapping[j] = candidate;
                owner[candidate] = j;
                break;
            }
        }
    }

    Ok(mapping)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::PlanningBudget;
    use std::time::Duration;

    fn solve(rows: &[Vec<f64>]) -> Vec<usize> {
        let costs = CostMatrix::from_rows(rows).unwrap();
        HungarianSolver::new()
            .solve(&costs, &mut BudgetEnforcer::unlimited())
            .unwrap()
    }

    #[test]
    fn empty_matrix() {
        assert!(solve(&[]).is_empty());
    }

    #[test]
    fn single_entry() {
        assert_eq!(solve(&[vec![7.0]]), vec![0]);
    }

    #[test]
    fn classic_three_by_three() {
        // Rows are sources, columns targets.
        let mapping = solve(&[
            vec![4.0, 1.0, 3.0],
            vec![2.0, 0.0, 5.0],
            vec![3.0, 2.0, 2.0],
        ]);
        assert_eq!(mapping, vec![1, 0, 2]);
    }

    #[test]
    fn all_equal_costs_prefer_identity() {
        let mapping = solve(&vec![vec![1.0; 5]; 5]);
        assert_eq!(mapping, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn derangement_ties_pick_lexicographic_minimum() {
        // Diagonal is expensive; both 3-cycles cost 3.
        let mapping = solve(&[
            vec![10.0, 1.0, 1.0],
            vec![1.0, 10.0, 1.0],
            vec![1.0, 1.0, 10.0],
        ]);
        assert_eq!(mapping, vec![1, 2, 0]);
    }

    #[test]
    fn fewer_displaced_beats_lexicographic_order() {
        // Optimal mappings: [1, 2, 0] (3 displaced) and [2, 1, 0] (2 displaced).
        let mut rows = vec![vec![5.0; 3]; 3];
        for (source, target) in [(1, 0), (2, 1), (0, 2), (2, 0), (1, 1)] {
            rows[source][target] = 1.0;
        }
        assert_eq!(solve(&rows), vec![2, 1, 0]);
    }

    #[test]
    fn non_square_is_cardinality_mismatch() {
        let costs = CostMatrix::from_rows(&[vec![1.0, 2.0]]).unwrap();
        let err = HungarianSolver::new()
            .solve(&costs, &mut BudgetEnforcer::unlimited())
            .unwrap_err();
        assert!(matches!(
            err,
            PlanningError::AssignmentCardinalityMismatch { sources: 1, targets: 2 }
        ));
    }

    #[test]
    fn lexicographic_pass_on_full_graph() {
        let adjacency = vec![vec![0, 1, 2]; 3];
        let mapping =
            lexicographic_minimum(vec![2, 0, 1], &adjacency, &mut BudgetEnforcer::unlimited());
        assert_eq!(mapping.unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn lexicographic_pass_respects_missing_edges() {
        // Column 0 may only take row 1 or 2, column 1 only row 0 or 2.
        let adjacency = vec![vec![1, 2], vec![0, 2], vec![0, 1, 2]];
        let mapping =
            lexicographic_minimum(vec![2, 0, 1], &adjacency, &mut BudgetEnforcer::unlimited());
        assert_eq!(mapping.unwrap(), vec![1, 0, 2]);
    }

    #[test]
    fn lexicographic_pass_checks_the_budget() {
        let mut expired = BudgetEnforcer::new(PlanningBudget {
            max_time: Duration::from_nanos(1),
            ..PlanningBudget::default()
        });
        std::thread::sleep(Duration::from_micros(10));

        let adjacency = vec![vec![0, 1, 2]; 3];
        let err = lexicographic_minimum(vec![2, 0, 1], &adjacency, &mut expired).unwrap_err();
        assert!(matches!(err, PlanningError::BudgetExhausted { .. }));
    }

    #[test]
    fn near_tie_is_not_a_tie() {
        // Swapping costs exactly 2.0; the identity costs 1e-10 more and
        // must not win on displaced indices.
        let mapping = solve(&[vec![1.0, 1.0], vec![1.0, 1.0 + 1e-10]]);
        assert_eq!(mapping, vec![1, 0]);
    }

    #[test]
    fn displaced_pass_reroutes_seeded_fixed_points() {
        // Every mapping is tight. Fixed points 0 and 1 are seeded; row 2 has
        // no tight diagonal and must displace exactly one of them.
        let tight = vec![vec![0, 2], vec![1, 2], vec![0, 1]];
        let (mapping, duals) =
            fewest_displaced(&tight, &mut BudgetEnforcer::unlimited()).unwrap();
        assert_eq!(displaced_count(&mapping), 2);
        for (j, &i) in mapping.iter().enumerate() {
            assert_eq!(duals.reduced_cost(unit_cost(i, j), i, j), 0.0);
        }
    }

    #[test]
    fn coincident_blocks_break_ties_canonically() {
        // Two stacks of identical rows: any order inside a block is optimal.
        let half = 40;
        let rows: Vec<Vec<f64>> = (0..2 * half)
            .map(|i| {
                (0..2 * half)
                    .map(|j| if (i < half) == (j < half) { 9.0 } else { 1.0 })
                    .collect()
            })
            .collect();
        let expected: Vec<usize> = (0..2 * half).map(|j| (j + half) % (2 * half)).collect();
        assert_eq!(solve(&rows), expected);
    }

    #[test]
    fn unrefined_solver_is_still_optimal() {
        let rows = vec![
            vec![10.0, 1.0, 1.0],
            vec![1.0, 10.0, 1.0],
            vec![1.0, 1.0, 10.0],
        ];
        let costs = CostMatrix::from_rows(&rows).unwrap();
        let mapping = HungarianSolver::without_tie_refinement()
            .solve(&costs, &mut BudgetEnforcer::unlimited())
            .unwrap();
        let total: f64 = mapping.iter().enumerate().map(|(j, &i)| rows[i][j]).sum();
        assert_eq!(total, 3.0);
    }
}
