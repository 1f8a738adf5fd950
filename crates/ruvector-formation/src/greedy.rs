//! Nearest-available greedy matcher.
//!
//! Repeatedly commits the globally cheapest remaining (source, target) pair.
//! O(n² log n) and often close to optimal for well-separated formations, but
//! with no optimality guarantee: a crossing-heavy layout can come out far
//! worse than [`HungarianSolver`](crate::hungarian::HungarianSolver). It is
//! only ever used when a caller selects [`MatchingMethod::Greedy`].

use tracing::instrument;

use crate::budget::BudgetEnforcer;
use crate::cost::CostMatrix;
use crate::error::{PlanningError, Result};
use crate::traits::AssignmentSolver;
use crate::types::MatchingMethod;

/// Greedy nearest-available matcher.
///
/// Ties on cost go to the lowest target index, then the lowest source index,
/// so the result is deterministic.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedySolver;

impl AssignmentSolver for GreedySolver {
    #[instrument(skip_all, fields(n = costs.rows()))]
    fn solve(&self, costs: &CostMatrix, budget: &mut BudgetEnforcer) -> Result<Vec<usize>> {
        if !costs.is_square() {
            return Err(PlanningError::AssignmentCardinalityMismatch {
                sources: costs.rows(),
                targets: costs.cols(),
            });
        }
        let n = costs.rows();

        let pairs_bytes = n
            .saturating_mul(n)
            .saturating_mul(std::mem::size_of::<(f64, usize, usize)>());
        budget.check_memory(pairs_bytes)?;

        let mut pairs: Vec<(f64, usize, usize)> = Vec::with_capacity(n * n);
        for i in 0..n {
            for (j, &c) in costs.row(i).iter().enumerate() {
                pairs.push((c, j, i));
            }
        }
        pairs.sort_unstable_by(|a, b| {
            a.0.total_cmp(&b.0)
                .then(a.1.cmp(&b.1))
                .then(a.2.cmp(&b.2))
        });

        let mut mapping = vec![usize::MAX; n];
        let mut source_taken = vec![false; n];
        let mut remaining = n;
        for (_, j, i) in pairs {
            if remaining == 0 {
                break;
            }
            if mapping[j] != usize::MAX || source_taken[i] {
                continue;
            }
            mapping[j] = i;
            source_taken[i] = true;
            remaining -= 1;
            if remaining % 1024 == 0 {
                budget.check_iteration()?;
            }
        }

        Ok(mapping)
    }

    fn method(&self) -> MatchingMethod {
        MatchingMethod::Greedy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hungarian::HungarianSolver;

    fn total(costs: &CostMatrix, mapping: &[usize]) -> f64 {
        mapping.iter().enumerate().map(|(j, &i)| costs.get(i, j)).sum()
    }

    #[test]
    fn greedy_is_a_permutation() {
        let costs = CostMatrix::from_rows(&[
            vec![3.0, 1.0, 2.0],
            vec![1.0, 3.0, 2.0],
            vec![2.0, 2.0, 1.0],
        ])
        .unwrap();
        let mut mapping = GreedySolver.solve(&costs, &mut BudgetEnforcer::unlimited()).unwrap();
        assert_eq!(mapping, vec![1, 0, 2]);
        mapping.sort_unstable();
        assert_eq!(mapping, vec![0, 1, 2]);
    }

    #[test]
    fn greedy_can_be_suboptimal() {
        // Greedy grabs the 0-cost pair and is forced into the 100-cost one.
        let costs = CostMatrix::from_rows(&[vec![0.0, 1.0], vec![1.0, 100.0]]).unwrap();
        let greedy = GreedySolver.solve(&costs, &mut BudgetEnforcer::unlimited()).unwrap();
        let optimal = HungarianSolver::new()
            .solve(&costs, &mut BudgetEnforcer::unlimited())
            .unwrap();
        assert_eq!(total(&costs, &greedy), 100.0);
        assert_eq!(total(&costs, &optimal), 2.0);
    }
}
