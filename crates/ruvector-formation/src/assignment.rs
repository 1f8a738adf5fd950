//! Cardinality handling around a square [`AssignmentSolver`].
//!
//! Solvers only ever see square matrices. [`solve_assignment`] applies the
//! caller's [`CardinalityPolicy`]: under `Strict` an unequal pair of clouds
//! is an error, under `Partial` the matrix is padded with zero-cost dummies
//! and the dummy matches are reported as unassigned.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::budget::BudgetEnforcer;
use crate::cost::CostMatrix;
use crate::error::{PlanningError, Result};
use crate::traits::AssignmentSolver;

/// How to treat source and target clouds of different sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardinalityPolicy {
    /// Unequal sizes fail with
    /// [`PlanningError::AssignmentCardinalityMismatch`].
    #[default]
    Strict,
    /// Every point of the smaller cloud is matched; surplus points of the
    /// larger cloud are left unassigned.
    Partial,
}

/// Outcome of the matching stage.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Assignment {
    /// `mapping[j]` is the source assigned to target `j`.
    pub mapping: Vec<Option<usize>>,
    /// Sources with no target, ascending.
    pub unmatched_sources: Vec<usize>,
}

impl Assignment {
    /// Number of matched pairs.
    pub fn matched(&self) -> usize {
        self.mapping.iter().flatten().count()
    }
}

/// Match rows (sources) to columns (targets) of `costs` under `policy`.
///
/// # Errors
///
/// Returns [`PlanningError::AssignmentCardinalityMismatch`] for a non-square
/// matrix under [`CardinalityPolicy::Strict`], and propagates any solver
/// failure unchanged.
pub fn solve_assignment(
    costs: &CostMatrix,
    policy: CardinalityPolicy,
    solver: &dyn AssignmentSolver,
    budget: &mut BudgetEnforcer,
) -> Result<Assignment> {
    let sources = costs.rows();
    let targets = costs.cols();

    if costs.is_square() {
        let permutation = solver.solve(costs, budget)?;
        return Ok(Assignment {
            mapping: permutation.into_iter().map(Some).collect(),
            unmatched_sources: Vec::new(),
        });
    }

    if policy == CardinalityPolicy::Strict {
        return Err(PlanningError::AssignmentCardinalityMismatch { sources, targets });
    }

    let side = sources.max(targets);
    budget.check_memory(
        side.saturating_mul(side)
            .saturating_mul(std::mem::size_of::<f64>()),
    )?;
    let padded = costs.padded_square();
    debug!(sources, targets, side, "padded cost matrix for partial matching");

    let permutation = solver.solve(&padded, budget)?;
    if permutation.len() != side {
        return Err(PlanningError::IndexOutOfRange {
            index: permutation.len(),
            len: side,
        });
    }

    let mut source_matched = vec![false; sources];
    let mapping: Vec<Option<usize>> = permutation[..targets]
        .iter()
        .map(|&i| {
            if i < sources {
                source_matched[i] = true;
                Some(i)
            } else {
                None
            }
        })
        .collect();
    let unmatched_sources = source_matched
        .iter()
        .enumerate()
        .filter_map(|(i, &matched)| (!matched).then_some(i))
        .collect();

    Ok(Assignment {
        mapping,
        unmatched_sources,
    })
}
