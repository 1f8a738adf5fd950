//! Strategy traits for the two replaceable planning stages.
//!
//! [`AssignmentSolver`] decides which drone flies to which target;
//! [`DurationModel`] decides how long one point-to-point move takes. The
//! planner only talks to these traits, so alternative matchers or motion
//! profiles plug in without touching the orchestration.

use crate::budget::BudgetEnforcer;
use crate::cost::CostMatrix;
use crate::error::Result;
use crate::types::{KinematicLimits, MatchingMethod, TransitionMethod};

/// Solves a square assignment problem.
pub trait AssignmentSolver: Send + Sync {
    /// Compute a perfect matching over the square matrix `costs`.
    ///
    /// Returns a target-indexed permutation: `result[j]` is the row (source)
    /// assigned to column (target) `j`. Implementations must be deterministic:
    /// the same matrix always yields the same permutation.
    ///
    /// # Errors
    ///
    /// Returns [`PlanningError`](crate::error::PlanningError) on a non-square
    /// matrix or when `budget` is exhausted.
    fn solve(&self, costs: &CostMatrix, budget: &mut BudgetEnforcer) -> Result<Vec<usize>>;

    /// Identifier of this strategy.
    fn method(&self) -> MatchingMethod;
}

/// Computes the minimum duration of a single rest-to-rest move.
pub trait DurationModel: Send + Sync {
    /// Minimum non-negative time (seconds) to traverse `displacement`
    /// (meters, `[dx, dy, dz]`) without exceeding `limits`.
    ///
    /// # Errors
    ///
    /// Returns [`PlanningError::InvalidKinematicLimits`] for unusable limits
    /// and [`PlanningError::InvalidInput`] for a non-finite displacement.
    ///
    /// [`PlanningError::InvalidKinematicLimits`]: crate::error::PlanningError::InvalidKinematicLimits
    /// [`PlanningError::InvalidInput`]: crate::error::PlanningError::InvalidInput
    fn min_duration(&self, displacement: [f64; 3], limits: &KinematicLimits) -> Result<f64>;

    /// Identifier of this motion profile.
    fn method(&self) -> TransitionMethod;
}
