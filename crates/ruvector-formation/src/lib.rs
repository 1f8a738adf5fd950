//! Formation transition planning for drone swarms.
//!
//! Given the positions a swarm occupies now (the source formation) and the
//! positions it should occupy next (the target formation), this crate decides
//! which drone flies to which target and how long each move takes.
//!
//! - Matching is a true minimum-total-distance assignment (Kuhn–Munkres,
//!   O(n³)) with deterministic tie-breaking. A greedy matcher exists as a
//!   separately selected fast path and is never substituted silently.
//! - Durations come from a bounded-jerk S-curve profile that starts and ends
//!   at rest, with independent horizontal and vertical ceilings.
//! - Durations can be synchronised so the whole swarm arrives together.
//!
//! # Modules
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`types`] | [`Point3D`], [`PointCloud`], [`KinematicLimits`], [`TransitionPlan`] |
//! | [`cost`] | [`CostMatrix`] and [`CostMetric`] |
//! | [`hungarian`] | [`HungarianSolver`] |
//! | [`greedy`] | [`GreedySolver`] |
//! | [`assignment`] | strict / partial cardinality handling |
//! | [`kinematics`] | [`ConstJerkProfile`] |
//! | [`planner`] | [`PlannerConfig`], [`TransitionPlanner`] |
//! | [`events`], [`audit`] | observability |
//!
//! # Features
//!
//! - `parallel` (default): build cost matrices and time pairs on the rayon
//!   thread pool. Output is identical with and without it.
//!
//! # Example
//!
//! ```rust
//! use ruvector_formation::{
//!     KinematicLimits, MatchingMethod, PlannerConfig, PointCloud, SyncMode, TransitionPlanner,
//! };
//!
//! let source = PointCloud::from_triples(&[[0.0, 0.0, 0.0], [1.0, 2.0, 3.0], [0.0, 10.0, 20.0]])
//!     .unwrap();
//! let target = PointCloud::from_triples(&[[0.0, 2.0, 0.0], [0.0, 10.0, 2.0], [1.0, 0.0, 3.0]])
//!     .unwrap();
//! let limits = KinematicLimits::new(5.0, 5.0, 3.0);
//!
//! let planner = TransitionPlanner::new(PlannerConfig::new(
//!     MatchingMethod::Optimal,
//!     SyncMode::Independent,
//! ));
//! let plan = planner.plan(&source, &target, &limits).unwrap();
//!
//! assert_eq!(plan.len(), 3);
//! assert!(plan.durations.iter().flatten().all(|&d| d >= 0.0));
//! ```

pub mod assignment;
pub mod audit;
pub mod budget;
pub mod cost;
pub mod error;
pub mod events;
pub mod greedy;
pub mod hungarian;
pub mod kinematics;
pub mod planner;
pub mod traits;
pub mod types;
pub mod validation;

pub use assignment::{solve_assignment, Assignment, CardinalityPolicy};
pub use budget::{BudgetEnforcer, PlanningBudget};
pub use cost::{CostMatrix, CostMetric};
pub use error::{PlanningError, Result, ValidationError};
pub use events::PlanningEvent;
pub use greedy::GreedySolver;
pub use hungarian::HungarianSolver;
pub use kinematics::{AxisLimits, ConstJerkProfile, Regime};
pub use planner::{plan_transition, PlannerConfig, SyncMode, TransitionPlanner, UnmatchedPolicy};
pub use traits::{AssignmentSolver, DurationModel};
pub use types::{
    KinematicLimits, MatchingMethod, Point3D, PointCloud, TransitionMethod, TransitionPlan,
};
