//! Transition planner: configuration and orchestration.
//!
//! [`TransitionPlanner`] runs the whole pipeline for one pair of formations:
//!
//! 1. validate limits and configuration,
//! 2. build the [`CostMatrix`],
//! 3. match sources to targets ([`solve_assignment`]),
//! 4. time every matched pair with the configured [`DurationModel`],
//! 5. reconcile durations (synchronisation, rounding, unmatched slots),
//! 6. validate and return the [`TransitionPlan`].
//!
//! Any stage failure is returned unchanged. In particular a failing optimal
//! matcher is never replaced by the greedy one.
//!
//! # Example
//!
//! ```
//! use ruvector_formation::{
//!     KinematicLimits, MatchingMethod, PlannerConfig, PointCloud, SyncMode, TransitionPlanner,
//! };
//!
//! let source = PointCloud::from_triples(&[[0.0, 0.0, 0.0], [10.0, 0.0, 0.0]]).unwrap();
//! let target = PointCloud::from_triples(&[[10.0, 0.0, 5.0], [0.0, 0.0, 5.0]]).unwrap();
//! let limits = KinematicLimits::new(5.0, 2.0, 3.0);
//!
//! let planner = TransitionPlanner::new(PlannerConfig::new(
//!     MatchingMethod::Optimal,
//!     SyncMode::Synchronized,
//! ));
//! let plan = planner.plan(&source, &target, &limits).unwrap();
//!
//! assert_eq!(plan.mapping, vec![Some(1), Some(0)]);
//! assert_eq!(plan.durations[0], plan.durations[1]);
//! ```

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::assignment::{solve_assignment, CardinalityPolicy};
use crate::budget::{BudgetEnforcer, PlanningBudget};
use crate::cost::{CostMatrix, CostMetric};
use crate::error::Result;
use crate::events::PlanningEvent;
use crate::greedy::GreedySolver;
use crate::hungarian::HungarianSolver;
use crate::kinematics::{quantize_up, ConstJerkProfile};
use crate::traits::{AssignmentSolver, DurationModel};
use crate::types::{KinematicLimits, MatchingMethod, PointCloud, TransitionMethod, TransitionPlan};
use crate::validation::{validate_plan, validate_time_quantum};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// How per-drone durations are reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// Every drone keeps its own minimum duration.
    Independent,
    /// Every matched drone, stationary ones included, gets the longest
    /// duration, so the swarm arrives together.
    Synchronized,
}

/// What an empty target slot reports as its duration under partial
/// matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedPolicy {
    /// The slot is reported as "no movement": duration `0.0`.
    #[default]
    Stationary,
    /// The slot has no duration (`None`).
    Omitted,
}

/// Per-call planner configuration.
///
/// `matching` and `sync` have no defaults and must always be chosen by the
/// caller. Everything else defaults as documented on each field, also when
/// deserialising.
///
/// ```
/// use ruvector_formation::PlannerConfig;
///
/// let config: PlannerConfig = serde_json::from_str(
///     r#"{"matching": "optimal", "sync": "synchronized", "time_quantum": 0.04}"#,
/// ).unwrap();
/// assert_eq!(config.time_quantum, Some(0.04));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerConfig {
    pub matching: MatchingMethod,
    pub sync: SyncMode,
    /// Default: [`TransitionMethod::ConstJerk`].
    #[serde(default)]
    pub transition: TransitionMethod,
    /// Default: [`CardinalityPolicy::Strict`].
    #[serde(default)]
    pub cardinality: CardinalityPolicy,
    /// Default: [`UnmatchedPolicy::Stationary`].
    #[serde(default)]
    pub unmatched: UnmatchedPolicy,
    /// Default: [`CostMetric::Euclidean`].
    #[serde(default)]
    pub metric: CostMetric,
    /// Round every duration up to a multiple of this many seconds (for
    /// example one animation frame). Default: no rounding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_quantum: Option<f64>,
    #[serde(default)]
    pub budget: PlanningBudget,
}

impl PlannerConfig {
    pub fn new(matching: MatchingMethod, sync: SyncMode) -> Self {
        Self {
            matching,
            sync,
            transition: TransitionMethod::default(),
            cardinality: CardinalityPolicy::default(),
            unmatched: UnmatchedPolicy::default(),
            metric: CostMetric::default(),
            time_quantum: None,
            budget: PlanningBudget::default(),
        }
    }

    pub fn with_transition(mut self, transition: TransitionMethod) -> Self {
        self.transition = transition;
        self
    }

    pub fn with_cardinality(mut self, cardinality: CardinalityPolicy) -> Self {
        self.cardinality = cardinality;
        self
    }

    pub fn with_unmatched(mut self, unmatched: UnmatchedPolicy) -> Self {
        self.unmatched = unmatched;
        self
    }

    pub fn with_metric(mut self, metric: CostMetric) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_time_quantum(mut self, quantum: f64) -> Self {
        self.time_quantum = Some(quantum);
        self
    }

    pub fn with_budget(mut self, budget: PlanningBudget) -> Self {
        self.budget = budget;
        self
    }
}

fn solver_for(method: MatchingMethod) -> Box<dyn AssignmentSolver> {
    match method {
        MatchingMethod::Optimal => Box::new(HungarianSolver::new()),
        MatchingMethod::Greedy => Box::new(GreedySolver),
    }
}

fn duration_model_for(method: TransitionMethod) -> Box<dyn DurationModel> {
    match method {
        TransitionMethod::ConstJerk => Box::new(ConstJerkProfile),
    }
}

// ---------------------------------------------------------------------------
// TransitionPlanner
// ---------------------------------------------------------------------------

/// Plans transitions between formations under one [`PlannerConfig`].
///
/// The planner holds no state besides its configuration; every call is a
/// pure function of its arguments, so identical calls return identical
/// plans.
#[derive(Debug, Clone)]
pub struct TransitionPlanner {
    config: PlannerConfig,
}

impl TransitionPlanner {
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Plan the transition from `source` to `target`.
    ///
    /// # Errors
    ///
    /// - [`PlanningError::InvalidKinematicLimits`] for unusable `limits`.
    /// - [`PlanningError::InvalidInput`] for a bad `time_quantum`.
    /// - [`PlanningError::AssignmentCardinalityMismatch`] for clouds of
    ///   different sizes under [`CardinalityPolicy::Strict`].
    /// - [`PlanningError::BudgetExhausted`] when the budget runs out.
    ///
    /// [`PlanningError::InvalidKinematicLimits`]: crate::error::PlanningError::InvalidKinematicLimits
    /// [`PlanningError::InvalidInput`]: crate::error::PlanningError::InvalidInput
    /// [`PlanningError::AssignmentCardinalityMismatch`]: crate::error::PlanningError::AssignmentCardinalityMismatch
    /// [`PlanningError::BudgetExhausted`]: crate::error::PlanningError::BudgetExhausted
    pub fn plan(
        &self,
        source: &PointCloud,
        target: &PointCloud,
        limits: &KinematicLimits,
    ) -> Result<TransitionPlan> {
        let mut events = Vec::new();
        self.plan_traced(source, target, limits, &mut events)
    }

    /// Like [`plan`](Self::plan), appending one [`PlanningEvent`] per stage
    /// to `events`. The last event appended is always terminal.
    #[instrument(skip_all, fields(
        sources = source.len(),
        targets = target.len(),
        matching = %self.config.matching,
    ))]
    pub fn plan_traced(
        &self,
        source: &PointCloud,
        target: &PointCloud,
        limits: &KinematicLimits,
        events: &mut Vec<PlanningEvent>,
    ) -> Result<TransitionPlan> {
        let start = Instant::now();
        let result = self.run(source, target, limits, events);

        match &result {
            Ok(plan) => {
                let makespan = plan.makespan();
                info!(
                    targets = plan.len(),
                    makespan,
                    unmatched = plan.unmatched_sources.len(),
                    elapsed = ?start.elapsed(),
                    "transition planned",
                );
                events.push(PlanningEvent::PlanCompleted {
                    targets: plan.len(),
                    makespan,
                    wall_time: start.elapsed(),
                });
            }
            Err(e) => {
                warn!(error = %e, "transition planning failed");
                events.push(PlanningEvent::PlanFailed {
                    reason: e.to_string(),
                    elapsed: start.elapsed(),
                });
            }
        }

        result
    }

    fn run(
        &self,
        source: &PointCloud,
        target: &PointCloud,
        limits: &KinematicLimits,
        events: &mut Vec<PlanningEvent>,
    ) -> Result<TransitionPlan> {
        let config = &self.config;
        limits.validate()?;
        validate_time_quantum(config.time_quantum)?;

        events.push(PlanningEvent::PlanRequested {
            sources: source.len(),
            targets: target.len(),
            matching: config.matching,
            sync: config.sync,
            cardinality: config.cardinality,
        });

        if source.is_empty() && target.is_empty() {
            debug!("empty formations; nothing to plan");
            return Ok(TransitionPlan::default());
        }

        let mut budget = BudgetEnforcer::new(config.budget.clone());

        // Stage 1: costs.
        let stage = Instant::now();
        let costs = CostMatrix::build(source, target, config.metric, &mut budget)?;
        events.push(PlanningEvent::CostMatrixBuilt {
            rows: costs.rows(),
            cols: costs.cols(),
            metric: config.metric,
            elapsed: stage.elapsed(),
        });

        // Stage 2: matching.
        let stage = Instant::now();
        let solver = solver_for(config.matching);
        let assignment = solve_assignment(&costs, config.cardinality, solver.as_ref(), &mut budget)?;
        let total_cost = costs.total_cost(&assignment.mapping);
        debug!(matched = assignment.matched(), total_cost, "assignment solved");
        events.push(PlanningEvent::AssignmentSolved {
            matching: solver.method(),
            matched: assignment.matched(),
            total_cost,
            elapsed: stage.elapsed(),
        });

        // Stage 3: durations.
        let stage = Instant::now();
        let model = duration_model_for(config.transition);
        let mut durations = pair_durations(model.as_ref(), source, target, &assignment.mapping, limits)?;

        if config.sync == SyncMode::Synchronized {
            let makespan = durations.iter().flatten().fold(0.0_f64, |acc, &d| acc.max(d));
            for d in durations.iter_mut().flatten() {
                *d = makespan;
            }
        }

        if let Some(quantum) = config.time_quantum {
            for d in durations.iter_mut().flatten() {
                *d = quantize_up(*d, quantum);
            }
        }

        if config.unmatched == UnmatchedPolicy::Stationary {
            for d in durations.iter_mut().filter(|d| d.is_none()) {
                *d = Some(0.0);
            }
        }

        let plan = TransitionPlan {
            mapping: assignment.mapping,
            durations,
            unmatched_sources: assignment.unmatched_sources,
        };
        events.push(PlanningEvent::DurationsComputed {
            transition: model.method(),
            sync: config.sync,
            makespan: plan.makespan(),
            elapsed: stage.elapsed(),
        });

        validate_plan(&plan, source.len())?;
        Ok(plan)
    }
}

/// Minimum duration of every matched pair, indexed by target. Empty slots
/// stay `None`.
fn pair_durations(
    model: &dyn DurationModel,
    source: &PointCloud,
    target: &PointCloud,
    mapping: &[Option<usize>],
    limits: &KinematicLimits,
) -> Result<Vec<Option<f64>>> {
    let pair = |j: usize, s: &Option<usize>| -> Result<Option<f64>> {
        match s {
            Some(i) => {
                let displacement = source.get(*i)?.displacement_to(target.get(j)?);
                model.min_duration(displacement, limits).map(Some)
            }
            None => Ok(None),
        }
    };

    #[cfg(feature = "parallel")]
    let durations: Result<Vec<Option<f64>>> = {
        use rayon::prelude::*;
        mapping.par_iter().enumerate().map(|(j, s)| pair(j, s)).collect()
    };

    #[cfg(not(feature = "parallel"))]
    let durations: Result<Vec<Option<f64>>> =
        mapping.iter().enumerate().map(|(j, s)| pair(j, s)).collect();

    durations
}

/// Plan with a one-off [`TransitionPlanner`].
///
/// # Errors
///
/// See [`TransitionPlanner::plan`].
pub fn plan_transition(
    source: &PointCloud,
    target: &PointCloud,
    limits: &KinematicLimits,
    config: PlannerConfig,
) -> Result<TransitionPlan> {
    TransitionPlanner::new(config).plan(source, target, limits)
}
