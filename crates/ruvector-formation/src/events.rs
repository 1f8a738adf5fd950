//! Event log for planning calls.
//!
//! [`TransitionPlanner::plan_traced`](crate::planner::TransitionPlanner::plan_traced)
//! emits one [`PlanningEvent`] per pipeline stage, so a caller can see what
//! was requested, how each stage went and how long it took.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::assignment::CardinalityPolicy;
use crate::cost::CostMetric;
use crate::planner::SyncMode;
use crate::types::{MatchingMethod, TransitionMethod};

/// Events emitted during a planning call.
///
/// Events are tagged with `#[serde(tag = "type")]` so they serialise as
/// `{ "type": "PlanRequested", ... }` for easy ingestion into event stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlanningEvent {
    /// A plan was requested and inputs passed validation.
    PlanRequested {
        sources: usize,
        targets: usize,
        matching: MatchingMethod,
        sync: SyncMode,
        cardinality: CardinalityPolicy,
    },

    /// The pairwise cost matrix is ready.
    CostMatrixBuilt {
        rows: usize,
        cols: usize,
        metric: CostMetric,
        elapsed: Duration,
    },

    /// The matching stage finished.
    AssignmentSolved {
        matching: MatchingMethod,
        /// Number of matched (source, target) pairs.
        matched: usize,
        /// Sum of costs over matched pairs.
        total_cost: f64,
        elapsed: Duration,
    },

    /// Per-pair durations were computed and reconciled.
    DurationsComputed {
        transition: TransitionMethod,
        sync: SyncMode,
        makespan: f64,
        elapsed: Duration,
    },

    /// A complete plan was produced.
    PlanCompleted {
        targets: usize,
        makespan: f64,
        wall_time: Duration,
    },

    /// The call failed; no plan was produced.
    PlanFailed {
        /// Display form of the error.
        reason: String,
        elapsed: Duration,
    },
}

impl PlanningEvent {
    /// Whether this event ends a planning call.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PlanningEvent::PlanCompleted { .. } | PlanningEvent::PlanFailed { .. }
        )
    }
}
