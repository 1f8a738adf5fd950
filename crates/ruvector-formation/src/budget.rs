//! Compute budget enforcement for one planning call.
//!
//! [`BudgetEnforcer`] tracks wall-clock time and memory allocation against a
//! [`PlanningBudget`]. The assignment solver calls
//! [`check_iteration`](BudgetEnforcer::check_iteration) once per augmentation
//! and the cost-matrix builder calls
//! [`check_memory`](BudgetEnforcer::check_memory) before allocating.
//!
//! Budget violations are reported as [`PlanningError::BudgetExhausted`] with a
//! human-readable reason describing which limit was hit. No partial plan is
//! ever returned.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::PlanningError;

/// Default memory ceiling (1 GiB): a dense cost matrix for ~11k drones.
const DEFAULT_MEMORY_LIMIT: usize = 1024 * 1024 * 1024;

/// Resource limits for a single planning call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanningBudget {
    /// Maximum wall-clock time allowed.
    pub max_time: Duration,
    /// Maximum bytes of scratch memory (cost matrices) allowed.
    pub memory_limit: usize,
}

impl Default for PlanningBudget {
    fn default() -> Self {
        Self {
            max_time: Duration::from_secs(30),
            memory_limit: DEFAULT_MEMORY_LIMIT,
        }
    }
}

/// Enforces wall-time and memory budgets during one planning call.
///
/// Create one at the start of a call and thread it through the stages. The
/// enforcer is intentionally non-`Clone` so that each call owns exactly one.
///
/// # Example
///
/// ```
/// use ruvector_formation::budget::{BudgetEnforcer, PlanningBudget};
///
/// let mut enforcer = BudgetEnforcer::new(PlanningBudget::default());
///
/// // Once per solver augmentation:
/// enforcer.check_iteration().unwrap();
///
/// // Before allocating scratch memory:
/// enforcer.check_memory(1024).unwrap();
/// ```
pub struct BudgetEnforcer {
    /// Monotonic clock snapshot taken when the enforcer was created.
    start_time: Instant,

    budget: PlanningBudget,

    /// Number of iterations consumed so far.
    iterations_used: usize,

    /// Cumulative memory allocated (tracked by the caller, not measured).
    memory_used: usize,

    memory_limit: usize,
}

impl BudgetEnforcer {
    /// Create a new enforcer with the given budget.
    ///
    /// The wall-clock timer starts immediately.
    pub fn new(budget: PlanningBudget) -> Self {
        let memory_limit = budget.memory_limit;
        Self {
            start_time: Instant::now(),
            budget,
            iterations_used: 0,
            memory_used: 0,
            memory_limit,
        }
    }

    /// Create an enforcer with a memory ceiling that overrides the budget's.
    pub fn with_memory_limit(budget: PlanningBudget, memory_limit: usize) -> Self {
        Self {
            memory_limit,
            ..Self::new(budget)
        }
    }

    /// An enforcer that never trips; for callers that drive a solver
    /// directly without a planning call around it.
    pub fn unlimited() -> Self {
        Self::new(PlanningBudget {
            max_time: Duration::MAX,
            memory_limit: usize::MAX,
        })
    }

    /// Count one iteration and check the wall-clock limit.
    ///
    /// # Errors
    ///
    /// Returns [`PlanningError::BudgetExhausted`] once the wall-clock time
    /// has been exceeded.
    pub fn check_iteration(&mut self) -> Result<(), PlanningError> {
        self.iterations_used += 1;

        let elapsed = self.start_time.elapsed();
        if elapsed > self.budget.max_time {
            return Err(PlanningError::BudgetExhausted {
                reason: format!(
                    "wall-clock time limit reached after {} iterations ({:.2?} > {:.2?})",
                    self.iterations_used, elapsed, self.budget.max_time,
                ),
                elapsed,
            });
        }

        Ok(())
    }

    /// Check whether an additional allocation is within budget.
    ///
    /// Call this **before** allocating. If the allocation would push
    /// cumulative usage over the ceiling the call fails without modifying the
    /// internal counter.
    ///
    /// # Errors
    ///
    /// Returns [`PlanningError::BudgetExhausted`] if the allocation would
    /// exceed the memory limit.
    pub fn check_memory(&mut self, additional: usize) -> Result<(), PlanningError> {
        let new_total = self.memory_used.saturating_add(additional);
        if new_total > self.memory_limit {
            return Err(PlanningError::BudgetExhausted {
                reason: format!(
                    "memory limit reached ({} + {} = {} > {} bytes)",
                    self.memory_used, additional, new_total, self.memory_limit,
                ),
                elapsed: self.start_time.elapsed(),
            });
        }
        self.memory_used = new_total;
        Ok(())
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    #[inline]
    pub fn iterations_used(&self) -> usize {
        self.iterations_used
    }

    #[inline]
    pub fn memory_used(&self) -> usize {
        self.memory_used
    }

    #[inline]
    pub fn budget(&self) -> &PlanningBudget {
        &self.budget
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
