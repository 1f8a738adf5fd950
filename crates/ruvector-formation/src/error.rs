//! Error types for the formation planner.
//!
//! Provides structured error variants for invalid kinematic limits, malformed
//! point data, cardinality mismatches, and budget overruns. All errors
//! implement `std::error::Error` via `thiserror`.

use std::time::Duration;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PlanningError>;

/// Primary error type for planning operations.
///
/// Every failure is reported synchronously and exactly once; a planning call
/// either returns a complete [`TransitionPlan`](crate::types::TransitionPlan)
/// or one of these variants.
#[derive(Debug, thiserror::Error)]
pub enum PlanningError {
    /// A velocity, acceleration, or jerk ceiling is zero, negative, or not
    /// finite.
    #[error("invalid kinematic limit: {name} = {value} (expected a finite positive value)")]
    InvalidKinematicLimits {
        /// Name of the offending limit.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// The caller supplied malformed point or cost data.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] ValidationError),

    /// Source and target clouds differ in size while strict matching is in
    /// effect.
    #[error(
        "assignment cardinality mismatch: {sources} source points vs {targets} target points (strict matching)"
    )]
    AssignmentCardinalityMismatch {
        /// Number of source points.
        sources: usize,
        /// Number of target points.
        targets: usize,
    },

    /// An index was outside the bounds of a point cloud or plan.
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange {
        /// Offending index.
        index: usize,
        /// Length of the indexed collection.
        len: usize,
    },

    /// The planning budget (wall-time or memory) was exhausted.
    #[error("planning budget exhausted: {reason}")]
    BudgetExhausted {
        /// Which budget limit was hit.
        reason: String,
        /// Wall-clock time elapsed before the budget was hit.
        elapsed: Duration,
    },
}

/// Validation errors for planner inputs.
///
/// These are raised eagerly before any computation begins so that callers get
/// clear diagnostics rather than mysterious numerical failures.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// A coordinate is NaN or infinite.
    #[error("non-finite coordinate in point {index}: ({x}, {y}, {z})")]
    NonFinitePoint {
        /// Index of the offending point within its cloud.
        index: usize,
        /// x coordinate.
        x: f64,
        /// y coordinate.
        y: f64,
        /// z coordinate.
        z: f64,
    },

    /// A displacement vector is NaN or infinite.
    #[error("non-finite displacement: ({dx}, {dy}, {dz})")]
    NonFiniteDisplacement {
        /// x component.
        dx: f64,
        /// y component.
        dy: f64,
        /// z component.
        dz: f64,
    },

    /// A cost entry is NaN, infinite, or negative.
    #[error("invalid cost at ({row}, {col}): {value}")]
    InvalidCost {
        /// Source (row) index.
        row: usize,
        /// Target (column) index.
        col: usize,
        /// The rejected value.
        value: f64,
    },

    /// Dimensions are inconsistent (e.g. cost matrix data length).
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// A parameter is outside its valid range.
    #[error("parameter out of range: {name} = {value} (expected {expected})")]
    ParameterOutOfRange {
        /// Name of the parameter.
        name: String,
        /// The invalid value (as a string for flexibility).
        value: String,
        /// Human-readable description of the valid range.
        expected: String,
    },

    /// A point cloud exceeds the implementation limit.
    #[error("point cloud of {len} points exceeds maximum supported {max}")]
    CloudTooLarge {
        /// Number of points supplied.
        len: usize,
        /// Maximum supported number of points.
        max: usize,
    },
}
