//! Input and output validation for planning operations.
//!
//! All validation functions run eagerly before any computation begins, ensuring
//! callers receive clear diagnostics instead of mysterious numerical failures or
//! resource exhaustion. Every public function returns [`ValidationError`] on
//! failure, which converts into [`PlanningError::InvalidInput`] via `From`.
//!
//! # Limits
//!
//! | Resource         | Limit   | Constant        |
//! |------------------|---------|-----------------|
//! | Points per cloud | 65,536  | [`MAX_POINTS`]  |
//!
//! [`PlanningError::InvalidInput`]: crate::error::PlanningError::InvalidInput

use crate::error::ValidationError;
use crate::types::{Point3D, TransitionPlan};

// ---------------------------------------------------------------------------
// Resource limits
// ---------------------------------------------------------------------------

/// Maximum number of points in one cloud. A dense cost matrix at this size is
/// already 32 GiB, so larger inputs are rejected outright.
pub const MAX_POINTS: usize = 65_536;

// ---------------------------------------------------------------------------
// Point data
// ---------------------------------------------------------------------------

/// Validate the points of one formation snapshot.
///
/// 1. The number of points is within [`MAX_POINTS`].
/// 2. Every coordinate is finite.
/// 3. Coincident points emit a [`tracing::warn`] (valid, but two drones at
///    one position usually means a modelling mistake). Only checked for
///    small clouds to keep validation linear.
///
/// # Errors
///
/// Returns [`ValidationError`] describing the first violation found.
pub fn validate_points(points: &[Point3D]) -> Result<(), ValidationError> {
    if points.len() > MAX_POINTS {
        return Err(ValidationError::CloudTooLarge { len: points.len(), max: MAX_POINTS });
    }

    for (index, p) in points.iter().enumerate() {
        if !p.is_finite() {
            return Err(ValidationError::NonFinitePoint { index, x: p.x, y: p.y, z: p.z });
        }
    }

    if points.len() <= 256 {
        'outer: for (i, a) in points.iter().enumerate() {
            for b in &points[i + 1..] {
                if a == b {
                    tracing::warn!(index = i, "point cloud contains coincident points");
                    break 'outer;
                }
            }
        }
    }

    Ok(())
}

/// Validate one displacement vector.
///
/// Structurally impossible for displacements between two validated clouds,
/// but the duration calculator is also public on its own.
pub fn validate_displacement(d: [f64; 3]) -> Result<(), ValidationError> {
    if d.iter().all(|c| c.is_finite()) {
        Ok(())
    } else {
        Err(ValidationError::NonFiniteDisplacement { dx: d[0], dy: d[1], dz: d[2] })
    }
}

// ---------------------------------------------------------------------------
// Cost data
// ---------------------------------------------------------------------------

/// Validate a row-major cost buffer of shape `rows x cols`.
///
/// # Errors
///
/// Returns [`ValidationError::DimensionMismatch`] if the buffer length is
/// wrong, and [`ValidationError::InvalidCost`] for NaN, infinite, or negative
/// entries.
pub fn validate_costs(rows: usize, cols: usize, data: &[f64]) -> Result<(), ValidationError> {
    let expected = rows.checked_mul(cols).ok_or_else(|| {
        ValidationError::DimensionMismatch(format!("{rows}x{cols} overflows usize"))
    })?;
    if data.len() != expected {
        return Err(ValidationError::DimensionMismatch(format!(
            "cost buffer length {} does not equal {rows}x{cols} = {expected}",
            data.len(),
        )));
    }

    for (idx, &value) in data.iter().enumerate() {
        if !value.is_finite() || value < 0.0 {
            return Err(ValidationError::InvalidCost {
                row: idx / cols.max(1),
                col: idx % cols.max(1),
                value,
            });
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// Validate the optional duration rounding quantum.
pub fn validate_time_quantum(quantum: Option<f64>) -> Result<(), ValidationError> {
    match quantum {
        Some(q) if !q.is_finite() || q <= 0.0 => Err(ValidationError::ParameterOutOfRange {
            name: "time_quantum".into(),
            value: q.to_string(),
            expected: "finite positive seconds".into(),
        }),
        _ => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Output validation (post-plan)
// ---------------------------------------------------------------------------

/// Validate a finished plan before it is handed to the caller.
///
/// Catches silent corruption in the pipeline:
///
/// 1. `mapping` and `durations` have the same length.
/// 2. No source index appears twice and every index is `< source_len`.
/// 3. Every duration is finite and non-negative.
pub fn validate_plan(plan: &TransitionPlan, source_len: usize) -> Result<(), ValidationError> {
    if plan.mapping.len() != plan.durations.len() {
        return Err(ValidationError::DimensionMismatch(format!(
            "mapping length {} does not match durations length {}",
            plan.mapping.len(),
            plan.durations.len(),
        )));
    }

    let mut seen = vec![false; source_len];
    for &source in plan.mapping.iter().flatten() {
        if source >= source_len || seen[source] {
            return Err(ValidationError::DimensionMismatch(format!(
                "source index {source} is out of range or assigned twice",
            )));
        }
        seen[source] = true;
    }

    for (target, d) in plan.durations.iter().enumerate() {
        if let Some(d) = d {
            if !d.is_finite() || *d < 0.0 {
                return Err(ValidationError::ParameterOutOfRange {
                    name: format!("durations[{target}]"),
                    value: d.to_string(),
                    expected: "finite non-negative seconds".into(),
                });
            }
        }
    }

    Ok(())
}
