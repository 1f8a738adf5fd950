//! Core types for formation transition planning.
//!
//! Provides [`Point3D`] and [`PointCloud`] for formation snapshots,
//! [`KinematicLimits`] for the per-call motion ceilings, and the
//! [`TransitionPlan`] returned to callers.

use serde::{Deserialize, Serialize};

use crate::error::{PlanningError, Result, ValidationError};
use crate::validation::validate_points;

// ---------------------------------------------------------------------------
// Point3D
// ---------------------------------------------------------------------------

/// A position in meters.
///
/// Serialises as a plain `[x, y, z]` triple.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Point3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3D {
    pub const ORIGIN: Point3D = Point3D { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Component-wise `other - self`.
    #[inline]
    pub fn displacement_to(&self, other: &Point3D) -> [f64; 3] {
        [other.x - self.x, other.y - self.y, other.z - self.z]
    }

    #[inline]
    pub fn squared_distance_to(&self, other: &Point3D) -> f64 {
        let [dx, dy, dz] = self.displacement_to(other);
        dx * dx + dy * dy + dz * dz
    }

    #[inline]
    pub fn distance_to(&self, other: &Point3D) -> f64 {
        self.squared_distance_to(other).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    pub fn to_array(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<[f64; 3]> for Point3D {
    fn from(arr: [f64; 3]) -> Self {
        Self::new(arr[0], arr[1], arr[2])
    }
}

impl From<Point3D> for [f64; 3] {
    fn from(p: Point3D) -> Self {
        p.to_array()
    }
}

// ---------------------------------------------------------------------------
// PointCloud
// ---------------------------------------------------------------------------

/// An immutable, ordered formation snapshot.
///
/// Index position is the identity contract of the whole pipeline: in the
/// source cloud index `i` is drone `i`, in the target cloud index `j` is
/// target slot `j`. The order is fixed at construction and never changes.
///
/// Construction rejects non-finite coordinates, so every displacement derived
/// from two clouds is finite.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<Point3D>", into = "Vec<Point3D>")]
pub struct PointCloud {
    points: Vec<Point3D>,
}

impl PointCloud {
    /// Build a cloud from points, validating every coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NonFinitePoint`] for NaN/Inf coordinates and
    /// [`ValidationError::CloudTooLarge`] above
    /// [`MAX_POINTS`](crate::validation::MAX_POINTS).
    pub fn new(points: Vec<Point3D>) -> std::result::Result<Self, ValidationError> {
        validate_points(&points)?;
        Ok(Self { points })
    }

    /// Build a cloud from raw `(x, y, z)` triples.
    pub fn from_triples(triples: &[[f64; 3]]) -> std::result::Result<Self, ValidationError> {
        Self::new(triples.iter().copied().map(Point3D::from).collect())
    }

    pub fn empty() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// O(1) indexed read.
    ///
    /// # Errors
    ///
    /// Returns [`PlanningError::IndexOutOfRange`] if `index >= len()`.
    #[inline]
    pub fn get(&self, index: usize) -> Result<&Point3D> {
        self.points.get(index).ok_or(PlanningError::IndexOutOfRange {
            index,
            len: self.points.len(),
        })
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Point3D> {
        self.points.iter()
    }

    pub fn as_slice(&self) -> &[Point3D] {
        &self.points
    }
}

impl TryFrom<Vec<Point3D>> for PointCloud {
    type Error = ValidationError;

    fn try_from(points: Vec<Point3D>) -> std::result::Result<Self, Self::Error> {
        Self::new(points)
    }
}

impl From<PointCloud> for Vec<Point3D> {
    fn from(cloud: PointCloud) -> Self {
        cloud.points
    }
}

impl<'a> IntoIterator for &'a PointCloud {
    type Item = &'a Point3D;
    type IntoIter = std::slice::Iter<'a, Point3D>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

// ---------------------------------------------------------------------------
// KinematicLimits
// ---------------------------------------------------------------------------

/// Motion ceilings supplied with every planning call.
///
/// The three required ceilings are in m/s and m/s². The optional fields
/// refine them:
///
/// - `max_velocity_z_up`: separate ceiling for ascending moves; descending
///   moves (and ascending ones when unset) use `max_velocity_z`.
/// - `max_acceleration_z`: vertical acceleration ceiling; falls back to
///   `max_acceleration`.
/// - `max_jerk`: explicit jerk ceiling in m/s³. When unset, the const-jerk
///   profile ramps acceleration linearly to its ceiling and straight back,
///   which fixes the jerk implicitly per move.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KinematicLimits {
    pub max_velocity_xy: f64,
    pub max_velocity_z: f64,
    pub max_acceleration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_velocity_z_up: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_acceleration_z: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_jerk: Option<f64>,
}

impl KinematicLimits {
    pub fn new(max_velocity_xy: f64, max_velocity_z: f64, max_acceleration: f64) -> Self {
        Self {
            max_velocity_xy,
            max_velocity_z,
            max_acceleration,
            max_velocity_z_up: None,
            max_acceleration_z: None,
            max_jerk: None,
        }
    }

    pub fn with_max_velocity_z_up(mut self, value: f64) -> Self {
        self.max_velocity_z_up = Some(value);
        self
    }

    pub fn with_max_acceleration_z(mut self, value: f64) -> Self {
        self.max_acceleration_z = Some(value);
        self
    }

    pub fn with_max_jerk(mut self, value: f64) -> Self {
        self.max_jerk = Some(value);
        self
    }

    /// Vertical velocity ceiling for a move with vertical component `dz`.
    #[inline]
    pub fn vertical_velocity_for(&self, dz: f64) -> f64 {
        match self.max_velocity_z_up {
            Some(up) if dz > 0.0 => up,
            _ => self.max_velocity_z,
        }
    }

    #[inline]
    pub fn vertical_acceleration(&self) -> f64 {
        self.max_acceleration_z.unwrap_or(self.max_acceleration)
    }

    /// Reject any ceiling that is not finite and strictly positive.
    ///
    /// # Errors
    ///
    /// Returns [`PlanningError::InvalidKinematicLimits`] naming the first
    /// offending field.
    pub fn validate(&self) -> Result<()> {
        let ceilings = [
            ("max_velocity_xy", Some(self.max_velocity_xy)),
            ("max_velocity_z", Some(self.max_velocity_z)),
            ("max_acceleration", Some(self.max_acceleration)),
            ("max_velocity_z_up", self.max_velocity_z_up),
            ("max_acceleration_z", self.max_acceleration_z),
            ("max_jerk", self.max_jerk),
        ];
        for (name, value) in ceilings {
            if let Some(value) = value {
                if !value.is_finite() || value <= 0.0 {
                    return Err(PlanningError::InvalidKinematicLimits { name, value });
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Strategy selectors
// ---------------------------------------------------------------------------

/// Which matching strategy assigns drones to targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchingMethod {
    /// Globally optimal minimum-total-cost bipartite matching
    /// (Kuhn–Munkres).
    Optimal,
    /// Nearest-available heuristic. Fast, not optimal; only used when a
    /// caller asks for it by name.
    Greedy,
}

impl std::fmt::Display for MatchingMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchingMethod::Optimal => write!(f, "optimal"),
            MatchingMethod::Greedy => write!(f, "greedy"),
        }
    }
}

/// Which motion profile times each point-to-point move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionMethod {
    /// Bounded-jerk S-curve, at rest at both ends.
    #[default]
    ConstJerk,
}

impl std::fmt::Display for TransitionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransitionMethod::ConstJerk => write!(f, "const-jerk"),
        }
    }
}

// ---------------------------------------------------------------------------
// TransitionPlan
// ---------------------------------------------------------------------------

/// The result of one planning call.
///
/// `mapping[j]` is the source (drone) index assigned to target slot `j`, or
/// `None` when partial matching left the slot empty. `durations[j]` is the
/// transition time for that slot in seconds; it is `None` only for empty
/// slots under [`UnmatchedPolicy::Omitted`](crate::planner::UnmatchedPolicy).
/// Sources that received no target are listed in `unmatched_sources`.
///
/// Serialises as `{"mapping": [...], "durations": [...]}` with `null` for
/// empty entries.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TransitionPlan {
    pub mapping: Vec<Option<usize>>,
    pub durations: Vec<Option<f64>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unmatched_sources: Vec<usize>,
}

impl TransitionPlan {
    /// Number of target slots.
    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }

    /// Time at which the last drone completes its move.
    pub fn makespan(&self) -> f64 {
        self.durations
            .iter()
            .flatten()
            .fold(0.0_f64, |acc, &d| acc.max(d))
    }

    /// Source index assigned to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`PlanningError::IndexOutOfRange`] if `target >= len()`.
    pub fn source_for(&self, target: usize) -> Result<Option<usize>> {
        self.mapping
            .get(target)
            .copied()
            .ok_or(PlanningError::IndexOutOfRange { index: target, len: self.mapping.len() })
    }

    /// Transition time for `target`.
    ///
    /// # Errors
    ///
    /// Returns [`PlanningError::IndexOutOfRange`] if `target >= len()`.
    pub fn duration_for(&self, target: usize) -> Result<Option<f64>> {
        self.durations
            .get(target)
            .copied()
            .ok_or(PlanningError::IndexOutOfRange { index: target, len: self.durations.len() })
    }

    /// Target slot assigned to `source`, if any. O(n).
    pub fn target_for(&self, source: usize) -> Option<usize> {
        self.mapping.iter().position(|&s| s == Some(source))
    }

    /// Iterate `(source, target)` over assigned slots in target order.
    pub fn assigned_pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.mapping
            .iter()
            .enumerate()
            .filter_map(|(target, source)| source.map(|s| (s, target)))
    }
}
