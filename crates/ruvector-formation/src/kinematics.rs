//! Minimum-time bounded-jerk durations for point-to-point moves.
//!
//! Every move starts and ends at rest with zero acceleration. A 3D
//! displacement is split into a horizontal leg (`hypot(dx, dy)`) and a
//! vertical leg (`|dz|`); each leg is timed on its own with its own ceilings
//! and the pair takes as long as the slower leg.
//!
//! # Profiles
//!
//! With an explicit jerk ceiling `j` the classical seven-segment S-curve is
//! used. Without one, each velocity change is a single linear ramp of
//! acceleration up to `a` and straight back down, i.e. the jerk is implied
//! by the move itself.
//!
//! Both profiles have two regimes separated by a threshold distance `d*`:
//! below it the peak velocity stays under the ceiling (acceleration-limited),
//! above it the drone cruises at the ceiling (velocity-limited). The
//! duration is continuous across `d*`.

use tracing::trace;

use crate::error::Result;
use crate::traits::DurationModel;
use crate::types::{KinematicLimits, TransitionMethod};
use crate::validation::validate_displacement;

/// Which part of the profile bounds a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Regime {
    /// Zero distance.
    Stationary,
    /// The move is too short to reach the velocity ceiling.
    AccelerationLimited,
    /// The move cruises at the velocity ceiling.
    VelocityLimited,
}

/// Ceilings for a single axis. All values must be finite and positive;
/// [`ConstJerkProfile`] guarantees that by validating [`KinematicLimits`]
/// first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisLimits {
    pub velocity: f64,
    pub acceleration: f64,
    pub jerk: Option<f64>,
}

impl AxisLimits {
    pub fn new(velocity: f64, acceleration: f64, jerk: Option<f64>) -> Self {
        Self {
            velocity,
            acceleration,
            jerk,
        }
    }

    /// Horizontal ceilings from `limits`.
    pub fn horizontal(limits: &KinematicLimits) -> Self {
        Self::new(limits.max_velocity_xy, limits.max_acceleration, limits.max_jerk)
    }

    /// Vertical ceilings from `limits` for a move with vertical component `dz`.
    pub fn vertical(limits: &KinematicLimits, dz: f64) -> Self {
        Self::new(
            limits.vertical_velocity_for(dz),
            limits.vertical_acceleration(),
            limits.max_jerk,
        )
    }

    /// Time to go from rest to velocity `v` and back to zero acceleration.
    fn ramp_time(&self, v: f64) -> f64 {
        let a = self.acceleration;
        match self.jerk {
            None => 2.0 * v / a,
            Some(j) if v * j >= a * a => v / a + a / j,
            Some(j) => 2.0 * (v / j).sqrt(),
        }
    }

    /// Distance `d*` at which the velocity ceiling is reached exactly at the
    /// midpoint of the move.
    pub fn threshold_distance(&self) -> f64 {
        self.velocity * self.ramp_time(self.velocity)
    }

    pub fn regime(&self, distance: f64) -> Regime {
        if distance <= 0.0 {
            Regime::Stationary
        } else if distance >= self.threshold_distance() {
            Regime::VelocityLimited
        } else {
            Regime::AccelerationLimited
        }
    }

    /// Minimum rest-to-rest time in seconds to cover `distance` meters.
    pub fn min_duration(&self, distance: f64) -> f64 {
        let d = distance.abs();
        let v = self.velocity;
        let a = self.acceleration;

        match self.regime(d) {
            Regime::Stationary => 0.0,
            Regime::VelocityLimited => self.ramp_time(v) + d / v,
            Regime::AccelerationLimited => match self.jerk {
                None => 2.0 * (2.0 * d / a).sqrt(),
                Some(j) if d >= 2.0 * a * a * a / (j * j) => {
                    let peak = 0.5 * a * ((a * a / (j * j) + 4.0 * d / a).sqrt() - a / j);
                    2.0 * (peak / a + a / j)
                }
                Some(j) => 4.0 * (d / (2.0 * j)).cbrt(),
            },
        }
    }
}

/// Bounded-jerk S-curve duration model.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstJerkProfile;

impl ConstJerkProfile {
    /// Per-leg durations `(horizontal, vertical)` for `displacement`.
    ///
    /// # Errors
    ///
    /// See [`DurationModel::min_duration`].
    pub fn leg_durations(
        &self,
        displacement: [f64; 3],
        limits: &KinematicLimits,
    ) -> Result<(f64, f64)> {
        limits.validate()?;
        validate_displacement(displacement)?;

        let [dx, dy, dz] = displacement;
        let horizontal = AxisLimits::horizontal(limits).min_duration(dx.hypot(dy));
        let vertical = AxisLimits::vertical(limits, dz).min_duration(dz.abs());
        Ok((horizontal, vertical))
    }
}

impl DurationModel for ConstJerkProfile {
    fn min_duration(&self, displacement: [f64; 3], limits: &KinematicLimits) -> Result<f64> {
        let (horizontal, vertical) = self.leg_durations(displacement, limits)?;
        trace!(horizontal, vertical, "pair duration");
        Ok(horizontal.max(vertical))
    }

    fn method(&self) -> TransitionMethod {
        TransitionMethod::ConstJerk
    }
}

/// Round `duration` up to a whole number of `quantum`s.
///
/// The result is never below `duration`, even when the division rounds
/// down in floating point. Zero stays zero.
pub fn quantize_up(duration: f64, quantum: f64) -> f64 {
    if duration <= 0.0 {
        return 0.0;
    }
    let rounded = (duration / quantum).ceil() * quantum;
    if rounded < duration {
        rounded + quantum
    } else {
        rounded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlanningError;
    use approx::assert_relative_eq;

    #[test]
    fn zero_displacement_is_instant() {
        let limits = KinematicLimits::new(5.0, 5.0, 3.0);
        assert_eq!(ConstJerkProfile.min_duration([0.0; 3], &limits).unwrap(), 0.0);
        let limits = limits.with_max_jerk(2.0);
        assert_eq!(ConstJerkProfile.min_duration([0.0; 3], &limits).unwrap(), 0.0);
    }

    #[test]
    fn implied_jerk_regimes() {
        let axis = AxisLimits::new(2.0, 1.0, None);
        assert_relative_eq!(axis.threshold_distance(), 8.0);

        assert_eq!(axis.regime(2.0), Regime::AccelerationLimited);
        assert_relative_eq!(axis.min_duration(2.0), 4.0);

        assert_eq!(axis.regime(20.0), Regime::VelocityLimited);
        assert_relative_eq!(axis.min_duration(20.0), 14.0);
    }

    #[test]
    fn continuous_at_threshold() {
        for axis in [
            AxisLimits::new(2.0, 1.0, None),
            AxisLimits::new(2.0, 1.0, Some(0.5)),
            AxisLimits::new(0.5, 3.0, Some(4.0)),
        ] {
            let d = axis.threshold_distance();
            let below = axis.min_duration(d * (1.0 - 1e-9));
            let at = axis.min_duration(d);
            assert_relative_eq!(below, at, max_relative = 1e-6);
        }
    }

    #[test]
    fn explicit_jerk_inner_boundary_is_continuous() {
        let axis = AxisLimits::new(10.0, 2.0, Some(1.0));
        let boundary = 2.0 * 8.0 / 1.0;
        let lo = axis.min_duration(boundary * (1.0 - 1e-9));
        let hi = axis.min_duration(boundary);
        assert_relative_eq!(lo, hi, max_relative = 1e-6);
        // Boundary move reaches peak a²/j = 4 m/s in 2(a/j + a/j) = 8 s.
        assert_relative_eq!(hi, 8.0, max_relative = 1e-12);
    }

    #[test]
    fn explicit_jerk_cruise() {
        // v·j >= a²: ramp = v/a + a/j = 2 + 1 = 3 s, d* = 6 m.
        let axis = AxisLimits::new(2.0, 1.0, Some(1.0));
        assert_relative_eq!(axis.threshold_distance(), 6.0);
        assert_relative_eq!(axis.min_duration(10.0), 3.0 + 5.0);
    }

    #[test]
    fn jerk_ceiling_slows_moves() {
        let limits = KinematicLimits::new(5.0, 5.0, 3.0);
        let free = ConstJerkProfile.min_duration([10.0, 0.0, 0.0], &limits).unwrap();
        let bounded = ConstJerkProfile
            .min_duration([10.0, 0.0, 0.0], &limits.with_max_jerk(1.0))
            .unwrap();
        assert!(bounded > free);
    }

    #[test]
    fn slower_axis_dominates() {
        let limits = KinematicLimits::new(10.0, 1.0, 2.0);
        let (h, v) = ConstJerkProfile
            .leg_durations([3.0, 4.0, 5.0], &limits)
            .unwrap();
        let total = ConstJerkProfile.min_duration([3.0, 4.0, 5.0], &limits).unwrap();
        assert!(v > h);
        assert_eq!(total, v);
    }

    #[test]
    fn ascent_ceiling_only_applies_upwards() {
        let limits = KinematicLimits::new(10.0, 2.0, 2.0).with_max_velocity_z_up(1.0);
        let up = ConstJerkProfile.min_duration([0.0, 0.0, 20.0], &limits).unwrap();
        let down = ConstJerkProfile.min_duration([0.0, 0.0, -20.0], &limits).unwrap();
        assert!(up > down);
    }

    #[test]
    fn rejects_bad_limits_and_displacement() {
        let err = ConstJerkProfile
            .min_duration([1.0, 0.0, 0.0], &KinematicLimits::new(5.0, -1.0, 3.0))
            .unwrap_err();
        assert!(matches!(
            err,
            PlanningError::InvalidKinematicLimits { name: "max_velocity_z", .. }
        ));

        let err = ConstJerkProfile
            .min_duration([f64::NAN, 0.0, 0.0], &KinematicLimits::new(5.0, 5.0, 3.0))
            .unwrap_err();
        assert!(matches!(err, PlanningError::InvalidInput(_)));
    }

    #[test]
    fn quantize_never_rounds_down() {
        assert_eq!(quantize_up(0.0, 0.04), 0.0);
        assert!(quantize_up(0.3, 0.1) >= 0.3);
        assert_relative_eq!(quantize_up(1.01, 0.25), 1.25);
        assert_relative_eq!(quantize_up(2.0, 0.5), 2.0);
    }
}
