//! Audit trail for planning calls.
//!
//! Every planning call can produce a [`PlanAuditEntry`] holding fingerprints
//! of its inputs and its plan, plus timing. Two calls with bit-identical
//! inputs must yield equal `input_hash` and equal `output_hash`; comparing
//! entries is how repeated planning is checked for stability.
//!
//! # Hashing
//!
//! We use [`std::hash::DefaultHasher`] (SipHash-2-4 on most platforms) rather
//! than a cryptographic hash. This is sufficient for deduplication and
//! regression detection but is **not** suitable for tamper proofing.

use std::hash::{DefaultHasher, Hash, Hasher};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::planner::PlannerConfig;
use crate::types::{KinematicLimits, MatchingMethod, PointCloud, TransitionPlan};

// ---------------------------------------------------------------------------
// Audit entry
// ---------------------------------------------------------------------------

/// A single audit record for one planning call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanAuditEntry {
    /// Caller-chosen identifier for this request.
    pub request_id: String,

    pub matching: MatchingMethod,

    /// 8-byte hash of clouds, limits and configuration. Produced by
    /// [`hash_input`].
    pub input_hash: [u8; 8],

    /// 8-byte hash of the plan. Produced by [`hash_output`].
    pub output_hash: [u8; 8],

    pub sources: usize,
    pub targets: usize,

    /// Latest completion time in the plan, seconds.
    pub makespan: f64,

    /// Wall-clock time in microseconds.
    pub wall_time_us: u64,

    /// Timestamp as nanoseconds since the Unix epoch.
    pub timestamp_ns: u128,
}

// ---------------------------------------------------------------------------
// Hash helpers
// ---------------------------------------------------------------------------

fn hash_cloud(cloud: &PointCloud, h: &mut DefaultHasher) {
    cloud.len().hash(h);
    for p in cloud {
        p.x.to_bits().hash(h);
        p.y.to_bits().hash(h);
        p.z.to_bits().hash(h);
    }
}

fn hash_optional(value: Option<f64>, h: &mut DefaultHasher) {
    value.map(f64::to_bits).hash(h);
}

/// Deterministic 8-byte fingerprint of one planning call's inputs.
///
/// Coordinates and limits are hashed by bit pattern, so `0.0` and `-0.0`
/// differ.
pub fn hash_input(
    source: &PointCloud,
    target: &PointCloud,
    limits: &KinematicLimits,
    config: &PlannerConfig,
) -> [u8; 8] {
    let mut h = DefaultHasher::new();

    hash_cloud(source, &mut h);
    hash_cloud(target, &mut h);

    limits.max_velocity_xy.to_bits().hash(&mut h);
    limits.max_velocity_z.to_bits().hash(&mut h);
    limits.max_acceleration.to_bits().hash(&mut h);
    hash_optional(limits.max_velocity_z_up, &mut h);
    hash_optional(limits.max_acceleration_z, &mut h);
    hash_optional(limits.max_jerk, &mut h);

    config.matching.hash(&mut h);
    config.sync.hash(&mut h);
    config.cardinality.hash(&mut h);
    config.unmatched.hash(&mut h);
    config.transition.hash(&mut h);
    config.metric.hash(&mut h);
    hash_optional(config.time_quantum, &mut h);

    h.finish().to_le_bytes()
}

/// Deterministic 8-byte fingerprint of a plan.
pub fn hash_output(plan: &TransitionPlan) -> [u8; 8] {
    let mut h = DefaultHasher::new();
    plan.mapping.hash(&mut h);
    for d in &plan.durations {
        d.map(f64::to_bits).hash(&mut h);
    }
    plan.unmatched_sources.hash(&mut h);
    h.finish().to_le_bytes()
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Convenience builder for [`PlanAuditEntry`].
///
/// # Example
///
/// ```
/// use ruvector_formation::audit::AuditBuilder;
/// use ruvector_formation::{
///     KinematicLimits, MatchingMethod, PlannerConfig, PointCloud, SyncMode, TransitionPlanner,
/// };
///
/// let source = PointCloud::from_triples(&[[0.0, 0.0, 0.0]]).unwrap();
/// let target = PointCloud::from_triples(&[[1.0, 0.0, 0.0]]).unwrap();
/// let limits = KinematicLimits::new(5.0, 5.0, 3.0);
/// let planner = TransitionPlanner::new(PlannerConfig::new(
///     MatchingMethod::Optimal,
///     SyncMode::Synchronized,
/// ));
///
/// let audit = AuditBuilder::start("req-42", &source, &target, &limits, planner.config());
/// let plan = planner.plan(&source, &target, &limits).unwrap();
/// let entry = audit.finish(&plan);
/// assert_eq!(entry.targets, 1);
/// ```
pub struct AuditBuilder {
    request_id: String,
    matching: MatchingMethod,
    input_hash: [u8; 8],
    sources: usize,
    targets: usize,
    start: Instant,
    timestamp_ns: u128,
}

impl AuditBuilder {
    /// Begin an audit record; the input hash is taken immediately.
    pub fn start(
        request_id: impl Into<String>,
        source: &PointCloud,
        target: &PointCloud,
        limits: &KinematicLimits,
        config: &PlannerConfig,
    ) -> Self {
        let timestamp_ns = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_nanos();

        Self {
            request_id: request_id.into(),
            matching: config.matching,
            input_hash: hash_input(source, target, limits, config),
            sources: source.len(),
            targets: target.len(),
            start: Instant::now(),
            timestamp_ns,
        }
    }

    /// Finalize the record once the plan is available.
    pub fn finish(self, plan: &TransitionPlan) -> PlanAuditEntry {
        let elapsed = self.start.elapsed();

        PlanAuditEntry {
            request_id: self.request_id,
            matching: self.matching,
            input_hash: self.input_hash,
            output_hash: hash_output(plan),
            sources: self.sources,
            targets: self.targets,
            makespan: plan.makespan(),
            wall_time_us: elapsed.as_micros() as u64,
            timestamp_ns: self.timestamp_ns,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assignment::CardinalityPolicy;
    use crate::cost::CostMetric;
    use crate::planner::{SyncMode, UnmatchedPolicy};
    use crate::types::TransitionMethod;

    fn cloud(triples: &[[f64; 3]]) -> PointCloud {
        PointCloud::from_triples(triples).unwrap()
    }

    fn config() -> PlannerConfig {
        PlannerConfig::new(MatchingMethod::Optimal, SyncMode::Independent)
    }

    #[test]
    fn hash_input_deterministic() {
        let a = cloud(&[[0.0, 0.0, 0.0], [1.0, 2.0, 3.0]]);
        let b = cloud(&[[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        let limits = KinematicLimits::new(5.0, 5.0, 3.0);
        assert_eq!(
            hash_input(&a, &b, &limits, &config()),
            hash_input(&a, &b, &limits, &config()),
        );
    }

    #[test]
    fn hash_input_sees_every_part() {
        let a = cloud(&[[0.0, 0.0, 0.0]]);
        let b = cloud(&[[1.0, 0.0, 0.0]]);
        let limits = KinematicLimits::new(5.0, 5.0, 3.0);
        let base = hash_input(&a, &b, &limits, &config());

        assert_ne!(base, hash_input(&b, &a, &limits, &config()));
        assert_ne!(base, hash_input(&a, &b, &limits.with_max_jerk(1.0), &config()));
        let synced = PlannerConfig::new(MatchingMethod::Optimal, SyncMode::Synchronized);
        assert_ne!(base, hash_input(&a, &b, &limits, &synced));
    }

    #[test]
    fn hash_input_sees_every_config_field() {
        let a = cloud(&[[0.0, 0.0, 0.0]]);
        let b = cloud(&[[1.0, 0.0, 0.0]]);
        let limits = KinematicLimits::new(5.0, 5.0, 3.0);
        let base = hash_input(&a, &b, &limits, &config());

        // Explicitly choosing the default profile is the same request.
        let explicit = config().with_transition(TransitionMethod::ConstJerk);
        assert_eq!(base, hash_input(&a, &b, &limits, &explicit));

        for changed in [
            config().with_cardinality(CardinalityPolicy::Partial),
            config().with_unmatched(UnmatchedPolicy::Omitted),
            config().with_metric(CostMetric::SquaredEuclidean),
            config().with_time_quantum(0.5),
            PlannerConfig::new(MatchingMethod::Greedy, SyncMode::Independent),
        ] {
            assert_ne!(base, hash_input(&a, &b, &limits, &changed), "{changed:?}");
        }
    }

    #[test]
    fn hash_output_changes_with_plan() {
        let p1 = TransitionPlan {
            mapping: vec![Some(0), Some(1)],
            durations: vec![Some(1.0), Some(2.0)],
            unmatched_sources: Vec::new(),
        };
        let mut p2 = p1.clone();
        assert_eq!(hash_output(&p1), hash_output(&p2));
        p2.durations[1] = None;
        assert_ne!(hash_output(&p1), hash_output(&p2));
    }

    #[test]
    fn audit_builder_produces_entry() {
        let a = cloud(&[[0.0, 0.0, 0.0]]);
        let limits = KinematicLimits::new(5.0, 5.0, 3.0);
        let builder = AuditBuilder::start("req-1", &a, &a, &limits, &config());
        let plan = TransitionPlan {
            mapping: vec![Some(0)],
            durations: vec![Some(0.0)],
            unmatched_sources: Vec::new(),
        };
        let entry = builder.finish(&plan);

        assert_eq!(entry.request_id, "req-1");
        assert_eq!(entry.matching, MatchingMethod::Optimal);
        assert_eq!((entry.sources, entry.targets), (1, 1));
        assert_eq!(entry.makespan, 0.0);
        assert!(entry.timestamp_ns > 0);

        let json = serde_json::to_string(&entry).unwrap();
        let back: PlanAuditEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }
}
