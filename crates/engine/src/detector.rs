//! Need detection - turns a snapshot into the adaptations it calls for.

use adaptive_core::{
    AdaptationNeed, AdaptationType, FeedbackSeverity, ResourceThresholds, ResourceUtilization,
    SystemState,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Thresholds for need detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Per-resource constraint thresholds.
    ///
    /// Filled from the shared thresholds section of [`crate::EngineSettings`].
    #[serde(skip)]
    pub thresholds: ResourceThresholds,
    /// Overall score below which performance needs attention
    pub low_score: f64,
    /// Overall score above which a constrained host may trade speed for headroom
    pub high_score: f64,
    /// Network latency above which performance needs attention (ms)
    pub high_latency_ms: f64,
    /// Network latency below which caching may be dropped under memory pressure (ms)
    pub low_latency_ms: f64,
    /// Memory usage above which a low-latency host needs attention
    pub cache_memory_pressure: f64,
    /// CPU usage below which a large host is under-used
    pub idle_cpu: f64,
    /// Idle CPU only counts on hosts with more cores than this
    pub min_cores_for_scale_up: u32,
    /// CPU usage above which performance needs attention
    pub busy_cpu: f64,
    /// Feedback at or above this severity raises a user-experience need
    pub min_feedback_severity: FeedbackSeverity,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            thresholds: ResourceThresholds::default(),
            low_score: 0.6,
            high_score: 0.9,
            high_latency_ms: 100.0,
            low_latency_ms: 10.0,
            cache_memory_pressure: 0.8,
            idle_cpu: 0.5,
            min_cores_for_scale_up: 4,
            busy_cpu: 0.9,
            min_feedback_severity: FeedbackSeverity::Medium,
        }
    }
}

/// Derives adaptation needs from a snapshot.
///
/// Detection is pure: the same snapshot always yields the same needs, at
/// most one per adaptation type, in resource, performance, user-experience
/// order.
#[derive(Debug, Clone, Default)]
pub struct NeedDetector {
    config: DetectorConfig,
}

impl NeedDetector {
    /// Create a detector with default thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the configuration.
    pub fn with_config(mut self, config: DetectorConfig) -> Self {
        self.config = config;
        self
    }

    /// Needs raised by `state`.
    pub fn detect(&self, state: &SystemState) -> Vec<AdaptationNeed> {
        let triggers = [
            (AdaptationType::ResourceOptimization, self.resource_trigger(state)),
            (AdaptationType::PerformanceOptimization, self.performance_trigger(state)),
            (AdaptationType::UserExperienceOptimization, self.feedback_trigger(state)),
        ];

        triggers
            .into_iter()
            .filter_map(|(kind, trigger)| {
                let trigger = trigger?;
                debug!("Detected {} need: {}", kind, trigger);
                Some(AdaptationNeed::new(kind, trigger, state.clone()))
            })
            .collect()
    }

    // Re-evaluated against our own thresholds rather than trusting the
    // snapshot's constraint flags.
    fn constraint(&self, state: &SystemState) -> ResourceUtilization {
        state.resources.rethreshold(&self.config.thresholds)
    }

    fn resource_trigger(&self, state: &SystemState) -> Option<String> {
        let usage = self.constraint(state);
        usage
            .is_constrained
            .then(|| format!("{:?} constrained", usage.constraint))
    }

    fn performance_trigger(&self, state: &SystemState) -> Option<String> {
        let perf = &state.performance;
        let c = &self.config;

        if perf.overall_score < c.low_score {
            Some(format!("overall score {:.2} below {:.2}", perf.overall_score, c.low_score))
        } else if perf.overall_score > c.high_score && self.constraint(state).is_constrained {
            Some(format!("overall score {:.2} with constrained resources", perf.overall_score))
        } else if perf.network_latency_ms > c.high_latency_ms {
            Some(format!("latency {:.0}ms above {:.0}ms", perf.network_latency_ms, c.high_latency_ms))
        } else if perf.network_latency_ms < c.low_latency_ms && perf.memory_usage > c.cache_memory_pressure {
            Some(format!(
                "memory usage {:.2} above {:.2} at {:.0}ms latency",
                perf.memory_usage, c.cache_memory_pressure, perf.network_latency_ms
            ))
        } else if perf.cpu_usage > c.busy_cpu {
            Some(format!("cpu usage {:.2} above {:.2}", perf.cpu_usage, c.busy_cpu))
        } else if perf.cpu_usage < c.idle_cpu && state.environment.cpu_cores > c.min_cores_for_scale_up {
            Some(format!(
                "cpu usage {:.2} below {:.2} on {} cores",
                perf.cpu_usage, c.idle_cpu, state.environment.cpu_cores
            ))
        } else {
            None
        }
    }

    fn feedback_trigger(&self, state: &SystemState) -> Option<String> {
        let count = state.feedback_at_least(self.config.min_feedback_severity).count();
        (count > 0).then(|| format!("{} feedback item(s) at {:?} or above", count, self.config.min_feedback_severity))
    }
}
