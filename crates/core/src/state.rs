//! System state snapshot - what the monitors saw at one point in time.

use crate::Time;
use serde::{Deserialize, Serialize};

/// Point-in-time snapshot of performance, resource, environment and feedback signals.
///
/// Snapshots are produced by external monitors and never mutated by the engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemState {
    /// Aggregated performance metrics
    pub performance: PerformanceMetrics,

    /// Per-resource utilization
    pub resources: ResourceUtilization,

    /// Host and runtime profile
    pub environment: EnvironmentProfile,

    /// Recent user feedback, newest last
    pub recent_feedback: Vec<FeedbackItem>,

    /// When the snapshot was taken
    pub captured_at: Time,
}

impl SystemState {
    /// Create a snapshot captured now.
    pub fn new(
        performance: PerformanceMetrics,
        resources: ResourceUtilization,
        environment: EnvironmentProfile,
    ) -> Self {
        Self {
            performance,
            resources,
            environment,
            recent_feedback: Vec::new(),
            captured_at: chrono::Utc::now(),
        }
    }

    /// Attach recent feedback.
    pub fn with_feedback(mut self, feedback: Vec<FeedbackItem>) -> Self {
        self.recent_feedback = feedback;
        self
    }

    /// Re-evaluate the resource constraint against `thresholds`.
    pub fn with_thresholds(mut self, thresholds: &ResourceThresholds) -> Self {
        self.resources = self.resources.rethreshold(thresholds);
        self
    }

    /// Feedback items at or above the given severity, oldest first.
    pub fn feedback_at_least(&self, severity: FeedbackSeverity) -> impl Iterator<Item = &FeedbackItem> {
        self.recent_feedback.iter().filter(move |f| f.severity >= severity)
    }
}

/// Aggregated performance metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// CPU utilization (0.0 - 1.0)
    pub cpu_usage: f64,
    /// Memory utilization (0.0 - 1.0)
    pub memory_usage: f64,
    /// Network utilization (0.0 - 1.0)
    pub network_usage: f64,
    /// Network round-trip latency (milliseconds)
    pub network_latency_ms: f64,
    /// Mean response time (milliseconds)
    pub response_time_ms: f64,
    /// Requests per second
    pub throughput: f64,
    /// Overall performance score (0.0 - 1.0, higher is better)
    pub overall_score: f64,
    /// Severity classification
    pub severity: PerformanceSeverity,
}

impl PerformanceMetrics {
    /// Recompute `severity` from `overall_score`.
    pub fn classified(mut self) -> Self {
        self.severity = PerformanceSeverity::classify(self.overall_score);
        self
    }
}

impl Default for PerformanceMetrics {
    fn default() -> Self {
        Self {
            cpu_usage: 0.5,
            memory_usage: 0.5,
            network_usage: 0.1,
            network_latency_ms: 50.0,
            response_time_ms: 200.0,
            throughput: 100.0,
            overall_score: 0.75,
            severity: PerformanceSeverity::Normal,
        }
    }
}

/// How bad the current performance is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum PerformanceSeverity {
    /// Within normal range
    #[default]
    Normal,
    /// Noticeably degraded
    Degraded,
    /// Critically degraded
    Critical,
}

impl PerformanceSeverity {
    /// Classify an overall score.
    pub fn classify(overall_score: f64) -> Self {
        if overall_score < 0.4 {
            Self::Critical
        } else if overall_score < 0.6 {
            Self::Degraded
        } else {
            Self::Normal
        }
    }
}

/// Thresholds above which a resource counts as constrained.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceThresholds {
    /// CPU usage threshold
    pub cpu: f64,
    /// Memory usage threshold
    pub memory: f64,
    /// Disk usage threshold
    pub disk: f64,
    /// Network usage threshold
    pub network: f64,
}

impl Default for ResourceThresholds {
    fn default() -> Self {
        Self {
            cpu: 0.9,
            memory: 0.85,
            disk: 0.9,
            network: 0.8,
        }
    }
}

/// Which resource dominates the current pressure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ConstraintType {
    /// Nothing over threshold
    #[default]
    None,
    /// CPU bound
    Cpu,
    /// Memory bound
    Memory,
    /// Disk bound
    Disk,
    /// Network bound
    Network,
}

/// Per-resource usage ratios.
///
/// Construct through [`ResourceUtilization::new`] or
/// [`ResourceUtilization::with_thresholds`] so that ratios are clamped and the
/// constraint fields agree with the ratios. Deserializing goes through the same
/// path with the default thresholds: stored `constraint` and `is_constrained`
/// values are ignored and recomputed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "RawUtilization")]
pub struct ResourceUtilization {
    /// CPU usage (0.0 - 1.0)
    pub cpu_usage: f64,
    /// Memory usage (0.0 - 1.0)
    pub memory_usage: f64,
    /// Disk usage (0.0 - 1.0)
    pub disk_usage: f64,
    /// Network usage (0.0 - 1.0)
    pub network_usage: f64,
    /// Dominant constraint
    pub constraint: ConstraintType,
    /// Whether any resource is over its threshold
    pub is_constrained: bool,
}

impl ResourceUtilization {
    /// Build with the default thresholds.
    pub fn new(cpu: f64, memory: f64, disk: f64, network: f64) -> Self {
        Self::with_thresholds(cpu, memory, disk, network, &ResourceThresholds::default())
    }

    /// Build with explicit thresholds.
    pub fn with_thresholds(
        cpu: f64,
        memory: f64,
        disk: f64,
        network: f64,
        thresholds: &ResourceThresholds,
    ) -> Self {
        let cpu_usage = clamp_ratio(cpu);
        let memory_usage = clamp_ratio(memory);
        let disk_usage = clamp_ratio(disk);
        let network_usage = clamp_ratio(network);

        // Declaration order doubles as dominance order.
        let constraint = if cpu_usage > thresholds.cpu {
            ConstraintType::Cpu
        } else if memory_usage > thresholds.memory {
            ConstraintType::Memory
        } else if disk_usage > thresholds.disk {
            ConstraintType::Disk
        } else if network_usage > thresholds.network {
            ConstraintType::Network
        } else {
            ConstraintType::None
        };

        Self {
            cpu_usage,
            memory_usage,
            disk_usage,
            network_usage,
            constraint,
            is_constrained: constraint != ConstraintType::None,
        }
    }

    /// The same ratios re-evaluated against `thresholds`.
    pub fn rethreshold(&self, thresholds: &ResourceThresholds) -> Self {
        Self::with_thresholds(
            self.cpu_usage,
            self.memory_usage,
            self.disk_usage,
            self.network_usage,
            thresholds,
        )
    }
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct RawUtilization {
    cpu_usage: f64,
    memory_usage: f64,
    disk_usage: f64,
    network_usage: f64,
}

impl From<RawUtilization> for ResourceUtilization {
    fn from(raw: RawUtilization) -> Self {
        Self::new(raw.cpu_usage, raw.memory_usage, raw.disk_usage, raw.network_usage)
    }
}

fn clamp_ratio(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Kind of platform the engine runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PlatformType {
    /// Developer workstation
    Desktop,
    /// Dedicated server
    Server,
    /// Container with cgroup limits
    Container,
    /// Function-as-a-service runtime
    Serverless,
    /// Not detected
    #[default]
    Unknown,
}

/// Code-generation optimization aggressiveness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum OptimizationLevel {
    /// Cheapest to run
    Minimal,
    /// Default trade-off
    #[default]
    Balanced,
    /// Favors speed over resources
    Aggressive,
    /// Everything on
    Maximum,
}

impl OptimizationLevel {
    /// One step more aggressive, saturating.
    pub fn raised(self) -> Self {
        match self {
            Self::Minimal => Self::Balanced,
            Self::Balanced => Self::Aggressive,
            Self::Aggressive | Self::Maximum => Self::Maximum,
        }
    }

    /// One step less aggressive, saturating.
    pub fn lowered(self) -> Self {
        match self {
            Self::Maximum => Self::Aggressive,
            Self::Aggressive => Self::Balanced,
            Self::Balanced | Self::Minimal => Self::Minimal,
        }
    }
}

impl std::fmt::Display for OptimizationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Minimal => write!(f, "minimal"),
            Self::Balanced => write!(f, "balanced"),
            Self::Aggressive => write!(f, "aggressive"),
            Self::Maximum => write!(f, "maximum"),
        }
    }
}

/// Host and runtime profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentProfile {
    /// Platform kind
    pub platform: PlatformType,
    /// Logical CPU cores
    pub cpu_cores: u32,
    /// Available memory (megabytes)
    pub available_memory_mb: u64,
    /// Current optimization level
    pub optimization_level: OptimizationLevel,
}

impl Default for EnvironmentProfile {
    fn default() -> Self {
        Self {
            platform: PlatformType::Unknown,
            cpu_cores: 4,
            available_memory_mb: 8192,
            optimization_level: OptimizationLevel::Balanced,
        }
    }
}

/// Severity a user attached to their feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum FeedbackSeverity {
    /// Minor remark
    Low,
    /// Noticeable annoyance
    #[default]
    Medium,
    /// Blocks the user's work
    High,
    /// Unusable
    Critical,
}

/// One piece of user feedback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackItem {
    /// Severity
    pub severity: FeedbackSeverity,
    /// Free-text content
    pub content: String,
    /// When it was received
    pub received_at: Time,
}

impl FeedbackItem {
    /// Create a feedback item received now.
    pub fn new(severity: FeedbackSeverity, content: impl Into<String>) -> Self {
        Self {
            severity,
            content: content.into(),
            received_at: chrono::Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utilization_below_thresholds_is_unconstrained() {
        let usage = ResourceUtilization::new(0.5, 0.5, 0.5, 0.5);
        assert!(!usage.is_constrained);
        assert_eq!(usage.constraint, ConstraintType::None);
    }

    #[test]
    fn test_utilization_clamps_ratios() {
        let usage = ResourceUtilization::new(1.7, -0.2, f64::NAN, 0.3);
        assert_eq!(usage.cpu_usage, 1.0);
        assert_eq!(usage.memory_usage, 0.0);
        assert_eq!(usage.disk_usage, 0.0);
        assert_eq!(usage.network_usage, 0.3);
    }

    #[test]
    fn test_cpu_dominates_disk() {
        let usage = ResourceUtilization::new(0.95, 0.1, 0.95, 0.1);
        assert!(usage.is_constrained);
        assert_eq!(usage.constraint, ConstraintType::Cpu);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let usage = ResourceUtilization::new(0.9, 0.85, 0.9, 0.8);
        assert!(!usage.is_constrained);
    }

    #[test]
    fn test_custom_thresholds() {
        let thresholds = ResourceThresholds { network: 0.5, ..Default::default() };
        let usage = ResourceUtilization::with_thresholds(0.1, 0.1, 0.1, 0.6, &thresholds);
        assert_eq!(usage.constraint, ConstraintType::Network);
    }

    #[test]
    fn test_deserialize_recomputes_constraint() {
        let json = r#"{
            "cpu_usage": 1.7,
            "memory_usage": 0.95,
            "disk_usage": 0.1,
            "network_usage": 0.1,
            "constraint": "None",
            "is_constrained": false
        }"#;
        let usage: ResourceUtilization = serde_json::from_str(json).unwrap();
        assert_eq!(usage.cpu_usage, 1.0);
        assert_eq!(usage.constraint, ConstraintType::Cpu);
        assert!(usage.is_constrained);

        let bare: ResourceUtilization = serde_json::from_str(r#"{ "disk_usage": 0.95 }"#).unwrap();
        assert_eq!(bare.constraint, ConstraintType::Disk);
    }

    #[test]
    fn test_rethreshold_uses_new_limits() {
        let usage = ResourceUtilization::new(0.7, 0.1, 0.1, 0.1);
        assert!(!usage.is_constrained);
        let tight = usage.rethreshold(&ResourceThresholds { cpu: 0.5, ..Default::default() });
        assert_eq!(tight.constraint, ConstraintType::Cpu);
        assert_eq!(tight.cpu_usage, 0.7);
    }

    #[test]
    fn test_optimization_level_saturates() {
        assert_eq!(OptimizationLevel::Maximum.raised(), OptimizationLevel::Maximum);
        assert_eq!(OptimizationLevel::Minimal.lowered(), OptimizationLevel::Minimal);
        assert_eq!(OptimizationLevel::Balanced.raised(), OptimizationLevel::Aggressive);
    }

    #[test]
    fn test_performance_severity_classification() {
        assert_eq!(PerformanceSeverity::classify(0.3), PerformanceSeverity::Critical);
        assert_eq!(PerformanceSeverity::classify(0.5), PerformanceSeverity::Degraded);
        assert_eq!(PerformanceSeverity::classify(0.8), PerformanceSeverity::Normal);
    }

    #[test]
    fn test_feedback_filter_by_severity() {
        let state = SystemState::default().with_feedback(vec![
            FeedbackItem::new(FeedbackSeverity::Low, "meh"),
            FeedbackItem::new(FeedbackSeverity::High, "broken"),
        ]);
        let items: Vec<_> = state.feedback_at_least(FeedbackSeverity::Medium).collect();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].content, "broken");
    }

    #[test]
    fn test_state_serializes() {
        let state = SystemState::default();
        let json = serde_json::to_string(&state).unwrap();
        let back: SystemState = serde_json::from_str(&json).unwrap();
        assert_eq!(back.environment.cpu_cores, 4);
    }
}
