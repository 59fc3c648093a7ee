//! Adaptation needs - typed requests to consider corrective action.

use crate::{SystemState, Time};
use serde::{Deserialize, Serialize};

/// The kind of adaptation being asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AdaptationType {
    /// Relieve pressure on CPU, memory, disk or network
    ResourceOptimization,
    /// Improve latency, throughput or the overall score
    PerformanceOptimization,
    /// React to user feedback
    UserExperienceOptimization,
    /// Recover from error bursts (no built-in strategy)
    ReliabilityOptimization,
}

impl AdaptationType {
    /// All variants.
    pub const ALL: [AdaptationType; 4] = [
        Self::ResourceOptimization,
        Self::PerformanceOptimization,
        Self::UserExperienceOptimization,
        Self::ReliabilityOptimization,
    ];
}

impl std::fmt::Display for AdaptationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ResourceOptimization => write!(f, "ResourceOptimization"),
            Self::PerformanceOptimization => write!(f, "PerformanceOptimization"),
            Self::UserExperienceOptimization => write!(f, "UserExperienceOptimization"),
            Self::ReliabilityOptimization => write!(f, "ReliabilityOptimization"),
        }
    }
}

/// Error returned when an adaptation type name is not recognized.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown adaptation type: {0}")]
pub struct ParseAdaptationTypeError(pub String);

impl std::str::FromStr for AdaptationType {
    type Err = ParseAdaptationTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['_', '-'], "").as_str() {
            "resource" | "resourceoptimization" => Ok(Self::ResourceOptimization),
            "performance" | "performanceoptimization" => Ok(Self::PerformanceOptimization),
            "ux" | "userexperience" | "userexperienceoptimization" => {
                Ok(Self::UserExperienceOptimization)
            }
            "reliability" | "reliabilityoptimization" => Ok(Self::ReliabilityOptimization),
            _ => Err(ParseAdaptationTypeError(s.to_string())),
        }
    }
}

/// A request to adapt, created by a detector when a monitored dimension
/// crosses a threshold. The orchestrator takes it by value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaptationNeed {
    /// What kind of adaptation
    pub adaptation_type: AdaptationType,

    /// Why it was requested
    pub trigger: String,

    /// The state that motivated it
    pub context: SystemState,

    /// When it was detected
    pub detected_at: Time,
}

impl AdaptationNeed {
    /// Create a new need.
    pub fn new(
        adaptation_type: AdaptationType,
        trigger: impl Into<String>,
        context: SystemState,
    ) -> Self {
        Self {
            adaptation_type,
            trigger: trigger.into(),
            context,
            detected_at: chrono::Utc::now(),
        }
    }
}
