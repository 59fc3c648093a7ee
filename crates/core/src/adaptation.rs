//! Applied adaptations and the results that carry them.

use crate::id::{AdaptationId, StrategyId};
use crate::Time;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Record of one concrete action taken by a strategy.
///
/// Created at execution time and appended to the history; never mutated
/// afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppliedAdaptation {
    /// Unique identifier
    pub id: AdaptationId,

    /// Dotted category, e.g. `Resource.CpuLimit`
    pub adaptation_type: String,

    /// Human readable description
    pub description: String,

    /// Self-reported improvement factor (>1.0 expected gain, <1.0 trade-off)
    pub estimated_improvement_factor: f64,

    /// When it was applied
    pub applied_at: Time,

    /// Concrete knobs changed
    pub parameters: BTreeMap<String, String>,

    /// Strategy that produced it (correlation only)
    pub strategy_id: StrategyId,
}

impl AppliedAdaptation {
    /// Create a record applied now.
    pub fn new(
        adaptation_type: impl Into<String>,
        description: impl Into<String>,
        estimated_improvement_factor: f64,
        strategy_id: StrategyId,
    ) -> Self {
        Self {
            id: AdaptationId::new(),
            adaptation_type: adaptation_type.into(),
            description: description.into(),
            estimated_improvement_factor,
            applied_at: chrono::Utc::now(),
            parameters: BTreeMap::new(),
            strategy_id,
        }
    }

    /// Add a changed parameter.
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.parameters.insert(key.into(), value.to_string());
        self
    }

    /// Override the application time.
    pub fn at(mut self, applied_at: Time) -> Self {
        self.applied_at = applied_at;
        self
    }
}

/// Output of one orchestration pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaptationResult {
    /// True iff at least one adaptation was applied
    pub is_successful: bool,

    /// Applied adaptations, in firing order
    pub applied_adaptations: Vec<AppliedAdaptation>,

    /// Sum of the applied factors. A relative signal, not a probability.
    pub estimated_improvement: f64,

    /// When the pass finished
    pub timestamp: Time,
}

impl AdaptationResult {
    /// Build a result from the adaptations that fired.
    pub fn from_adaptations(applied_adaptations: Vec<AppliedAdaptation>) -> Self {
        let estimated_improvement = applied_adaptations
            .iter()
            .map(|a| a.estimated_improvement_factor)
            .sum();
        Self {
            is_successful: !applied_adaptations.is_empty(),
            applied_adaptations,
            estimated_improvement,
            timestamp: chrono::Utc::now(),
        }
    }

    /// The "nothing to do" outcome.
    pub fn none() -> Self {
        Self::from_adaptations(Vec::new())
    }

    /// Fold another result into this one.
    pub fn merge(mut self, other: AdaptationResult) -> Self {
        self.applied_adaptations.extend(other.applied_adaptations);
        Self::from_adaptations(self.applied_adaptations)
    }
}

/// Realized vs. expected improvement for one applied adaptation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectivenessRecord {
    /// Correlated adaptation
    pub adaptation_id: AdaptationId,
    /// Dotted category of the adaptation
    pub adaptation_type: String,
    /// Strategy that produced it
    pub strategy_id: StrategyId,
    /// When the adaptation was applied
    pub applied_at: Time,
    /// The strategy's self-reported factor
    pub expected_improvement: f64,
    /// Mean overall score before
    pub before_score: f64,
    /// Mean overall score after
    pub after_score: f64,
    /// Relative score delta, `(after - before) / before`
    pub actual_improvement: f64,
    /// `actual_improvement` normalized by the baseline gain
    pub effectiveness_score: f64,
}

impl EffectivenessRecord {
    /// Lower bound of [`Self::display_score`].
    pub const DISPLAY_MIN: f64 = -1.0;
    /// Upper bound of [`Self::display_score`].
    pub const DISPLAY_MAX: f64 = 2.0;

    /// Effectiveness clamped to a range suitable for dashboards.
    pub fn display_score(&self) -> f64 {
        self.effectiveness_score.clamp(Self::DISPLAY_MIN, Self::DISPLAY_MAX)
    }

    /// Realized gain divided by the gain the strategy promised.
    ///
    /// `None` for factors of exactly 1.0, which promise nothing.
    pub fn calibration_ratio(&self) -> Option<f64> {
        let promised = self.expected_improvement - 1.0;
        if promised.abs() < f64::EPSILON {
            None
        } else {
            Some(self.actual_improvement / promised)
        }
    }

    /// Whether the adaptation helped.
    pub fn is_successful(&self) -> bool {
        self.effectiveness_score > 0.0
    }
}
