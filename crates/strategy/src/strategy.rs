//! The strategy capability contract.

use adaptive_core::{
    AdaptationNeed, AdaptationResult, AdaptationType, AppliedAdaptation, StrategyId, SystemState,
};
use async_trait::async_trait;
use std::future::Future;
use tracing::{debug, warn};

/// A pluggable rule-set that decides and performs adaptations for one
/// adaptation type.
///
/// Everything except [`Strategy::execute`] must be side-effect free.
/// Strategies keep no per-adaptation state between calls.
#[async_trait]
pub trait Strategy: Send + Sync {
    /// Unique id used as the registry key.
    fn id(&self) -> &StrategyId;

    /// The adaptation type this strategy answers.
    fn adaptation_type(&self) -> AdaptationType;

    /// Human readable description.
    fn description(&self) -> &str;

    /// Ranking score in `0..=100` among strategies eligible for the same need.
    fn priority(&self, state: &SystemState) -> u8;

    /// Whether this strategy has anything to do for `need`.
    fn can_handle(&self, need: &AdaptationNeed) -> bool;

    /// Coarse forward estimate, reported before execution.
    fn estimated_improvement(&self, need: &AdaptationNeed) -> f64;

    /// Run every sub-rule and apply those that fire.
    async fn execute(&self, need: &AdaptationNeed) -> AdaptationResult;
}

/// One threshold-gated decision that fired during planning.
///
/// Planning is pure; the `action` is handed to an effector only when the
/// strategy executes.
#[derive(Debug, Clone)]
pub struct SubRule<A> {
    /// Dotted category, e.g. `Resource.CpuLimit`
    pub adaptation_type: &'static str,
    /// What will be done
    pub description: String,
    /// Fixed improvement factor for this sub-rule
    pub factor: f64,
    /// Knob values that will be set
    pub parameters: Vec<(&'static str, String)>,
    /// Effector action to perform
    pub action: A,
}

impl<A> SubRule<A> {
    /// Create a sub-rule outcome.
    pub fn new(adaptation_type: &'static str, description: impl Into<String>, factor: f64, action: A) -> Self {
        Self {
            adaptation_type,
            description: description.into(),
            factor,
            parameters: Vec::new(),
            action,
        }
    }

    /// Record a knob value.
    pub fn with_parameter(mut self, key: &'static str, value: impl ToString) -> Self {
        self.parameters.push((key, value.to_string()));
        self
    }

    fn into_adaptation(self, strategy_id: &StrategyId) -> AppliedAdaptation {
        self.parameters.into_iter().fold(
            AppliedAdaptation::new(
                self.adaptation_type,
                self.description,
                self.factor,
                strategy_id.clone(),
            ),
            |adaptation, (key, value)| adaptation.with_parameter(key, value),
        )
    }
}

/// Largest factor among planned sub-rules, or 1.0 when nothing would fire.
pub(crate) fn peak_factor<A>(plan: &[SubRule<A>]) -> f64 {
    plan.iter().map(|r| r.factor).reduce(f64::max).unwrap_or(1.0)
}

/// Apply planned sub-rules one by one.
///
/// An effector failure is logged and the sub-rule counts as not fired; the
/// remaining sub-rules still run.
pub(crate) async fn fire_sub_rules<A, F, Fut>(
    strategy_id: &StrategyId,
    need: &AdaptationNeed,
    plan: Vec<SubRule<A>>,
    apply: F,
) -> AdaptationResult
where
    A: Clone,
    F: Fn(A) -> Fut,
    Fut: Future<Output = adaptive_effectors::Result<()>>,
{
    let mut applied = Vec::with_capacity(plan.len());

    for rule in plan {
        match apply(rule.action.clone()).await {
            Ok(()) => {
                debug!(
                    "{} fired {} (factor {:.2})",
                    strategy_id, rule.adaptation_type, rule.factor
                );
                applied.push(rule.into_adaptation(strategy_id));
            }
            Err(e) => {
                warn!(
                    strategy = %strategy_id,
                    need = %need.adaptation_type,
                    sub_rule = rule.adaptation_type,
                    "Sub-rule did not fire: {}",
                    e
                );
            }
        }
    }

    AdaptationResult::from_adaptations(applied)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peak_factor_empty_is_neutral() {
        let plan: Vec<SubRule<()>> = Vec::new();
        assert_eq!(peak_factor(&plan), 1.0);
    }

    #[test]
    fn test_peak_factor_takes_max() {
        let plan = vec![
            SubRule::new("A", "a", 0.7, ()),
            SubRule::new("B", "b", 1.6, ()),
        ];
        assert_eq!(peak_factor(&plan), 1.6);
    }

    #[tokio::test]
    async fn test_failed_sub_rule_is_skipped() {
        let id = StrategyId::new("test");
        let need = AdaptationNeed::new(AdaptationType::ResourceOptimization, "test", SystemState::default());
        let plan = vec![
            SubRule::new("A", "fails", 1.2, false),
            SubRule::new("B", "works", 1.3, true).with_parameter("knob", 7),
        ];

        let result = fire_sub_rules(&id, &need, plan, |ok| async move {
            if ok {
                Ok(())
            } else {
                Err(adaptive_effectors::EffectorError::Unavailable("down".to_string()))
            }
        })
        .await;

        assert!(result.is_successful);
        assert_eq!(result.applied_adaptations.len(), 1);
        assert_eq!(result.applied_adaptations[0].adaptation_type, "B");
        assert_eq!(result.applied_adaptations[0].parameters["knob"], "7");
        assert_eq!(result.applied_adaptations[0].strategy_id, id);
    }
}
