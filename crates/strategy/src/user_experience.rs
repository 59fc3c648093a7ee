//! User-experience strategy - reacts to what users say.

use crate::strategy::{fire_sub_rules, peak_factor, Strategy, SubRule};
use adaptive_core::{
    AdaptationNeed, AdaptationResult, AdaptationType, FeedbackSeverity, StrategyId, SystemState,
};
use adaptive_effectors::{CodeOptimizer, Verbosity};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Copy)]
enum FeedbackAction {
    SpeedUp,
    SetVerbosity(Verbosity),
    EnhanceErrorMessages,
    EnhanceDocumentation,
}

struct FeedbackRule {
    adaptation_type: &'static str,
    keywords: &'static [&'static str],
    description: &'static str,
    factor: f64,
    action: FeedbackAction,
}

// Evaluated in order; each rule fires at most once per execution.
const FEEDBACK_RULES: &[FeedbackRule] = &[
    FeedbackRule {
        adaptation_type: "UserExperience.ResponseTime",
        keywords: &["slow", "timeout"],
        description: "Enable speed-optimized generation",
        factor: 1.5,
        action: FeedbackAction::SpeedUp,
    },
    FeedbackRule {
        adaptation_type: "UserExperience.Verbosity",
        keywords: &["verbose", "too long"],
        description: "Reduce output verbosity",
        factor: 1.2,
        action: FeedbackAction::SetVerbosity(Verbosity::Concise),
    },
    FeedbackRule {
        adaptation_type: "UserExperience.Clarity",
        keywords: &["unclear", "confusing"],
        description: "Increase output detail",
        factor: 1.3,
        action: FeedbackAction::SetVerbosity(Verbosity::Detailed),
    },
    FeedbackRule {
        adaptation_type: "UserExperience.ErrorMessages",
        keywords: &["error message"],
        description: "Enhance error messages",
        factor: 1.3,
        action: FeedbackAction::EnhanceErrorMessages,
    },
    FeedbackRule {
        adaptation_type: "UserExperience.Documentation",
        keywords: &["documentation"],
        description: "Enhance generated documentation",
        factor: 1.2,
        action: FeedbackAction::EnhanceDocumentation,
    },
];

/// Configuration for the user-experience strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UserExperienceConfig {
    /// Feedback below this severity is ignored
    pub min_severity: FeedbackSeverity,
    /// Only the newest this-many feedback items are considered
    pub max_feedback_items: usize,
}

impl Default for UserExperienceConfig {
    fn default() -> Self {
        Self {
            min_severity: FeedbackSeverity::Medium,
            max_feedback_items: 50,
        }
    }
}

/// Turns recurring feedback themes into code-generation changes.
pub struct UserExperienceStrategy {
    id: StrategyId,
    optimizer: Arc<dyn CodeOptimizer>,
    config: UserExperienceConfig,
}

impl UserExperienceStrategy {
    /// Default strategy id.
    pub const ID: &'static str = "user-experience.default";

    /// Create with the default configuration.
    pub fn new(optimizer: Arc<dyn CodeOptimizer>) -> Self {
        Self {
            id: StrategyId::new(Self::ID),
            optimizer,
            config: UserExperienceConfig::default(),
        }
    }

    /// Set the configuration.
    pub fn with_config(mut self, config: UserExperienceConfig) -> Self {
        self.config = config;
        self
    }

    /// Register under a different id.
    pub fn with_id(mut self, id: StrategyId) -> Self {
        self.id = id;
        self
    }

    /// Lowercased content of the feedback this strategy listens to.
    fn relevant_feedback(&self, state: &SystemState) -> Vec<String> {
        let relevant: Vec<_> = state.feedback_at_least(self.config.min_severity).collect();
        let skip = relevant.len().saturating_sub(self.config.max_feedback_items);
        relevant[skip..].iter().map(|f| f.content.to_lowercase()).collect()
    }

    fn plan(&self, state: &SystemState) -> Vec<SubRule<FeedbackAction>> {
        let feedback = self.relevant_feedback(state);
        if feedback.is_empty() {
            return Vec::new();
        }

        FEEDBACK_RULES
            .iter()
            .filter_map(|rule| {
                let matches = feedback
                    .iter()
                    .filter(|text| rule.keywords.iter().any(|k| text.contains(k)))
                    .count();
                (matches > 0).then(|| {
                    SubRule::new(rule.adaptation_type, rule.description, rule.factor, rule.action)
                        .with_parameter("matched_feedback", matches)
                })
            })
            .collect()
    }

    async fn apply(&self, action: FeedbackAction) -> adaptive_effectors::Result<()> {
        match action {
            FeedbackAction::SpeedUp => self.optimizer.enable_speed_optimized_generation().await,
            FeedbackAction::SetVerbosity(v) => self.optimizer.set_verbosity(v).await,
            FeedbackAction::EnhanceErrorMessages => self.optimizer.enhance_error_messages().await,
            FeedbackAction::EnhanceDocumentation => self.optimizer.enhance_documentation().await,
        }
    }
}

#[async_trait]
impl Strategy for UserExperienceStrategy {
    fn id(&self) -> &StrategyId {
        &self.id
    }

    fn adaptation_type(&self) -> AdaptationType {
        AdaptationType::UserExperienceOptimization
    }

    fn description(&self) -> &str {
        "Adjusts generated output in response to user feedback"
    }

    fn priority(&self, state: &SystemState) -> u8 {
        match state.feedback_at_least(self.config.min_severity).map(|f| f.severity).max() {
            Some(FeedbackSeverity::Critical) => 90,
            Some(FeedbackSeverity::High) => 75,
            Some(FeedbackSeverity::Medium) => 55,
            Some(FeedbackSeverity::Low) => 30,
            None => 0,
        }
    }

    fn can_handle(&self, need: &AdaptationNeed) -> bool {
        need.adaptation_type == self.adaptation_type()
            && need.context.feedback_at_least(self.config.min_severity).next().is_some()
    }

    fn estimated_improvement(&self, need: &AdaptationNeed) -> f64 {
        peak_factor(&self.plan(&need.context))
    }

    async fn execute(&self, need: &AdaptationNeed) -> AdaptationResult {
        let plan = self.plan(&need.context);
        let result = fire_sub_rules(&self.id, need, plan, |action| self.apply(action)).await;
        info!(
            "{} applied {} user-experience adaptation(s)",
            self.id,
            result.applied_adaptations.len()
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adaptive_core::FeedbackItem;
    use adaptive_effectors::InMemoryCodeOptimizer;

    fn need(feedback: Vec<FeedbackItem>) -> AdaptationNeed {
        AdaptationNeed::new(
            AdaptationType::UserExperienceOptimization,
            "feedback",
            SystemState::default().with_feedback(feedback),
        )
    }

    fn strategy() -> (UserExperienceStrategy, Arc<InMemoryCodeOptimizer>) {
        let optimizer = Arc::new(InMemoryCodeOptimizer::new());
        (UserExperienceStrategy::new(optimizer.clone()), optimizer)
    }

    #[tokio::test]
    async fn test_slow_feedback_enables_speed_mode() {
        let (strategy, optimizer) = strategy();
        let n = need(vec![FeedbackItem::new(FeedbackSeverity::Medium, "this is way too slow")]);

        assert!(strategy.can_handle(&n));
        let result = strategy.execute(&n).await;
        assert_eq!(result.applied_adaptations.len(), 1);
        assert_eq!(result.applied_adaptations[0].adaptation_type, "UserExperience.ResponseTime");
        assert_eq!(result.applied_adaptations[0].estimated_improvement_factor, 1.5);
        assert!(optimizer.settings().await.speed_optimized);
    }

    #[tokio::test]
    async fn test_matching_is_case_insensitive_and_fires_once() {
        let (strategy, _) = strategy();
        let n = need(vec![
            FeedbackItem::new(FeedbackSeverity::High, "TIMEOUT again"),
            FeedbackItem::new(FeedbackSeverity::High, "so Slow"),
        ]);
        let result = strategy.execute(&n).await;
        assert_eq!(result.applied_adaptations.len(), 1);
        assert_eq!(result.applied_adaptations[0].parameters["matched_feedback"], "2");
    }

    #[tokio::test]
    async fn test_low_severity_feedback_is_ignored() {
        let (strategy, optimizer) = strategy();
        let n = need(vec![FeedbackItem::new(FeedbackSeverity::Low, "a bit slow")]);
        assert!(!strategy.can_handle(&n));
        assert!(!strategy.execute(&n).await.is_successful);
        assert!(!optimizer.settings().await.speed_optimized);
    }

    #[tokio::test]
    async fn test_several_themes_fire_several_rules() {
        let (strategy, optimizer) = strategy();
        let n = need(vec![
            FeedbackItem::new(FeedbackSeverity::Medium, "The error message was confusing"),
            FeedbackItem::new(FeedbackSeverity::Medium, "documentation is missing"),
        ]);
        let result = strategy.execute(&n).await;
        let kinds: Vec<_> = result.applied_adaptations.iter().map(|a| a.adaptation_type.as_str()).collect();
        assert_eq!(
            kinds,
            vec![
                "UserExperience.Clarity",
                "UserExperience.ErrorMessages",
                "UserExperience.Documentation"
            ]
        );
        let settings = optimizer.settings().await;
        assert_eq!(settings.verbosity, Verbosity::Detailed);
        assert!(settings.enhanced_error_messages);
        assert!(settings.enhanced_documentation);
    }

    #[tokio::test]
    async fn test_unmatched_feedback_is_noop() {
        let (strategy, _) = strategy();
        let n = need(vec![FeedbackItem::new(FeedbackSeverity::High, "love it")]);
        assert!(strategy.can_handle(&n));
        assert!(!strategy.execute(&n).await.is_successful);
        assert_eq!(strategy.estimated_improvement(&n), 1.0);
    }

    #[test]
    fn test_only_newest_items_considered() {
        let optimizer = Arc::new(InMemoryCodeOptimizer::new());
        let strategy = UserExperienceStrategy::new(optimizer).with_config(UserExperienceConfig {
            max_feedback_items: 1,
            ..Default::default()
        });
        let n = need(vec![
            FeedbackItem::new(FeedbackSeverity::Medium, "too verbose"),
            FeedbackItem::new(FeedbackSeverity::Medium, "fine"),
        ]);
        assert_eq!(strategy.estimated_improvement(&n), 1.0);
    }

    #[test]
    fn test_priority_follows_worst_severity() {
        let (strategy, _) = strategy();
        let critical = need(vec![FeedbackItem::new(FeedbackSeverity::Critical, "x")]);
        let medium = need(vec![FeedbackItem::new(FeedbackSeverity::Medium, "x")]);
        assert!(strategy.priority(&critical.context) > strategy.priority(&medium.context));
        assert_eq!(strategy.priority(&SystemState::default()), 0);
    }
}
