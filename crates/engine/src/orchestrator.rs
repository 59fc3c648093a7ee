//! Strategy selection and execution.

use adaptive_core::{AdaptationNeed, AdaptationResult};
use adaptive_storage::AdaptationStore;
use adaptive_strategy::{Strategy, StrategyRegistry};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info};

/// How many ranked strategies run for one need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DispatchMode {
    /// Only the top-ranked strategy runs
    #[default]
    SingleWinner,
    /// Every eligible strategy runs, in rank order
    FanOut,
}

/// Configuration for the orchestrator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Dispatch mode
    pub dispatch: DispatchMode,
}

/// An eligible strategy with its ranking inputs.
pub struct RankedStrategy {
    /// The strategy
    pub strategy: Arc<dyn Strategy>,
    /// Priority for this need's state
    pub priority: u8,
    /// Forward estimate for this need
    pub estimated_improvement: f64,
}

/// Picks and runs strategies for adaptation needs.
///
/// The orchestrator holds no adaptation state of its own: the outcome depends
/// only on the registry contents and the need. Applied adaptations are
/// appended to the history store.
pub struct AdaptationOrchestrator {
    registry: Arc<StrategyRegistry>,
    history: Arc<dyn AdaptationStore>,
    config: OrchestratorConfig,
}

impl AdaptationOrchestrator {
    /// Create a new orchestrator.
    pub fn new(registry: Arc<StrategyRegistry>, history: Arc<dyn AdaptationStore>) -> Self {
        Self {
            registry,
            history,
            config: OrchestratorConfig::default(),
        }
    }

    /// Set the configuration.
    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    /// The registry strategies are looked up in.
    pub fn registry(&self) -> &Arc<StrategyRegistry> {
        &self.registry
    }

    /// Eligible strategies for `need`, best first, without executing any.
    pub async fn rank(&self, need: &AdaptationNeed) -> Vec<RankedStrategy> {
        let mut ranked: Vec<_> = self
            .registry
            .strategies_for(need.adaptation_type)
            .await
            .into_iter()
            .filter(|s| s.can_handle(need))
            .map(|strategy| RankedStrategy {
                priority: strategy.priority(&need.context),
                estimated_improvement: strategy.estimated_improvement(need),
                strategy,
            })
            .collect();

        // Stable: equal priorities keep registration order.
        ranked.sort_by(|a, b| b.priority.cmp(&a.priority));
        ranked
    }

    /// Handle one need. Never fails: "nothing to do" is an unsuccessful result.
    pub async fn handle(&self, need: AdaptationNeed) -> AdaptationResult {
        info!("Handling {} need: {}", need.adaptation_type, need.trigger);

        let ranked = self.rank(&need).await;
        if ranked.is_empty() {
            info!("No strategy can handle {} need", need.adaptation_type);
            return AdaptationResult::none();
        }

        let selected = match self.config.dispatch {
            DispatchMode::SingleWinner => &ranked[..1],
            DispatchMode::FanOut => &ranked[..],
        };

        let mut result = AdaptationResult::none();
        for candidate in selected {
            debug!(
                "Executing {} (priority {}, estimate {:.2})",
                candidate.strategy.id(),
                candidate.priority,
                candidate.estimated_improvement
            );
            result = result.merge(candidate.strategy.execute(&need).await);
        }

        for adaptation in &result.applied_adaptations {
            if let Err(e) = self.history.append_adaptation(adaptation).await {
                error!(
                    strategy = %adaptation.strategy_id,
                    need = %need.adaptation_type,
                    "Failed to record adaptation {}: {}",
                    adaptation.id,
                    e
                );
            }
        }

        info!(
            "{} need produced {} adaptation(s), estimated improvement {:.2}",
            need.adaptation_type,
            result.applied_adaptations.len(),
            result.estimated_improvement
        );
        result
    }
}
