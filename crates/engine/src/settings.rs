//! Engine-wide settings.

use crate::{DetectorConfig, LoopConfig, NeedDetector, OrchestratorConfig};
use adaptive_core::ResourceThresholds;
use adaptive_effectors::Effectors;
use adaptive_evaluation::EvaluatorConfig;
use adaptive_strategy::{
    PerformanceConfig, PerformanceStrategy, ResourceConfig, ResourceStrategy, Strategy,
    StrategyRegistry, UserExperienceConfig, UserExperienceStrategy,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Errors loading settings.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The settings file could not be read
    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),

    /// The settings file is not valid JSON for these settings
    #[error("invalid settings: {0}")]
    Parse(#[from] serde_json::Error),

    /// The settings parse but hold values the engine cannot run with
    #[error("invalid settings: {0}")]
    Invalid(String),
}

/// Every tunable the engine reads, grouped by component.
///
/// Missing sections and fields fall back to their defaults, so an empty JSON
/// object is a valid settings document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Constraint thresholds shared by need detection and every strategy
    pub thresholds: ResourceThresholds,
    /// Strategy dispatch
    pub orchestrator: OrchestratorConfig,
    /// Need detection
    pub detector: DetectorConfig,
    /// Adaptation loop
    pub adaptation_loop: LoopConfig,
    /// Resource strategy
    pub resource: ResourceConfig,
    /// Performance strategy
    pub performance: PerformanceConfig,
    /// User-experience strategy
    pub user_experience: UserExperienceConfig,
    /// Effectiveness evaluation
    pub evaluation: EvaluatorConfig,
}

impl EngineSettings {
    /// Load settings from a JSON file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await?;
        let settings: Self = serde_json::from_str(&content)?;
        settings
            .evaluation
            .validate()
            .map_err(|e| EngineError::Invalid(e.to_string()))?;
        info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// A need detector using the shared thresholds.
    pub fn detector(&self) -> NeedDetector {
        NeedDetector::new().with_config(DetectorConfig {
            thresholds: self.thresholds,
            ..self.detector.clone()
        })
    }

    /// The built-in strategies configured from these settings.
    pub fn strategies(&self, effectors: &Effectors) -> Vec<Arc<dyn Strategy>> {
        let resource = ResourceConfig {
            thresholds: self.thresholds,
            ..self.resource.clone()
        };
        let performance = PerformanceConfig {
            thresholds: self.thresholds,
            ..self.performance.clone()
        };
        vec![
            Arc::new(ResourceStrategy::new(effectors.resources.clone()).with_config(resource)),
            Arc::new(
                PerformanceStrategy::new(effectors.resources.clone(), effectors.optimizer.clone())
                    .with_config(performance),
            ),
            Arc::new(
                UserExperienceStrategy::new(effectors.optimizer.clone())
                    .with_config(self.user_experience.clone()),
            ),
        ]
    }

    /// A registry holding the configured built-in strategies.
    pub async fn build_registry(&self, effectors: &Effectors) -> StrategyRegistry {
        let registry = StrategyRegistry::new();
        registry.register_all(self.strategies(effectors)).await;
        registry
    }
}
