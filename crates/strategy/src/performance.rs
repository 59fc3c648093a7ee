//! Performance strategy - tunes optimization level, caching and concurrency.

use crate::strategy::{fire_sub_rules, peak_factor, Strategy, SubRule};
use adaptive_core::{
    AdaptationNeed, AdaptationResult, AdaptationType, OptimizationLevel, ResourceThresholds,
    StrategyId, SystemState,
};
use adaptive_effectors::{CachingMode, CodeOptimizer, ResourceManager};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

const RAISE_OPTIMIZATION_FACTOR: f64 = 1.5;
// Below 1.0: saves resources at the cost of speed.
const LOWER_OPTIMIZATION_FACTOR: f64 = 0.8;
const AGGRESSIVE_CACHING_FACTOR: f64 = 1.6;
const DISABLE_CACHING_FACTOR: f64 = 0.7;
const SCALE_UP_FACTOR: f64 = 1.3;
const SCALE_DOWN_FACTOR: f64 = 1.2;

/// Configuration for the performance strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    /// Thresholds deciding whether resources are constrained.
    ///
    /// Filled by the engine from its shared thresholds section.
    #[serde(skip)]
    pub thresholds: ResourceThresholds,
    /// Overall score below which optimization is raised
    pub low_score: f64,
    /// Overall score above which optimization may be lowered
    pub high_score: f64,
    /// Latency above which caching turns aggressive (ms)
    pub high_latency_ms: f64,
    /// Latency below which caching may be disabled (ms)
    pub low_latency_ms: f64,
    /// Memory usage above which low-latency caching is dropped
    pub cache_memory_pressure: f64,
    /// CPU usage below which concurrency is raised
    pub idle_cpu: f64,
    /// CPU usage above which concurrency is lowered
    pub busy_cpu: f64,
    /// Concurrency is only raised on hosts with more cores than this
    pub min_cores_for_scale_up: u32,
    /// Upper bound on raised concurrency
    pub max_concurrency: usize,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            thresholds: ResourceThresholds::default(),
            low_score: 0.6,
            high_score: 0.9,
            high_latency_ms: 100.0,
            low_latency_ms: 10.0,
            cache_memory_pressure: 0.8,
            idle_cpu: 0.5,
            busy_cpu: 0.9,
            min_cores_for_scale_up: 4,
            max_concurrency: 16,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum PerformanceAction {
    SetOptimizationLevel(OptimizationLevel),
    SetCaching(CachingMode),
    SetConcurrency(usize),
}

/// Reacts to poor scores, latency extremes and CPU imbalance.
pub struct PerformanceStrategy {
    id: StrategyId,
    resources: Arc<dyn ResourceManager>,
    optimizer: Arc<dyn CodeOptimizer>,
    config: PerformanceConfig,
}

impl PerformanceStrategy {
    /// Default strategy id.
    pub const ID: &'static str = "performance.default";

    /// Create with the default configuration.
    pub fn new(resources: Arc<dyn ResourceManager>, optimizer: Arc<dyn CodeOptimizer>) -> Self {
        Self {
            id: StrategyId::new(Self::ID),
            resources,
            optimizer,
            config: PerformanceConfig::default(),
        }
    }

    /// Set the configuration.
    pub fn with_config(mut self, config: PerformanceConfig) -> Self {
        self.config = config;
        self
    }

    /// Register under a different id.
    pub fn with_id(mut self, id: StrategyId) -> Self {
        self.id = id;
        self
    }

    fn plan(&self, state: &SystemState) -> Vec<SubRule<PerformanceAction>> {
        let c = &self.config;
        let perf = &state.performance;
        let env = &state.environment;
        let mut plan = Vec::new();

        // Optimization level
        if perf.overall_score < c.low_score {
            let level = env.optimization_level.raised();
            plan.push(
                SubRule::new(
                    "Performance.OptimizationLevel",
                    format!("Raise optimization level to {}", level),
                    RAISE_OPTIMIZATION_FACTOR,
                    PerformanceAction::SetOptimizationLevel(level),
                )
                .with_parameter("optimization_level", level),
            );
        } else if perf.overall_score > c.high_score
            && state.resources.rethreshold(&c.thresholds).is_constrained
        {
            let level = env.optimization_level.lowered();
            plan.push(
                SubRule::new(
                    "Performance.ResourceSaving",
                    format!("Lower optimization level to {} to save resources", level),
                    LOWER_OPTIMIZATION_FACTOR,
                    PerformanceAction::SetOptimizationLevel(level),
                )
                .with_parameter("optimization_level", level),
            );
        }

        // Caching
        if perf.network_latency_ms > c.high_latency_ms {
            plan.push(
                SubRule::new(
                    "Performance.Caching",
                    format!("Enable aggressive caching ({:.0}ms latency)", perf.network_latency_ms),
                    AGGRESSIVE_CACHING_FACTOR,
                    PerformanceAction::SetCaching(CachingMode::Aggressive),
                )
                .with_parameter("caching", CachingMode::Aggressive),
            );
        } else if perf.network_latency_ms < c.low_latency_ms
            && perf.memory_usage > c.cache_memory_pressure
        {
            plan.push(
                SubRule::new(
                    "Performance.CachingDisabled",
                    "Disable caching to free memory on a low-latency network",
                    DISABLE_CACHING_FACTOR,
                    PerformanceAction::SetCaching(CachingMode::Disabled),
                )
                .with_parameter("caching", CachingMode::Disabled),
            );
        }

        // Concurrency
        let cores = env.cpu_cores as usize;
        if perf.cpu_usage < c.idle_cpu && env.cpu_cores > c.min_cores_for_scale_up {
            let limit = (cores * 2).min(c.max_concurrency);
            plan.push(
                SubRule::new(
                    "Performance.Concurrency",
                    format!("Raise concurrency to {}", limit),
                    SCALE_UP_FACTOR,
                    PerformanceAction::SetConcurrency(limit),
                )
                .with_parameter("max_concurrency", limit),
            );
        } else if perf.cpu_usage > c.busy_cpu {
            let limit = (cores / 2).max(1);
            plan.push(
                SubRule::new(
                    "Performance.Concurrency",
                    format!("Lower concurrency to {}", limit),
                    SCALE_DOWN_FACTOR,
                    PerformanceAction::SetConcurrency(limit),
                )
                .with_parameter("max_concurrency", limit),
            );
        }

        plan
    }

    async fn apply(&self, action: PerformanceAction) -> adaptive_effectors::Result<()> {
        match action {
            PerformanceAction::SetOptimizationLevel(level) => {
                self.optimizer.set_optimization_level(level).await
            }
            PerformanceAction::SetCaching(mode) => self.resources.set_caching_mode(mode).await,
            PerformanceAction::SetConcurrency(limit) => self.resources.set_max_concurrency(limit).await,
        }
    }
}

#[async_trait]
impl Strategy for PerformanceStrategy {
    fn id(&self) -> &StrategyId {
        &self.id
    }

    fn adaptation_type(&self) -> AdaptationType {
        AdaptationType::PerformanceOptimization
    }

    fn description(&self) -> &str {
        "Tunes optimization level, caching and concurrency"
    }

    fn priority(&self, state: &SystemState) -> u8 {
        let perf = &state.performance;
        if perf.overall_score < self.config.low_score / 2.0 {
            95
        } else if perf.overall_score < self.config.low_score {
            85
        } else if perf.network_latency_ms > self.config.high_latency_ms {
            75
        } else if perf.cpu_usage > self.config.busy_cpu {
            70
        } else {
            40
        }
    }

    fn can_handle(&self, need: &AdaptationNeed) -> bool {
        need.adaptation_type == self.adaptation_type() && !self.plan(&need.context).is_empty()
    }

    fn estimated_improvement(&self, need: &AdaptationNeed) -> f64 {
        peak_factor(&self.plan(&need.context))
    }

    async fn execute(&self, need: &AdaptationNeed) -> AdaptationResult {
        let plan = self.plan(&need.context);
        let result = fire_sub_rules(&self.id, need, plan, |action| self.apply(action)).await;
        info!(
            "{} applied {} performance adaptation(s)",
            self.id,
            result.applied_adaptations.len()
        );
        result
    }
}
