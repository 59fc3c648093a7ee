//! Resource strategy - relieves CPU, memory, disk and network pressure.

use crate::strategy::{fire_sub_rules, peak_factor, Strategy, SubRule};
use adaptive_core::{
    AdaptationNeed, AdaptationResult, AdaptationType, ConstraintType, ResourceThresholds,
    ResourceUtilization, StrategyId, SystemState,
};
use adaptive_effectors::ResourceManager;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

const CPU_LIMIT_FACTOR: f64 = 1.4;
const MEMORY_FACTOR: f64 = 1.3;
const DISK_FACTOR: f64 = 1.2;
const NETWORK_FACTOR: f64 = 1.3;

/// Configuration for the resource strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    /// Usage ratios above which each sub-rule fires.
    ///
    /// Not read from settings files; the engine fills it from its shared
    /// thresholds section.
    #[serde(skip)]
    pub thresholds: ResourceThresholds,
    /// CPU-intensive operation cap when CPU is constrained
    pub cpu_limit_percent: u8,
    /// Cache cap when memory is constrained
    pub memory_cache_limit_percent: u8,
    /// Cache cap when disk is constrained
    pub disk_cache_limit_percent: u8,
    /// Network timeout multiplier when network is constrained
    pub timeout_multiplier: f64,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            thresholds: ResourceThresholds::default(),
            cpu_limit_percent: 50,
            memory_cache_limit_percent: 30,
            disk_cache_limit_percent: 20,
            timeout_multiplier: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum ResourceAction {
    LimitCpu { max_percent: u8 },
    RelieveMemory { cache_percent: u8 },
    CleanDisk { cache_percent: u8 },
    RelieveNetwork { timeout_multiplier: f64 },
}

/// Reacts to resource utilization over threshold.
pub struct ResourceStrategy {
    id: StrategyId,
    resources: Arc<dyn ResourceManager>,
    config: ResourceConfig,
}

impl ResourceStrategy {
    /// Default strategy id.
    pub const ID: &'static str = "resource.default";

    /// Create with the default configuration.
    pub fn new(resources: Arc<dyn ResourceManager>) -> Self {
        Self {
            id: StrategyId::new(Self::ID),
            resources,
            config: ResourceConfig::default(),
        }
    }

    /// Set the configuration.
    pub fn with_config(mut self, config: ResourceConfig) -> Self {
        self.config = config;
        self
    }

    /// Register under a different id.
    pub fn with_id(mut self, id: StrategyId) -> Self {
        self.id = id;
        self
    }

    fn constraint(&self, usage: &ResourceUtilization) -> ConstraintType {
        usage.rethreshold(&self.config.thresholds).constraint
    }

    fn plan(&self, state: &SystemState) -> Vec<SubRule<ResourceAction>> {
        let usage = &state.resources;
        let t = &self.config.thresholds;
        let mut plan = Vec::new();

        if usage.cpu_usage > t.cpu {
            let max_percent = self.config.cpu_limit_percent;
            plan.push(
                SubRule::new(
                    "Resource.CpuLimit",
                    format!("Cap CPU-intensive operations at {}%", max_percent),
                    CPU_LIMIT_FACTOR,
                    ResourceAction::LimitCpu { max_percent },
                )
                .with_parameter("max_cpu_percent", max_percent),
            );
        }

        if usage.memory_usage > t.memory {
            let cache_percent = self.config.memory_cache_limit_percent;
            plan.push(
                SubRule::new(
                    "Resource.MemoryOptimization",
                    format!("Force garbage collection and cap cache at {}%", cache_percent),
                    MEMORY_FACTOR,
                    ResourceAction::RelieveMemory { cache_percent },
                )
                .with_parameter("gc_mode", "aggressive")
                .with_parameter("cache_limit_percent", cache_percent),
            );
        }

        if usage.disk_usage > t.disk {
            let cache_percent = self.config.disk_cache_limit_percent;
            plan.push(
                SubRule::new(
                    "Resource.DiskCleanup",
                    format!("Purge temporary files and cap cache at {}%", cache_percent),
                    DISK_FACTOR,
                    ResourceAction::CleanDisk { cache_percent },
                )
                .with_parameter("temp_files", "purged")
                .with_parameter("cache_limit_percent", cache_percent),
            );
        }

        if usage.network_usage > t.network {
            let timeout_multiplier = self.config.timeout_multiplier;
            plan.push(
                SubRule::new(
                    "Resource.NetworkOptimization",
                    format!("Batch requests and scale timeouts by {}x", timeout_multiplier),
                    NETWORK_FACTOR,
                    ResourceAction::RelieveNetwork { timeout_multiplier },
                )
                .with_parameter("request_batching", true)
                .with_parameter("timeout_multiplier", timeout_multiplier),
            );
        }

        plan
    }

    async fn apply(&self, action: ResourceAction) -> adaptive_effectors::Result<()> {
        match action {
            ResourceAction::LimitCpu { max_percent } => {
                self.resources.limit_cpu_intensive_operations(max_percent).await
            }
            ResourceAction::RelieveMemory { cache_percent } => {
                self.resources.force_garbage_collection().await?;
                self.resources.set_cache_size_limit(cache_percent).await
            }
            ResourceAction::CleanDisk { cache_percent } => {
                self.resources.cleanup_temp_files().await?;
                self.resources.set_cache_size_limit(cache_percent).await
            }
            ResourceAction::RelieveNetwork { timeout_multiplier } => {
                self.resources.set_request_batching(true).await?;
                self.resources.set_network_timeout_multiplier(timeout_multiplier).await
            }
        }
    }
}

#[async_trait]
impl Strategy for ResourceStrategy {
    fn id(&self) -> &StrategyId {
        &self.id
    }

    fn adaptation_type(&self) -> AdaptationType {
        AdaptationType::ResourceOptimization
    }

    fn description(&self) -> &str {
        "Relieves CPU, memory, disk and network pressure"
    }

    fn priority(&self, state: &SystemState) -> u8 {
        match self.constraint(&state.resources) {
            ConstraintType::Cpu => 90,
            ConstraintType::Memory => 80,
            ConstraintType::Network => 70,
            ConstraintType::Disk => 60,
            ConstraintType::None => 10,
        }
    }

    fn can_handle(&self, need: &AdaptationNeed) -> bool {
        need.adaptation_type == self.adaptation_type()
            && self.constraint(&need.context.resources) != ConstraintType::None
    }

    fn estimated_improvement(&self, need: &AdaptationNeed) -> f64 {
        peak_factor(&self.plan(&need.context))
    }

    async fn execute(&self, need: &AdaptationNeed) -> AdaptationResult {
        let plan = self.plan(&need.context);
        let result = fire_sub_rules(&self.id, need, plan, |action| self.apply(action)).await;
        info!(
            "{} applied {} resource adaptation(s)",
            self.id,
            result.applied_adaptations.len()
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adaptive_effectors::{
        CachingMode, EffectorError, InMemoryResourceManager, ResourceSettings,
    };

    fn need(cpu: f64, memory: f64, disk: f64, network: f64) -> AdaptationNeed {
        let state = SystemState {
            resources: ResourceUtilization::new(cpu, memory, disk, network),
            ..Default::default()
        };
        AdaptationNeed::new(AdaptationType::ResourceOptimization, "test", state)
    }

    fn strategy() -> (ResourceStrategy, Arc<InMemoryResourceManager>) {
        let manager = Arc::new(InMemoryResourceManager::new());
        (ResourceStrategy::new(manager.clone()), manager)
    }

    /// Fails every memory-relief call, passes everything else through.
    struct BrokenGc(InMemoryResourceManager);

    #[async_trait]
    impl ResourceManager for BrokenGc {
        async fn limit_cpu_intensive_operations(&self, p: u8) -> adaptive_effectors::Result<()> {
            self.0.limit_cpu_intensive_operations(p).await
        }
        async fn force_garbage_collection(&self) -> adaptive_effectors::Result<()> {
            Err(EffectorError::Unavailable("gc endpoint down".to_string()))
        }
        async fn set_cache_size_limit(&self, p: u8) -> adaptive_effectors::Result<()> {
            self.0.set_cache_size_limit(p).await
        }
        async fn cleanup_temp_files(&self) -> adaptive_effectors::Result<()> {
            self.0.cleanup_temp_files().await
        }
        async fn set_request_batching(&self, on: bool) -> adaptive_effectors::Result<()> {
            self.0.set_request_batching(on).await
        }
        async fn set_network_timeout_multiplier(&self, m: f64) -> adaptive_effectors::Result<()> {
            self.0.set_network_timeout_multiplier(m).await
        }
        async fn set_max_concurrency(&self, n: usize) -> adaptive_effectors::Result<()> {
            self.0.set_max_concurrency(n).await
        }
        async fn set_caching_mode(&self, mode: CachingMode) -> adaptive_effectors::Result<()> {
            self.0.set_caching_mode(mode).await
        }
    }

    #[tokio::test]
    async fn test_cpu_only_fires_one_rule() {
        let (strategy, manager) = strategy();
        let result = strategy.execute(&need(0.95, 0.40, 0.10, 0.10)).await;

        assert!(result.is_successful);
        assert_eq!(result.applied_adaptations.len(), 1);
        assert_eq!(result.applied_adaptations[0].adaptation_type, "Resource.CpuLimit");
        assert_eq!(result.applied_adaptations[0].estimated_improvement_factor, 1.4);
        assert!((result.estimated_improvement - 1.4).abs() < 1e-9);
        assert_eq!(manager.settings().await.cpu_limit_percent, 50);
    }

    #[tokio::test]
    async fn test_cpu_and_memory_fire_two_rules() {
        let (strategy, manager) = strategy();
        let result = strategy.execute(&need(0.95, 0.90, 0.0, 0.0)).await;

        assert_eq!(result.applied_adaptations.len(), 2);
        assert!((result.estimated_improvement - 2.7).abs() < 1e-9);
        let settings = manager.settings().await;
        assert_eq!(settings.gc_passes, 1);
        assert_eq!(settings.cache_limit_percent, 30);
    }

    #[tokio::test]
    async fn test_cpu_threshold_is_monotonic() {
        let (strategy, _) = strategy();

        let below = strategy.execute(&need(0.89, 0.0, 0.0, 0.0)).await;
        assert!(!below.is_successful);

        let above = strategy.execute(&need(0.91, 0.0, 0.0, 0.0)).await;
        assert_eq!(above.applied_adaptations.len(), 1);
        assert_eq!(above.applied_adaptations[0].estimated_improvement_factor, 1.4);
    }

    #[tokio::test]
    async fn test_quiet_state_is_idempotent_noop() {
        let (strategy, manager) = strategy();
        let quiet = need(0.2, 0.2, 0.2, 0.2);

        let first = strategy.execute(&quiet).await;
        let second = strategy.execute(&quiet).await;

        assert!(!first.is_successful);
        assert!(!second.is_successful);
        assert!(first.applied_adaptations.is_empty());
        assert_eq!(manager.settings().await, ResourceSettings::default());
    }

    #[tokio::test]
    async fn test_memory_failure_does_not_block_siblings() {
        let strategy = ResourceStrategy::new(Arc::new(BrokenGc(InMemoryResourceManager::new())));
        let result = strategy.execute(&need(0.1, 0.95, 0.95, 0.95)).await;

        let kinds: Vec<_> = result
            .applied_adaptations
            .iter()
            .map(|a| a.adaptation_type.as_str())
            .collect();
        assert_eq!(kinds, vec!["Resource.DiskCleanup", "Resource.NetworkOptimization"]);
        assert!((result.estimated_improvement - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_priority_follows_dominant_constraint() {
        let (strategy, _) = strategy();
        let cpu = need(0.95, 0.0, 0.0, 0.0);
        let disk = need(0.0, 0.0, 0.95, 0.0);
        assert!(strategy.priority(&cpu.context) > strategy.priority(&disk.context));
        assert_eq!(strategy.priority(&need(0.1, 0.1, 0.1, 0.1).context), 10);
    }

    #[test]
    fn test_can_handle_requires_type_and_pressure() {
        let (strategy, _) = strategy();
        assert!(strategy.can_handle(&need(0.95, 0.0, 0.0, 0.0)));
        assert!(!strategy.can_handle(&need(0.5, 0.0, 0.0, 0.0)));

        let mut wrong_type = need(0.95, 0.0, 0.0, 0.0);
        wrong_type.adaptation_type = AdaptationType::PerformanceOptimization;
        assert!(!strategy.can_handle(&wrong_type));
    }

    #[test]
    fn test_recalibrated_thresholds() {
        let manager = Arc::new(InMemoryResourceManager::new());
        let strategy = ResourceStrategy::new(manager).with_config(ResourceConfig {
            thresholds: ResourceThresholds { cpu: 0.5, ..Default::default() },
            ..Default::default()
        });
        assert!(strategy.can_handle(&need(0.6, 0.0, 0.0, 0.0)));
        assert_eq!(strategy.estimated_improvement(&need(0.6, 0.0, 0.0, 0.0)), 1.4);
        assert_eq!(strategy.estimated_improvement(&need(0.1, 0.0, 0.0, 0.0)), 1.0);
    }
}
