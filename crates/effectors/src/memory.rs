//! In-memory effectors that record knob values.
//!
//! Each knob sits behind its own lock so concurrent evaluation passes
//! serialize only on the knob they actually touch.

use crate::r#trait::{CachingMode, CodeOptimizer, ResourceManager, Result, Verbosity};
use adaptive_core::OptimizationLevel;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

/// Snapshot of resource knob values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSettings {
    /// CPU-intensive operation cap (percent)
    pub cpu_limit_percent: u8,
    /// Cache size cap (percent)
    pub cache_limit_percent: u8,
    /// Forced GC passes so far
    pub gc_passes: u32,
    /// Temp-file purges so far
    pub temp_cleanups: u32,
    /// Request batching on
    pub request_batching: bool,
    /// Network timeout multiplier
    pub timeout_multiplier: f64,
    /// Max concurrent operations
    pub max_concurrency: usize,
    /// Caching behavior
    pub caching: CachingMode,
}

impl Default for ResourceSettings {
    fn default() -> Self {
        Self {
            cpu_limit_percent: 100,
            cache_limit_percent: 100,
            gc_passes: 0,
            temp_cleanups: 0,
            request_batching: false,
            timeout_multiplier: 1.0,
            max_concurrency: 4,
            caching: CachingMode::Normal,
        }
    }
}

/// Records resource knob changes in memory.
pub struct InMemoryResourceManager {
    cpu_limit_percent: Mutex<u8>,
    cache_limit_percent: Mutex<u8>,
    gc_passes: Mutex<u32>,
    temp_cleanups: Mutex<u32>,
    request_batching: Mutex<bool>,
    timeout_multiplier: Mutex<f64>,
    max_concurrency: Mutex<usize>,
    caching: Mutex<CachingMode>,
}

impl InMemoryResourceManager {
    /// Start from the default settings.
    pub fn new() -> Self {
        Self::with_settings(ResourceSettings::default())
    }

    /// Start from explicit settings.
    pub fn with_settings(settings: ResourceSettings) -> Self {
        Self {
            cpu_limit_percent: Mutex::new(settings.cpu_limit_percent),
            cache_limit_percent: Mutex::new(settings.cache_limit_percent),
            gc_passes: Mutex::new(settings.gc_passes),
            temp_cleanups: Mutex::new(settings.temp_cleanups),
            request_batching: Mutex::new(settings.request_batching),
            timeout_multiplier: Mutex::new(settings.timeout_multiplier),
            max_concurrency: Mutex::new(settings.max_concurrency),
            caching: Mutex::new(settings.caching),
        }
    }

    /// Current knob values.
    pub async fn settings(&self) -> ResourceSettings {
        ResourceSettings {
            cpu_limit_percent: *self.cpu_limit_percent.lock().await,
            cache_limit_percent: *self.cache_limit_percent.lock().await,
            gc_passes: *self.gc_passes.lock().await,
            temp_cleanups: *self.temp_cleanups.lock().await,
            request_batching: *self.request_batching.lock().await,
            timeout_multiplier: *self.timeout_multiplier.lock().await,
            max_concurrency: *self.max_concurrency.lock().await,
            caching: *self.caching.lock().await,
        }
    }
}

impl Default for InMemoryResourceManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResourceManager for InMemoryResourceManager {
    async fn limit_cpu_intensive_operations(&self, max_percent: u8) -> Result<()> {
        *self.cpu_limit_percent.lock().await = max_percent.min(100);
        debug!("CPU-intensive operations capped at {}%", max_percent);
        Ok(())
    }

    async fn force_garbage_collection(&self) -> Result<()> {
        *self.gc_passes.lock().await += 1;
        debug!("Forced garbage collection");
        Ok(())
    }

    async fn set_cache_size_limit(&self, percent: u8) -> Result<()> {
        *self.cache_limit_percent.lock().await = percent.min(100);
        debug!("Cache capped at {}%", percent);
        Ok(())
    }

    async fn cleanup_temp_files(&self) -> Result<()> {
        *self.temp_cleanups.lock().await += 1;
        debug!("Purged temporary files");
        Ok(())
    }

    async fn set_request_batching(&self, enabled: bool) -> Result<()> {
        *self.request_batching.lock().await = enabled;
        debug!("Request batching: {}", enabled);
        Ok(())
    }

    async fn set_network_timeout_multiplier(&self, multiplier: f64) -> Result<()> {
        *self.timeout_multiplier.lock().await = multiplier;
        debug!("Network timeout multiplier: {}", multiplier);
        Ok(())
    }

    async fn set_max_concurrency(&self, limit: usize) -> Result<()> {
        *self.max_concurrency.lock().await = limit.max(1);
        debug!("Max concurrency: {}", limit);
        Ok(())
    }

    async fn set_caching_mode(&self, mode: CachingMode) -> Result<()> {
        *self.caching.lock().await = mode;
        debug!("Caching mode: {}", mode);
        Ok(())
    }
}

/// Snapshot of code-generation knob values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationSettings {
    /// Optimization aggressiveness
    pub optimization_level: OptimizationLevel,
    /// Speed-optimized generation on
    pub speed_optimized: bool,
    /// Output verbosity
    pub verbosity: Verbosity,
    /// Enhanced error messages on
    pub enhanced_error_messages: bool,
    /// Enhanced documentation on
    pub enhanced_documentation: bool,
}

/// Records code-generation knob changes in memory.
#[derive(Default)]
pub struct InMemoryCodeOptimizer {
    optimization_level: Mutex<OptimizationLevel>,
    speed_optimized: Mutex<bool>,
    verbosity: Mutex<Verbosity>,
    enhanced_error_messages: Mutex<bool>,
    enhanced_documentation: Mutex<bool>,
}

impl InMemoryCodeOptimizer {
    /// Start from the default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current knob values.
    pub async fn settings(&self) -> GenerationSettings {
        GenerationSettings {
            optimization_level: *self.optimization_level.lock().await,
            speed_optimized: *self.speed_optimized.lock().await,
            verbosity: *self.verbosity.lock().await,
            enhanced_error_messages: *self.enhanced_error_messages.lock().await,
            enhanced_documentation: *self.enhanced_documentation.lock().await,
        }
    }
}

#[async_trait]
impl CodeOptimizer for InMemoryCodeOptimizer {
    async fn set_optimization_level(&self, level: OptimizationLevel) -> Result<()> {
        *self.optimization_level.lock().await = level;
        debug!("Optimization level: {}", level);
        Ok(())
    }

    async fn enable_speed_optimized_generation(&self) -> Result<()> {
        *self.speed_optimized.lock().await = true;
        debug!("Speed-optimized generation enabled");
        Ok(())
    }

    async fn set_verbosity(&self, verbosity: Verbosity) -> Result<()> {
        *self.verbosity.lock().await = verbosity;
        debug!("Verbosity: {}", verbosity);
        Ok(())
    }

    async fn enhance_error_messages(&self) -> Result<()> {
        *self.enhanced_error_messages.lock().await = true;
        debug!("Enhanced error messages enabled");
        Ok(())
    }

    async fn enhance_documentation(&self) -> Result<()> {
        *self.enhanced_documentation.lock().await = true;
        debug!("Enhanced documentation enabled");
        Ok(())
    }
}
