//! Effector abstraction.

use adaptive_core::OptimizationLevel;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Error type for effector calls.
pub type Result<T> = std::result::Result<T, EffectorError>;

/// Errors an effector may report.
#[derive(Debug, thiserror::Error)]
pub enum EffectorError {
    /// The effector could not be reached
    #[error("effector unavailable: {0}")]
    Unavailable(String),

    /// The effector refused the change
    #[error("{knob} rejected: {reason}")]
    Rejected {
        /// Knob that was being changed
        knob: String,
        /// Why it was refused
        reason: String,
    },

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Caching behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CachingMode {
    /// No caching
    Disabled,
    /// Regular caching
    #[default]
    Normal,
    /// Cache everything that can be cached
    Aggressive,
}

impl std::fmt::Display for CachingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disabled => write!(f, "disabled"),
            Self::Normal => write!(f, "normal"),
            Self::Aggressive => write!(f, "aggressive"),
        }
    }
}

/// Output verbosity of generated content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Verbosity {
    /// Short output
    Concise,
    /// Default
    #[default]
    Normal,
    /// Extra explanation
    Detailed,
}

impl std::fmt::Display for Verbosity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Concise => write!(f, "concise"),
            Self::Normal => write!(f, "normal"),
            Self::Detailed => write!(f, "detailed"),
        }
    }
}

/// Resource knobs: CPU, memory, disk, network and concurrency.
#[async_trait]
pub trait ResourceManager: Send + Sync {
    /// Cap CPU-intensive operations at `max_percent` of capacity.
    async fn limit_cpu_intensive_operations(&self, max_percent: u8) -> Result<()>;

    /// Force an aggressive garbage-collection pass.
    async fn force_garbage_collection(&self) -> Result<()>;

    /// Cap the cache at `percent` of its configured size.
    async fn set_cache_size_limit(&self, percent: u8) -> Result<()>;

    /// Purge temporary files.
    async fn cleanup_temp_files(&self) -> Result<()>;

    /// Toggle request batching.
    async fn set_request_batching(&self, enabled: bool) -> Result<()>;

    /// Scale network timeouts.
    async fn set_network_timeout_multiplier(&self, multiplier: f64) -> Result<()>;

    /// Set the maximum number of concurrent operations.
    async fn set_max_concurrency(&self, limit: usize) -> Result<()>;

    /// Switch caching behavior.
    async fn set_caching_mode(&self, mode: CachingMode) -> Result<()>;
}

/// Code-generation knobs: optimization level and output shape.
#[async_trait]
pub trait CodeOptimizer: Send + Sync {
    /// Set optimization aggressiveness.
    async fn set_optimization_level(&self, level: OptimizationLevel) -> Result<()>;

    /// Prefer fast generation over thoroughness.
    async fn enable_speed_optimized_generation(&self) -> Result<()>;

    /// Set output verbosity.
    async fn set_verbosity(&self, verbosity: Verbosity) -> Result<()>;

    /// Produce more helpful error messages.
    async fn enhance_error_messages(&self) -> Result<()>;

    /// Produce richer generated documentation.
    async fn enhance_documentation(&self) -> Result<()>;
}

/// The effector handles strategies are built with.
#[derive(Clone)]
pub struct Effectors {
    /// Resource knobs
    pub resources: Arc<dyn ResourceManager>,
    /// Code-generation knobs
    pub optimizer: Arc<dyn CodeOptimizer>,
}

impl Effectors {
    /// Bundle two effectors.
    pub fn new(resources: Arc<dyn ResourceManager>, optimizer: Arc<dyn CodeOptimizer>) -> Self {
        Self { resources, optimizer }
    }

    /// In-memory recording effectors.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(crate::InMemoryResourceManager::new()),
            Arc::new(crate::InMemoryCodeOptimizer::new()),
        )
    }
}
