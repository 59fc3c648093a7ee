//! Adaptation strategies and the registry that holds them.
//!
//! A strategy inspects one slice of a [`SystemState`](adaptive_core::SystemState)
//! and runs independent, threshold-gated sub-rules against it. Each sub-rule
//! that fires turns one effector knob and yields one
//! [`AppliedAdaptation`](adaptive_core::AppliedAdaptation).

#![warn(missing_docs)]

pub mod strategy;
pub mod registry;
pub mod resource;
pub mod performance;
pub mod user_experience;

pub use strategy::{Strategy, SubRule};
pub use registry::StrategyRegistry;
pub use resource::{ResourceStrategy, ResourceConfig};
pub use performance::{PerformanceStrategy, PerformanceConfig};
pub use user_experience::{UserExperienceStrategy, UserExperienceConfig};

use adaptive_effectors::Effectors;
use std::sync::Arc;

/// The three built-in strategies with default configuration.
pub fn default_strategies(effectors: &Effectors) -> Vec<Arc<dyn Strategy>> {
    vec![
        Arc::new(ResourceStrategy::new(effectors.resources.clone())),
        Arc::new(PerformanceStrategy::new(effectors.resources.clone(), effectors.optimizer.clone())),
        Arc::new(UserExperienceStrategy::new(effectors.optimizer.clone())),
    ]
}
