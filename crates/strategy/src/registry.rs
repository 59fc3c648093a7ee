//! Strategy registry.

use crate::Strategy;
use adaptive_core::{AdaptationType, StrategyId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

#[derive(Default)]
struct Index {
    strategies: HashMap<StrategyId, Arc<dyn Strategy>>,
    by_type: HashMap<AdaptationType, Vec<StrategyId>>,
}

/// Registry for adaptation strategies.
///
/// Both indexes sit behind one lock, so a reader sees either the state before
/// a registration or the state after it. Lookups clone `Arc` handles out and
/// release the lock before any strategy runs.
#[derive(Default)]
pub struct StrategyRegistry {
    index: RwLock<Index>,
}

impl StrategyRegistry {
    /// Create a new registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a strategy, replacing any strategy with the same id.
    ///
    /// A replaced strategy loses its place in the type order; the new
    /// instance goes to the end. Returns the replaced instance.
    pub async fn register(&self, strategy: Arc<dyn Strategy>) -> Option<Arc<dyn Strategy>> {
        let id = strategy.id().clone();
        let kind = strategy.adaptation_type();

        let mut index = self.index.write().await;
        let previous = index.strategies.insert(id.clone(), strategy);
        if let Some(old) = &previous {
            if let Some(ids) = index.by_type.get_mut(&old.adaptation_type()) {
                ids.retain(|x| x != &id);
            }
            debug!("Replacing strategy {}", id);
        }
        index.by_type.entry(kind).or_default().push(id.clone());

        info!("Registered strategy {} for {}", id, kind);
        previous
    }

    /// Register several strategies in order.
    pub async fn register_all(&self, strategies: impl IntoIterator<Item = Arc<dyn Strategy>>) {
        for strategy in strategies {
            self.register(strategy).await;
        }
    }

    /// Remove a strategy. Returns whether anything was removed.
    pub async fn remove(&self, id: &StrategyId) -> bool {
        let mut index = self.index.write().await;
        let Some(old) = index.strategies.remove(id) else {
            return false;
        };
        if let Some(ids) = index.by_type.get_mut(&old.adaptation_type()) {
            ids.retain(|x| x != id);
        }
        info!("Removed strategy {}", id);
        true
    }

    /// Get a strategy by ID.
    pub async fn get(&self, id: &StrategyId) -> Option<Arc<dyn Strategy>> {
        self.index.read().await.strategies.get(id).cloned()
    }

    /// Strategies for an adaptation type, in registration order.
    pub async fn strategies_for(&self, kind: AdaptationType) -> Vec<Arc<dyn Strategy>> {
        let index = self.index.read().await;
        index
            .by_type
            .get(&kind)
            .into_iter()
            .flat_map(|ids| ids.iter().filter_map(|id| index.strategies.get(id).cloned()))
            .collect()
    }

    /// Every registered strategy, in no particular order.
    pub async fn all_strategies(&self) -> Vec<Arc<dyn Strategy>> {
        self.index.read().await.strategies.values().cloned().collect()
    }

    /// Number of registered strategies.
    pub async fn len(&self) -> usize {
        self.index.read().await.strategies.len()
    }

    /// Whether nothing is registered.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
