//! In-memory storage, used by tests and short-lived processes.

use super::{AdaptationStore, PerformanceHistory, Result, StorageError};
use adaptive_core::{AdaptationId, AppliedAdaptation, PerformanceSample, Time};
use async_trait::async_trait;
use tokio::sync::Mutex;

/// Holds the adaptation log and performance history in memory.
#[derive(Default)]
pub struct MemoryStore {
    adaptations: Mutex<Vec<AppliedAdaptation>>,
    samples: Mutex<Vec<PerformanceSample>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of adaptations in the log.
    pub async fn adaptation_count(&self) -> usize {
        self.adaptations.lock().await.len()
    }
}

#[async_trait]
impl AdaptationStore for MemoryStore {
    async fn append_adaptation(&self, adaptation: &AppliedAdaptation) -> Result<()> {
        let mut log = self.adaptations.lock().await;
        if log.iter().any(|a| a.id == adaptation.id) {
            return Err(StorageError::AlreadyExists(adaptation.id.to_string()));
        }
        log.push(adaptation.clone());
        Ok(())
    }

    async fn load_adaptation(&self, id: AdaptationId) -> Result<Option<AppliedAdaptation>> {
        let log = self.adaptations.lock().await;
        Ok(log.iter().find(|a| a.id == id).cloned())
    }

    async fn list_adaptations(&self, since: Option<Time>) -> Result<Vec<AppliedAdaptation>> {
        let log = self.adaptations.lock().await;
        let mut out: Vec<_> = log
            .iter()
            .filter(|a| since.map_or(true, |t| a.applied_at >= t))
            .cloned()
            .collect();
        out.sort_by(|a, b| a.applied_at.cmp(&b.applied_at));
        Ok(out)
    }
}

#[async_trait]
impl PerformanceHistory for MemoryStore {
    async fn record_sample(&self, sample: &PerformanceSample) -> Result<()> {
        let mut samples = self.samples.lock().await;
        // Keep sorted; equal timestamps stay in arrival order.
        let pos = samples.partition_point(|s| s.timestamp <= sample.timestamp);
        samples.insert(pos, sample.clone());
        Ok(())
    }

    async fn all_samples(&self) -> Result<Vec<PerformanceSample>> {
        Ok(self.samples.lock().await.clone())
    }
}
