//! Storage trait abstraction.

use adaptive_core::{AdaptationId, AppliedAdaptation, PerformanceSample, Time};
use async_trait::async_trait;

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Append-only record already present
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Append-only log of applied adaptations.
#[async_trait]
pub trait AdaptationStore: Send + Sync {
    /// Append an adaptation. Appending an id twice is an error.
    async fn append_adaptation(&self, adaptation: &AppliedAdaptation) -> Result<()>;

    /// Load an adaptation by ID.
    async fn load_adaptation(&self, id: AdaptationId) -> Result<Option<AppliedAdaptation>>;

    /// List adaptations applied at or after `since`, oldest first.
    async fn list_adaptations(&self, since: Option<Time>) -> Result<Vec<AppliedAdaptation>>;
}

/// Time-ordered performance samples.
///
/// Only `record_sample` and `all_samples` are required; the window queries
/// have default implementations that backends may override.
#[async_trait]
pub trait PerformanceHistory: Send + Sync {
    /// Record a sample.
    async fn record_sample(&self, sample: &PerformanceSample) -> Result<()>;

    /// All samples, oldest first.
    async fn all_samples(&self) -> Result<Vec<PerformanceSample>>;

    /// Samples in `[start, end)`, oldest first.
    async fn samples_between(&self, start: Time, end: Time) -> Result<Vec<PerformanceSample>> {
        Ok(self
            .all_samples()
            .await?
            .into_iter()
            .filter(|s| s.timestamp >= start && s.timestamp < end)
            .collect())
    }

    /// The `limit` most recent samples strictly before `at`, oldest first.
    async fn samples_before(&self, at: Time, limit: usize) -> Result<Vec<PerformanceSample>> {
        let mut before: Vec<_> = self
            .all_samples()
            .await?
            .into_iter()
            .filter(|s| s.timestamp < at)
            .collect();
        let skip = before.len().saturating_sub(limit);
        Ok(before.split_off(skip))
    }

    /// The `limit` earliest samples at or after `at`, oldest first.
    async fn samples_after(&self, at: Time, limit: usize) -> Result<Vec<PerformanceSample>> {
        Ok(self
            .all_samples()
            .await?
            .into_iter()
            .filter(|s| s.timestamp >= at)
            .take(limit)
            .collect())
    }
}
