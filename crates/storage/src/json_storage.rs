//! JSON file storage implementation.
//!
//! Stores one JSON file per adaptation under `adaptations/` and one per
//! performance sample under `samples/`. Sample file names start with the
//! millisecond timestamp so a directory listing is roughly chronological, but
//! reads always sort by the recorded timestamp.

use std::path::{Path, PathBuf};
use adaptive_core::{AdaptationId, AppliedAdaptation, PerformanceSample, Time};
use super::{AdaptationStore, PerformanceHistory, StorageError, Result};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// File-based JSON storage backend.
pub struct JsonStore {
    root: PathBuf,
}

impl JsonStore {
    /// Open storage rooted at `root`, creating the subdirectories it needs.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        fs::create_dir_all(root.join("adaptations")).await?;
        fs::create_dir_all(root.join("samples")).await?;

        Ok(Self { root })
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn adaptation_path(&self, id: AdaptationId) -> PathBuf {
        self.root.join("adaptations").join(format!("{}.json", id))
    }

    fn sample_path(&self, sample: &PerformanceSample) -> PathBuf {
        self.root.join("samples").join(format!(
            "{:013}-{}.json",
            sample.timestamp.timestamp_millis().max(0),
            ulid::Ulid::new()
        ))
    }
}

#[async_trait::async_trait]
impl AdaptationStore for JsonStore {
    async fn append_adaptation(&self, adaptation: &AppliedAdaptation) -> Result<()> {
        let json = serde_json::to_string_pretty(adaptation)?;
        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.adaptation_path(adaptation.id))
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(StorageError::AlreadyExists(adaptation.id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        file.write_all(json.as_bytes()).await?;
        file.flush().await?;
        debug!("Stored adaptation {} ({})", adaptation.id, adaptation.adaptation_type);
        Ok(())
    }

    async fn load_adaptation(&self, id: AdaptationId) -> Result<Option<AppliedAdaptation>> {
        read_json(&self.adaptation_path(id)).await
    }

    async fn list_adaptations(&self, since: Option<Time>) -> Result<Vec<AppliedAdaptation>> {
        let all: Vec<AppliedAdaptation> = list_dir(&self.root.join("adaptations")).await?;
        let mut out: Vec<_> = all
            .into_iter()
            .filter(|a| since.map_or(true, |t| a.applied_at >= t))
            .collect();
        out.sort_by(|a, b| a.applied_at.cmp(&b.applied_at));
        Ok(out)
    }
}

#[async_trait::async_trait]
impl PerformanceHistory for JsonStore {
    async fn record_sample(&self, sample: &PerformanceSample) -> Result<()> {
        let json = serde_json::to_string_pretty(sample)?;
        fs::write(self.sample_path(sample), json.as_bytes()).await?;
        Ok(())
    }

    async fn all_samples(&self) -> Result<Vec<PerformanceSample>> {
        let mut samples: Vec<PerformanceSample> = list_dir(&self.root.join("samples")).await?;
        samples.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(samples)
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match fs::read_to_string(path).await {
        Ok(json) => {
            let value = serde_json::from_str(&json)?;
            Ok(Some(value))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn list_dir<T: serde::de::DeserializeOwned>(dir: &Path) -> Result<Vec<T>> {
    let mut items = Vec::new();
    let mut rd = fs::read_dir(dir).await?;
    while let Some(entry) = rd.next_entry().await? {
        if entry.path().extension().and_then(|s| s.to_str()) != Some("json") {
            continue;
        }
        match read_json(&entry.path()).await {
            Ok(Some(item)) => items.push(item),
            Ok(None) => {}
            Err(e) => warn!("Skipping unreadable {}: {}", entry.path().display(), e),
        }
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use adaptive_core::StrategyId;
    use std::sync::Arc;
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn test_adaptations_persist_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let adaptation = AppliedAdaptation::new("Resource.CpuLimit", "cap cpu", 1.4, StrategyId::new("resource"))
            .with_parameter("max_cpu_percent", 50);
        {
            let store = JsonStore::new(dir.path()).await.unwrap();
            store.append_adaptation(&adaptation).await.unwrap();
        }

        let store = JsonStore::new(dir.path()).await.unwrap();
        let loaded = store.load_adaptation(adaptation.id).await.unwrap().unwrap();
        assert_eq!(loaded.adaptation_type, "Resource.CpuLimit");
        assert_eq!(loaded.parameters.get("max_cpu_percent").map(String::as_str), Some("50"));
        assert_eq!(store.list_adaptations(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_append_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path()).await.unwrap();
        let adaptation = AppliedAdaptation::new("a", "b", 1.0, StrategyId::new("s"));
        store.append_adaptation(&adaptation).await.unwrap();
        assert!(matches!(
            store.append_adaptation(&adaptation).await,
            Err(StorageError::AlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_duplicate_appends_store_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JsonStore::new(dir.path()).await.unwrap());
        let adaptation = AppliedAdaptation::new("a", "b", 1.0, StrategyId::new("s"));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                let adaptation = adaptation.clone();
                tokio::spawn(async move { store.append_adaptation(&adaptation).await })
            })
            .collect();

        let mut stored = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => stored += 1,
                Err(StorageError::AlreadyExists(id)) => assert_eq!(id, adaptation.id.to_string()),
                Err(e) => panic!("unexpected error: {}", e),
            }
        }
        assert_eq!(stored, 1);
        assert_eq!(store.list_adaptations(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_samples_sorted_and_windowed() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path()).await.unwrap();
        let t0 = Utc::now();
        for i in (0..5).rev() {
            store
                .record_sample(&PerformanceSample::scored(t0 + Duration::seconds(i), i as f64))
                .await
                .unwrap();
        }
        let all = store.all_samples().await.unwrap();
        let scores: Vec<f64> = all.iter().map(|s| s.overall_score).collect();
        assert_eq!(scores, vec![0.0, 1.0, 2.0, 3.0, 4.0]);

        let before = store.samples_before(t0 + Duration::seconds(2), 10).await.unwrap();
        assert_eq!(before.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_adaptation_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path()).await.unwrap();
        assert!(store.load_adaptation(AdaptationId::new()).await.unwrap().is_none());
    }
}
