//! Snapshot source backed by a JSON file another process keeps current.

use adaptive_core::{ResourceThresholds, SystemState};
use adaptive_engine::StateSource;
use anyhow::Context;
use async_trait::async_trait;
use std::path::PathBuf;

/// Re-reads a `SystemState` JSON document on every snapshot.
///
/// Constraint flags in the document are ignored; they are derived from the
/// usage ratios and the configured thresholds.
pub struct FileStateSource {
    path: PathBuf,
    thresholds: ResourceThresholds,
}

impl FileStateSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            thresholds: ResourceThresholds::default(),
        }
    }

    pub fn with_thresholds(mut self, thresholds: ResourceThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }
}

#[async_trait]
impl StateSource for FileStateSource {
    async fn snapshot(&self) -> anyhow::Result<SystemState> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("reading {}", self.path.display()))?;
        let state: SystemState = serde_json::from_str(&content)
            .with_context(|| format!("parsing {}", self.path.display()))?;
        let mut state = state.with_thresholds(&self.thresholds);
        // Files are rewritten in place, so the write time is not the capture time.
        state.captured_at = chrono::Utc::now();
        Ok(state)
    }
}
