//! Effectiveness evaluator - scores adaptations against the samples around them.

use crate::{bucket_samples, EffectivenessReport, EvaluationError, Result, TrendBucket};
use adaptive_core::{AppliedAdaptation, EffectivenessRecord, PerformanceSample, Time};
use adaptive_storage::{AdaptationStore, PerformanceHistory};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Configuration for the evaluator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    /// Samples taken on each side of an adaptation
    pub window_samples: usize,
    /// Relative gain that counts as a score of 1.0
    pub baseline_improvement: f64,
    /// Trend bucket size (seconds)
    pub trend_bucket_secs: i64,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            window_samples: 10,
            baseline_improvement: 0.1,
            trend_bucket_secs: 300,
        }
    }
}

impl EvaluatorConfig {
    /// Reject settings that would divide by zero or produce non-finite scores.
    pub fn validate(&self) -> Result<()> {
        if !self.baseline_improvement.is_finite() || self.baseline_improvement <= 0.0 {
            return Err(EvaluationError::InvalidConfig(format!(
                "baseline_improvement must be positive, got {}",
                self.baseline_improvement
            )));
        }
        Ok(())
    }
}

/// Correlates applied adaptations with before/after performance.
pub struct EffectivenessEvaluator {
    adaptations: Arc<dyn AdaptationStore>,
    samples: Arc<dyn PerformanceHistory>,
    config: EvaluatorConfig,
}

impl EffectivenessEvaluator {
    /// Create an evaluator over the given history.
    pub fn new(adaptations: Arc<dyn AdaptationStore>, samples: Arc<dyn PerformanceHistory>) -> Self {
        Self {
            adaptations,
            samples,
            config: EvaluatorConfig::default(),
        }
    }

    /// Set the configuration.
    pub fn with_config(mut self, config: EvaluatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Score one adaptation.
    ///
    /// `Ok(None)` when either window is empty or the before score is zero.
    pub async fn evaluate(&self, adaptation: &AppliedAdaptation) -> Result<Option<EffectivenessRecord>> {
        self.config.validate()?;
        let at = adaptation.applied_at;
        let n = self.config.window_samples;

        let Some(before_score) = mean_score(&self.samples.samples_before(at, n).await?) else {
            debug!("Excluding {}: no samples before {}", adaptation.id, at);
            return Ok(None);
        };
        let Some(after_score) = mean_score(&self.samples.samples_after(at, n).await?) else {
            debug!("Excluding {}: no samples after {}", adaptation.id, at);
            return Ok(None);
        };
        if before_score == 0.0 {
            debug!("Excluding {}: zero baseline score", adaptation.id);
            return Ok(None);
        }

        let actual_improvement = (after_score - before_score) / before_score;
        Ok(Some(EffectivenessRecord {
            adaptation_id: adaptation.id,
            adaptation_type: adaptation.adaptation_type.clone(),
            strategy_id: adaptation.strategy_id.clone(),
            applied_at: at,
            expected_improvement: adaptation.estimated_improvement_factor,
            before_score,
            after_score,
            actual_improvement,
            effectiveness_score: actual_improvement / self.config.baseline_improvement,
        }))
    }

    /// Score every adaptation applied at or after `since`.
    pub async fn report(&self, since: Option<Time>) -> Result<EffectivenessReport> {
        self.config.validate()?;
        let adaptations = self.adaptations.list_adaptations(since).await?;

        let mut records = Vec::with_capacity(adaptations.len());
        let mut excluded = 0;
        for adaptation in &adaptations {
            match self.evaluate(adaptation).await? {
                Some(record) => records.push(record),
                None => excluded += 1,
            }
        }

        let report = EffectivenessReport::new(records, excluded);
        info!(
            "Evaluated {} adaptation(s), excluded {}, overall effectiveness {:.2}",
            report.evaluated, report.excluded, report.overall_effectiveness
        );
        Ok(report)
    }

    /// Bucketed performance over `[start, end)` using the configured bucket size.
    pub async fn trends(&self, start: Time, end: Time) -> Result<Vec<TrendBucket>> {
        if end <= start {
            return Err(EvaluationError::InvalidWindow(format!("{} is not before {}", start, end)));
        }
        let bucket = chrono::Duration::try_seconds(self.config.trend_bucket_secs)
            .filter(|b| *b > chrono::Duration::zero())
            .ok_or_else(|| {
                EvaluationError::InvalidWindow(format!("bucket size {}s", self.config.trend_bucket_secs))
            })?;

        let samples = self.samples.samples_between(start, end).await?;
        Ok(bucket_samples(&samples, start, end, bucket))
    }
}

fn mean_score(samples: &[PerformanceSample]) -> Option<f64> {
    if samples.is_empty() {
        None
    } else {
        Some(samples.iter().map(|s| s.overall_score).sum::<f64>() / samples.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TrendSummary;
    use adaptive_core::StrategyId;
    use adaptive_storage::{JsonStore, MemoryStore};
    use chrono::{Duration, TimeZone};

    fn t0() -> Time {
        chrono::Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    fn adaptation(minutes: i64, factor: f64) -> AppliedAdaptation {
        AppliedAdaptation::new("Resource.CpuLimit", "cap cpu", factor, StrategyId::new("resource.default"))
            .at(t0() + Duration::minutes(minutes))
    }

    async fn record_scores(store: &MemoryStore, from_minute: i64, scores: &[f64]) {
        for (i, score) in scores.iter().enumerate() {
            let ts = t0() + Duration::minutes(from_minute + i as i64);
            store.record_sample(&PerformanceSample::scored(ts, *score)).await.unwrap();
        }
    }

    fn evaluator(store: &Arc<MemoryStore>) -> EffectivenessEvaluator {
        EffectivenessEvaluator::new(store.clone(), store.clone())
    }

    #[tokio::test]
    async fn test_score_relative_to_baseline() {
        let store = Arc::new(MemoryStore::new());
        record_scores(&store, 0, &[0.5, 0.5]).await;
        record_scores(&store, 10, &[0.55, 0.55]).await;

        let record = evaluator(&store).evaluate(&adaptation(5, 1.4)).await.unwrap().unwrap();
        assert!((record.before_score - 0.5).abs() < 1e-9);
        assert!((record.after_score - 0.55).abs() < 1e-9);
        assert!((record.actual_improvement - 0.1).abs() < 1e-9);
        assert!((record.effectiveness_score - 1.0).abs() < 1e-9);
        assert!((record.calibration_ratio().unwrap() - 0.25).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_windows_are_capped_and_adjacent() {
        let store = Arc::new(MemoryStore::new());
        // Old samples fall outside the ten-sample window.
        record_scores(&store, 0, &[0.1; 5]).await;
        record_scores(&store, 5, &[0.5; 10]).await;
        record_scores(&store, 15, &[0.6; 10]).await;
        record_scores(&store, 25, &[0.9; 5]).await;

        let record = evaluator(&store).evaluate(&adaptation(15, 1.3)).await.unwrap().unwrap();
        assert!((record.before_score - 0.5).abs() < 1e-9);
        assert!((record.after_score - 0.6).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_missing_before_samples_excluded_without_error() {
        let store = Arc::new(MemoryStore::new());
        record_scores(&store, 10, &[0.6, 0.7]).await;
        store.append_adaptation(&adaptation(5, 1.4)).await.unwrap();

        let eval = evaluator(&store);
        assert!(eval.evaluate(&adaptation(5, 1.4)).await.unwrap().is_none());

        let report = eval.report(None).await.unwrap();
        assert_eq!(report.evaluated, 0);
        assert_eq!(report.excluded, 1);
        assert_eq!(report.overall_effectiveness, 0.0);
    }

    #[tokio::test]
    async fn test_zero_baseline_excluded() {
        let store = Arc::new(MemoryStore::new());
        record_scores(&store, 0, &[0.0]).await;
        record_scores(&store, 10, &[0.5]).await;
        assert!(evaluator(&store).evaluate(&adaptation(5, 1.4)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_report_mixes_evaluated_and_excluded() {
        let store = Arc::new(MemoryStore::new());
        record_scores(&store, 0, &[0.5, 0.5]).await;
        record_scores(&store, 10, &[0.45, 0.45]).await;
        store.append_adaptation(&adaptation(5, 1.4)).await.unwrap();
        store.append_adaptation(&adaptation(60, 1.2)).await.unwrap();

        let report = evaluator(&store).report(None).await.unwrap();
        assert_eq!(report.evaluated, 1);
        assert_eq!(report.excluded, 1);
        assert_eq!(report.successful_adaptations, 0);
        assert!((report.overall_effectiveness + 1.0).abs() < 1e-9);
        assert_eq!(report.by_type["Resource.CpuLimit"].count, 1);

        let recent = evaluator(&store).report(Some(t0() + Duration::minutes(30))).await.unwrap();
        assert_eq!(recent.evaluated + recent.excluded, 1);
    }

    #[tokio::test]
    async fn test_trends_over_json_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JsonStore::new(dir.path()).await.unwrap());
        for (minute, score) in [(0, 0.5), (3, 0.5), (12, 0.7)] {
            store
                .record_sample(&PerformanceSample::scored(t0() + Duration::minutes(minute), score))
                .await
                .unwrap();
        }

        let eval = EffectivenessEvaluator::new(store.clone(), store.clone());
        let buckets = eval.trends(t0(), t0() + Duration::minutes(15)).await.unwrap();
        assert_eq!(buckets.len(), 2);
        assert_eq!(TrendSummary::from_buckets(&buckets).direction, crate::TrendDirection::Improving);

        assert!(matches!(
            eval.trends(t0(), t0()).await,
            Err(EvaluationError::InvalidWindow(_))
        ));
    }

    #[tokio::test]
    async fn test_non_positive_baseline_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        record_scores(&store, 0, &[0.5]).await;
        record_scores(&store, 10, &[0.6]).await;
        store.append_adaptation(&adaptation(5, 1.4)).await.unwrap();

        for baseline in [0.0, -0.1, f64::NAN, f64::INFINITY] {
            let eval = evaluator(&store).with_config(EvaluatorConfig {
                baseline_improvement: baseline,
                ..Default::default()
            });
            assert!(matches!(
                eval.evaluate(&adaptation(5, 1.4)).await,
                Err(EvaluationError::InvalidConfig(_))
            ));
            assert!(matches!(eval.report(None).await, Err(EvaluationError::InvalidConfig(_))));
        }
    }

    #[tokio::test]
    async fn test_out_of_range_bucket_size_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        for secs in [0, -60, i64::MAX, i64::MIN] {
            let eval = evaluator(&store).with_config(EvaluatorConfig {
                trend_bucket_secs: secs,
                ..Default::default()
            });
            assert!(matches!(
                eval.trends(t0(), t0() + Duration::hours(1)).await,
                Err(EvaluationError::InvalidWindow(_))
            ));
        }
    }
}
