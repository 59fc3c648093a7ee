//! Performance trends - bucketed means over the sample history.

use adaptive_core::{PerformanceSample, Time};
use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Mean metrics over one bucket of the window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendBucket {
    /// Bucket start (inclusive)
    pub start: Time,
    /// Bucket end (exclusive)
    pub end: Time,
    /// Samples that fell in the bucket
    pub sample_count: usize,
    /// Mean CPU utilization
    pub cpu_usage: f64,
    /// Mean memory utilization
    pub memory_usage: f64,
    /// Mean response time (ms)
    pub response_time_ms: f64,
    /// Mean throughput
    pub throughput: f64,
    /// Mean overall score
    pub overall_score: f64,
}

/// Partition `samples` into consecutive `bucket`-sized slices of
/// `[start, end)` and average each one.
///
/// Buckets with no samples are left out rather than zero-filled. Samples
/// outside the window are ignored. `bucket` must be positive.
pub fn bucket_samples(
    samples: &[PerformanceSample],
    start: Time,
    end: Time,
    bucket: Duration,
) -> Vec<TrendBucket> {
    let bucket_ms = bucket.num_milliseconds();
    if bucket_ms <= 0 || end <= start {
        return Vec::new();
    }

    let mut groups: std::collections::BTreeMap<i64, Vec<&PerformanceSample>> = Default::default();
    for sample in samples.iter().filter(|s| s.timestamp >= start && s.timestamp < end) {
        let offset = (sample.timestamp - start).num_milliseconds();
        groups.entry(offset / bucket_ms).or_default().push(sample);
    }

    groups
        .into_iter()
        .map(|(index, members)| {
            let bucket_start = start + Duration::milliseconds(index * bucket_ms);
            let n = members.len() as f64;
            let mean = |f: fn(&PerformanceSample) -> f64| members.iter().map(|s| f(s)).sum::<f64>() / n;
            TrendBucket {
                start: bucket_start,
                end: (bucket_start + bucket).min(end),
                sample_count: members.len(),
                cpu_usage: mean(|s| s.cpu_usage),
                memory_usage: mean(|s| s.memory_usage),
                response_time_ms: mean(|s| s.response_time_ms),
                throughput: mean(|s| s.throughput),
                overall_score: mean(|s| s.overall_score),
            }
        })
        .collect()
}

/// Direction of the overall score across a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendDirection {
    /// Last bucket scores noticeably higher than the first
    Improving,
    /// Last bucket scores noticeably lower than the first
    Degrading,
    /// Within tolerance, or too few buckets to tell
    Stable,
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrendDirection::Improving => write!(f, "improving"),
            TrendDirection::Degrading => write!(f, "degrading"),
            TrendDirection::Stable => write!(f, "stable"),
        }
    }
}

/// First-vs-last summary of a bucket sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendSummary {
    /// Overall direction
    pub direction: TrendDirection,
    /// Last minus first bucket overall score
    pub score_delta: f64,
    /// Buckets that held samples
    pub bucket_count: usize,
    /// Samples across all buckets
    pub sample_count: usize,
}

impl TrendSummary {
    /// Score deltas smaller than this count as stable.
    pub const TOLERANCE: f64 = 0.02;

    /// Summarize a bucket sequence.
    pub fn from_buckets(buckets: &[TrendBucket]) -> Self {
        let score_delta = match (buckets.first(), buckets.last()) {
            (Some(first), Some(last)) => last.overall_score - first.overall_score,
            _ => 0.0,
        };
        let direction = if score_delta > Self::TOLERANCE {
            TrendDirection::Improving
        } else if score_delta < -Self::TOLERANCE {
            TrendDirection::Degrading
        } else {
            TrendDirection::Stable
        };

        Self {
            direction,
            score_delta,
            bucket_count: buckets.len(),
            sample_count: buckets.iter().map(|b| b.sample_count).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> Time {
        chrono::Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    fn at(minutes: i64, score: f64) -> PerformanceSample {
        PerformanceSample::scored(t0() + Duration::minutes(minutes), score)
    }

    #[test]
    fn test_buckets_average_their_members() {
        let samples = vec![at(0, 0.4), at(2, 0.6), at(6, 0.8)];
        let buckets = bucket_samples(&samples, t0(), t0() + Duration::minutes(10), Duration::minutes(5));

        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].sample_count, 2);
        assert!((buckets[0].overall_score - 0.5).abs() < 1e-9);
        assert_eq!(buckets[1].start, t0() + Duration::minutes(5));
        assert_eq!(buckets[1].end, t0() + Duration::minutes(10));
        assert!((buckets[1].overall_score - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_empty_buckets_are_omitted() {
        let samples = vec![at(1, 0.5), at(21, 0.7)];
        let buckets = bucket_samples(&samples, t0(), t0() + Duration::minutes(30), Duration::minutes(5));

        let starts: Vec<_> = buckets.iter().map(|b| b.start).collect();
        assert_eq!(starts, vec![t0(), t0() + Duration::minutes(20)]);
        assert!(buckets.iter().all(|b| b.sample_count > 0));
    }

    #[test]
    fn test_samples_outside_window_are_ignored() {
        let samples = vec![at(-1, 0.1), at(1, 0.5), at(10, 0.9)];
        let buckets = bucket_samples(&samples, t0(), t0() + Duration::minutes(10), Duration::minutes(5));
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].sample_count, 1);
    }

    #[test]
    fn test_degenerate_windows_are_empty() {
        let samples = vec![at(1, 0.5)];
        assert!(bucket_samples(&samples, t0(), t0() + Duration::minutes(5), Duration::zero()).is_empty());
        assert!(bucket_samples(&samples, t0(), t0(), Duration::minutes(5)).is_empty());
    }

    #[test]
    fn test_summary_direction() {
        let samples = vec![at(0, 0.5), at(6, 0.55), at(12, 0.7)];
        let buckets = bucket_samples(&samples, t0(), t0() + Duration::minutes(15), Duration::minutes(5));
        let summary = TrendSummary::from_buckets(&buckets);
        assert_eq!(summary.direction, TrendDirection::Improving);
        assert_eq!(summary.bucket_count, 3);
        assert_eq!(summary.sample_count, 3);

        let flat = TrendSummary::from_buckets(&buckets[..1]);
        assert_eq!(flat.direction, TrendDirection::Stable);
        assert_eq!(TrendSummary::from_buckets(&[]).direction, TrendDirection::Stable);

        let mut reversed = buckets.clone();
        reversed.reverse();
        assert_eq!(TrendSummary::from_buckets(&reversed).direction, TrendDirection::Degrading);
    }
}
