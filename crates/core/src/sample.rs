//! Performance samples recorded over time.

use crate::{SystemState, Time};
use serde::{Deserialize, Serialize};

/// One point in the performance history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSample {
    /// When the sample was taken
    pub timestamp: Time,
    /// CPU utilization (0.0 - 1.0)
    pub cpu_usage: f64,
    /// Memory utilization (0.0 - 1.0)
    pub memory_usage: f64,
    /// Mean response time (milliseconds)
    pub response_time_ms: f64,
    /// Requests per second
    pub throughput: f64,
    /// Overall performance score (0.0 - 1.0)
    pub overall_score: f64,
}

impl PerformanceSample {
    /// A sample with only a score, the rest zeroed.
    pub fn scored(timestamp: Time, overall_score: f64) -> Self {
        Self {
            timestamp,
            cpu_usage: 0.0,
            memory_usage: 0.0,
            response_time_ms: 0.0,
            throughput: 0.0,
            overall_score,
        }
    }
}

impl From<&SystemState> for PerformanceSample {
    fn from(state: &SystemState) -> Self {
        Self {
            timestamp: state.captured_at,
            cpu_usage: state.performance.cpu_usage,
            memory_usage: state.performance.memory_usage,
            response_time_ms: state.performance.response_time_ms,
            throughput: state.performance.throughput,
            overall_score: state.performance.overall_score,
        }
    }
}
