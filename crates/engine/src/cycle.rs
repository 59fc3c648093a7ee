//! The adaptation loop - snapshot, record, detect, adapt.

use crate::{AdaptationOrchestrator, NeedDetector};
use adaptive_core::{AdaptationResult, PerformanceSample, SystemState};
use adaptive_storage::PerformanceHistory;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Where the loop gets its snapshots from.
#[async_trait]
pub trait StateSource: Send + Sync {
    /// Take a snapshot of the current system state.
    async fn snapshot(&self) -> anyhow::Result<SystemState>;
}

/// Configuration for the adaptation loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    /// Time between cycles (milliseconds)
    pub interval_ms: u64,
    /// Max cycles before stopping (None = infinite)
    pub max_cycles: Option<usize>,
    /// Whether each snapshot is recorded as a performance sample
    pub record_samples: bool,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            interval_ms: 60_000,
            max_cycles: None,
            record_samples: true,
        }
    }
}

/// Outcome of one cycle.
#[derive(Debug, Clone)]
pub enum CycleResult {
    /// Nothing needed adapting
    Idle,
    /// At least one need was handled
    Adapted {
        /// Results, one per detected need
        results: Vec<AdaptationResult>,
    },
    /// The snapshot could not be taken
    Error(String),
}

impl CycleResult {
    /// Number of adaptations applied during the cycle.
    pub fn applied_count(&self) -> usize {
        match self {
            CycleResult::Adapted { results } => results.iter().map(|r| r.applied_adaptations.len()).sum(),
            _ => 0,
        }
    }
}

/// Drives detection and adaptation on a fixed interval.
pub struct AdaptationLoop {
    source: Arc<dyn StateSource>,
    detector: NeedDetector,
    orchestrator: AdaptationOrchestrator,
    samples: Option<Arc<dyn PerformanceHistory>>,
    config: LoopConfig,
    cycles_run: usize,
}

impl AdaptationLoop {
    /// Create a loop with the default detector and configuration.
    pub fn new(source: Arc<dyn StateSource>, orchestrator: AdaptationOrchestrator) -> Self {
        Self {
            source,
            detector: NeedDetector::default(),
            orchestrator,
            samples: None,
            config: LoopConfig::default(),
            cycles_run: 0,
        }
    }

    /// Set the need detector.
    pub fn with_detector(mut self, detector: NeedDetector) -> Self {
        self.detector = detector;
        self
    }

    /// Record snapshots into a performance history.
    pub fn with_history(mut self, samples: Arc<dyn PerformanceHistory>) -> Self {
        self.samples = Some(samples);
        self
    }

    /// Set the configuration.
    pub fn with_config(mut self, config: LoopConfig) -> Self {
        self.config = config;
        self
    }

    /// Run one cycle.
    pub async fn run_cycle(&mut self) -> CycleResult {
        self.cycles_run += 1;
        info!("Starting adaptation cycle {}", self.cycles_run);

        let state = match self.source.snapshot().await {
            Ok(state) => state,
            Err(e) => {
                error!("Failed to take snapshot: {:#}", e);
                return CycleResult::Error(e.to_string());
            }
        };

        if self.config.record_samples {
            if let Some(samples) = &self.samples {
                if let Err(e) = samples.record_sample(&PerformanceSample::from(&state)).await {
                    warn!("Failed to record performance sample: {}", e);
                }
            }
        }

        let needs = self.detector.detect(&state);
        if needs.is_empty() {
            debug!("No adaptation needed");
            return CycleResult::Idle;
        }

        let mut results = Vec::with_capacity(needs.len());
        for need in needs {
            results.push(self.orchestrator.handle(need).await);
        }
        CycleResult::Adapted { results }
    }

    /// Run cycles on the configured interval until `max_cycles` is reached.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        let mut ticker = tokio::time::interval(Duration::from_millis(self.config.interval_ms.max(1)));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            if let Some(max) = self.config.max_cycles {
                if self.cycles_run >= max {
                    info!("Reached max cycles ({})", max);
                    break;
                }
            }

            ticker.tick().await;
            match self.run_cycle().await {
                CycleResult::Idle => {}
                CycleResult::Adapted { results } => {
                    let applied: usize = results.iter().map(|r| r.applied_adaptations.len()).sum();
                    info!("Cycle {} applied {} adaptation(s)", self.cycles_run, applied);
                }
                CycleResult::Error(e) => {
                    // A bad snapshot skips one cycle, not the loop.
                    warn!("Cycle {} skipped: {}", self.cycles_run, e);
                }
            }
        }

        Ok(())
    }

    /// Number of cycles run so far.
    pub fn cycles(&self) -> usize {
        self.cycles_run
    }

    /// The orchestrator this loop dispatches to.
    pub fn orchestrator(&self) -> &AdaptationOrchestrator {
        &self.orchestrator
    }
}
