//! Engine layer - need detection, strategy selection and the adaptation loop.

#![warn(missing_docs)]

pub mod orchestrator;
pub mod detector;
pub mod cycle;
pub mod settings;

pub use orchestrator::{AdaptationOrchestrator, OrchestratorConfig, DispatchMode, RankedStrategy};
pub use detector::{NeedDetector, DetectorConfig};
pub use cycle::{AdaptationLoop, LoopConfig, CycleResult, StateSource};
pub use settings::{EngineSettings, EngineError};
