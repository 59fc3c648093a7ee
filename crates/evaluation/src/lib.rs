//! Evaluation layer - did the adaptations actually help?

#![warn(missing_docs)]

mod error;
mod evaluator;
mod report;
mod trends;

pub use error::{EvaluationError, Result};
pub use evaluator::{EffectivenessEvaluator, EvaluatorConfig};
pub use report::{Breakdown, EffectivenessReport};
pub use trends::{bucket_samples, TrendBucket, TrendDirection, TrendSummary};
