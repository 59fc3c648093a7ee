//! Adaptive engine core data models.
//!
//! This crate defines the snapshots, requests and records that flow through
//! the adaptation pipeline: a [`SystemState`] goes in with an
//! [`AdaptationNeed`], and [`AppliedAdaptation`] records come out.

#![warn(missing_docs)]

// Identities
mod id;

// Observed state
mod state;
mod sample;

// Requests and outcomes
mod need;
mod adaptation;

pub use id::*;

pub use state::{
    SystemState, PerformanceMetrics, PerformanceSeverity, ResourceUtilization, ResourceThresholds,
    ConstraintType, EnvironmentProfile, PlatformType, OptimizationLevel, FeedbackItem,
    FeedbackSeverity,
};
pub use sample::PerformanceSample;
pub use need::{AdaptationNeed, AdaptationType, ParseAdaptationTypeError};
pub use adaptation::{AppliedAdaptation, AdaptationResult, EffectivenessRecord};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
