//! Effectors - the knobs strategies turn.
//!
//! The engine never changes live behavior itself; it calls these traits.
//! The in-memory implementations record the current knob values and are used
//! by the CLI and in tests.

#![warn(missing_docs)]

pub mod r#trait;
pub mod memory;

pub use r#trait::{
    ResourceManager, CodeOptimizer, EffectorError, Result, CachingMode, Verbosity, Effectors,
};
pub use memory::{InMemoryResourceManager, InMemoryCodeOptimizer, ResourceSettings, GenerationSettings};
