//! History storage for the adaptive engine.
//!
//! The engine treats both the adaptation log and the performance history as
//! external collaborators. This crate provides the trait seams plus an
//! in-memory and a JSON-file implementation.

#![warn(missing_docs)]

pub mod trait_;
pub mod memory;
pub mod json_storage;

pub use trait_::{AdaptationStore, PerformanceHistory, StorageError, Result};
pub use memory::MemoryStore;
pub use json_storage::JsonStore;
