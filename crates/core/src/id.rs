//! Unique identifiers for adaptive engine entities.

use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unique identifier for an AppliedAdaptation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AdaptationId(Ulid);

impl AdaptationId {
    /// Generate a new AdaptationId
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for AdaptationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AdaptationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for AdaptationId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Identifier for a registered strategy.
///
/// Strategy ids are chosen by whoever registers the strategy, so that
/// re-registering under the same name replaces the previous instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StrategyId(pub String);

impl StrategyId {
    /// Create a new strategy ID.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrow the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StrategyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for StrategyId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
