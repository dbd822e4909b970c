//! The key/value cell that flows through an operation chain.

use serde_json::Value;

/// A mutable (key, value) pair: the unit of data moving through a pipeline.
///
/// Exactly one `Item` exists per executing signal. The driving loop
/// overwrites it on every pull, so an operation that wants to keep data
/// beyond the current step must `clone()` what it needs before returning;
/// holding on to references across steps is not possible by construction.
#[derive(Clone, Debug, PartialEq)]
pub struct Item {
    pub key: Value,
    pub value: Value,
}

impl Item {
    #[must_use]
    pub fn new(key: Value, value: Value) -> Self {
        Self { key, value }
    }

    /// Neutral cell used before the first pull.
    #[must_use]
    pub fn empty() -> Self {
        Self { key: Value::Null, value: Value::Null }
    }

    /// Overwrite both slots in place.
    pub fn fill(&mut self, key: Value, value: Value) {
        self.key = key;
        self.value = value;
    }
}

impl Default for Item {
    fn default() -> Self {
        Self::empty()
    }
}
