//! An ordered key/value sink.

use crate::value::signature;
use anyhow::Result;
use serde_json::Value;
use std::fmt;

/// The buffer terminal collection operations write into: an ordered list
/// of (key, value) entries with map-style access on top.
///
/// Collectors are shared with a running pipeline as
/// `Arc<Mutex<Collector>>`; the pipeline appends, the caller reads after
/// the run. A destroyed collector yields nothing and silently ignores
/// further writes; destroying twice is safe.
#[derive(Default)]
pub struct Collector {
    entries: Vec<(Value, Value)>,
    destroyed: bool,
}

impl Collector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, keeping any existing entry with the same key.
    pub fn add(&mut self, key: Value, value: Value) {
        if self.destroyed {
            return;
        }
        self.entries.push((key, value));
    }

    /// Replace the first entry with an equal key, or append.
    pub fn set(&mut self, key: Value, value: Value) {
        if self.destroyed {
            return;
        }
        let sig = signature(&key);
        match self.entries.iter_mut().find(|(k, _)| signature(k) == sig) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// First value stored under an equal key.
    #[must_use]
    pub fn get(&self, key: &Value) -> Option<&Value> {
        let sig = signature(key);
        self.entries
            .iter()
            .find(|(k, _)| signature(k) == sig)
            .map(|(_, v)| v)
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drop all buffered state and ignore writes from now on. Idempotent.
    pub fn destroy(&mut self) {
        self.entries.clear();
        self.destroyed = true;
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Value, Value)> {
        self.entries.iter()
    }

    /// Values in insertion order.
    #[must_use]
    pub fn to_values(&self) -> Vec<Value> {
        self.entries.iter().map(|(_, v)| v.clone()).collect()
    }

    /// (key, value) pairs in insertion order.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(Value, Value)> {
        self.entries.clone()
    }

    /// JSON rendering: an object keyed by the string form of each key.
    /// Later entries win on key collisions, mirroring map semantics.
    pub fn to_json(&self) -> Result<String> {
        let mut map = serde_json::Map::new();
        for (k, v) in &self.entries {
            let key = match k {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            map.insert(key, v.clone());
        }
        Ok(serde_json::to_string(&Value::Object(map))?)
    }
}

impl fmt::Display for Collector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_json() {
            Ok(json) => f.write_str(&json),
            Err(_) => f.write_str("{}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn add_keeps_duplicates_set_replaces() {
        let mut c = Collector::new();
        c.add(json!("a"), json!(1));
        c.add(json!("a"), json!(2));
        assert_eq!(c.count(), 2);
        c.set(json!("a"), json!(3));
        assert_eq!(c.count(), 2);
        assert_eq!(c.get(&json!("a")), Some(&json!(3)));
    }

    #[test]
    fn destroy_is_idempotent_and_final() {
        let mut c = Collector::new();
        c.add(json!(0), json!("x"));
        c.destroy();
        c.destroy();
        assert!(c.is_empty());
        c.add(json!(1), json!("y"));
        assert!(c.is_empty());
    }
}
