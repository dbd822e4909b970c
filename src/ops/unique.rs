//! Duplicate suppression with configurable identity.

use crate::mode::Mode;
use crate::operation::{Downstream, OpKind, Operation};
use crate::signal::{OpId, Signal};
use crate::traits::Comparator;
use crate::value::{pair_signature, signature};
use anyhow::Result;
use serde_json::Value;
use std::any::Any;
use std::cmp::Ordering;
use std::collections::HashSet;

/// Forwards only the first occurrence of each item, where "occurrence" is
/// decided by the mode fixed at construction:
///
/// - `Value` -- first sighting per value,
/// - `Key` -- first sighting per key,
/// - `Both` -- only a full (key, value) repeat is a duplicate,
/// - `Any` -- a repeat of *either* slot is a duplicate.
///
/// With the default identity, sightings are tracked as canonical signature
/// sets. An injected comparator switches to a retained-pairs scan: the
/// 2-argument form covers `Value`/`Key`/`Any`, the 4-argument assoc form is
/// required for `Both` and its absence is reported as an error.
pub struct UniqueOp {
    mode: Mode,
    cmp: Option<Box<dyn Comparator>>,
    seen_values: HashSet<String>,
    seen_keys: HashSet<String>,
    seen_pairs: HashSet<String>,
    retained: Vec<(Value, Value)>,
}

impl UniqueOp {
    #[must_use]
    pub fn new(mode: Mode, cmp: Option<Box<dyn Comparator>>) -> Self {
        Self {
            mode,
            cmp,
            seen_values: HashSet::new(),
            seen_keys: HashSet::new(),
            seen_pairs: HashSet::new(),
            retained: Vec::new(),
        }
    }

    fn is_duplicate_by_signature(&mut self, key: &Value, value: &Value) -> bool {
        match self.mode {
            Mode::Value => !self.seen_values.insert(signature(value)),
            Mode::Key => !self.seen_keys.insert(signature(key)),
            Mode::Both => !self.seen_pairs.insert(pair_signature(key, value)),
            Mode::Any => {
                let value_seen = !self.seen_values.insert(signature(value));
                let key_seen = !self.seen_keys.insert(signature(key));
                value_seen || key_seen
            }
        }
    }

    fn is_duplicate_by_comparator(&mut self, key: &Value, value: &Value) -> Result<bool> {
        let cmp = self.cmp.as_deref().expect("comparator present");
        for (seen_key, seen_value) in &self.retained {
            let dup = match self.mode {
                Mode::Value => cmp.compare(value, seen_value) == Ordering::Equal,
                Mode::Key => cmp.compare(key, seen_key) == Ordering::Equal,
                Mode::Both => {
                    cmp.compare_assoc(value, seen_value, key, seen_key)? == Ordering::Equal
                }
                Mode::Any => {
                    cmp.compare(value, seen_value) == Ordering::Equal
                        || cmp.compare(key, seen_key) == Ordering::Equal
                }
            };
            if dup {
                return Ok(true);
            }
        }
        self.retained.push((key.clone(), value.clone()));
        Ok(false)
    }
}

impl Operation for UniqueOp {
    fn kind(&self) -> OpKind {
        OpKind::Unique
    }

    fn handle(&mut self, _id: OpId, sig: &mut Signal, out: &mut Downstream<'_>) -> Result<()> {
        let (key, value) = {
            let item = sig.item();
            (item.key.clone(), item.value.clone())
        };
        let duplicate = if self.cmp.is_some() {
            self.is_duplicate_by_comparator(&key, &value)?
        } else {
            self.is_duplicate_by_signature(&key, &value)
        };
        if !duplicate {
            out.feed(sig)?;
        }
        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}
