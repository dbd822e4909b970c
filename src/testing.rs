//! Testing utilities for weir pipelines.
//!
//! End-user tooling for writing idiomatic tests against streams:
//!
//! - [`CountingProducer`]: wraps any producer and counts upstream pulls,
//!   the instrument behind laziness assertions
//! - [`RecordingConsumer`]: captures everything a side-effect stage sees
//! - assertion helpers for ordered and unordered value comparison
//! - [`temp_lines_file`]: a throwaway text file for file-producer tests
//!
//! # Quick start
//!
//! ```
//! use weir::testing::*;
//! use weir::{from_producer, producer::ValuesProducer, Value};
//!
//! # fn main() -> anyhow::Result<()> {
//! let (counted, pulls) = CountingProducer::wrap(Box::new(ValuesProducer::new(
//!     (0..100).map(Value::from).collect(),
//! )));
//! let out = from_producer(Box::new(counted)).limit(3).to_values()?;
//! assert_eq!(out.len(), 3);
//! assert_eq!(pulls.load(std::sync::atomic::Ordering::SeqCst), 3);
//! # Ok(())
//! # }
//! ```

use crate::item::Item;
use crate::producer::Producer;
use crate::traits::Consumer;
use anyhow::Result;
use serde_json::Value;
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::NamedTempFile;

/// Wraps a producer and counts how many items were actually pulled.
pub struct CountingProducer {
    inner: Box<dyn Producer>,
    pulls: Arc<AtomicUsize>,
}

impl CountingProducer {
    /// Returns the wrapper plus the shared pull counter.
    #[must_use]
    pub fn wrap(inner: Box<dyn Producer>) -> (Self, Arc<AtomicUsize>) {
        let pulls = Arc::new(AtomicUsize::new(0));
        (Self { inner, pulls: Arc::clone(&pulls) }, pulls)
    }
}

impl Producer for CountingProducer {
    fn produce(&mut self, item: &mut Item) -> Result<bool> {
        let produced = self.inner.produce(item)?;
        if produced {
            self.pulls.fetch_add(1, Ordering::SeqCst);
        }
        Ok(produced)
    }

    fn destroy(&mut self) {
        self.inner.destroy();
    }
}

/// Captures every (key, value) pair a side-effect stage observes.
#[derive(Clone, Default)]
pub struct RecordingConsumer {
    seen: Arc<std::sync::Mutex<Vec<(Value, Value)>>>,
}

impl RecordingConsumer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn seen(&self) -> Vec<(Value, Value)> {
        self.seen.lock().unwrap().clone()
    }
}

impl Consumer for RecordingConsumer {
    fn consume(&mut self, value: &Value, key: &Value) -> Result<()> {
        self.seen.lock().unwrap().push((key.clone(), value.clone()));
        Ok(())
    }
}

/// Assert exact, order-dependent equality of two value sequences.
///
/// # Panics
///
/// Panics with a readable diff when the sequences differ.
pub fn assert_values_equal(actual: &[Value], expected: &[Value]) {
    assert_eq!(
        actual, expected,
        "value sequences differ\n  actual:   {actual:?}\n  expected: {expected:?}"
    );
}

/// Assert the two sequences hold the same values, ignoring order
/// (multiset comparison over canonical signatures).
///
/// # Panics
///
/// Panics when the multisets differ.
pub fn assert_values_unordered_equal(actual: &[Value], expected: &[Value]) {
    let canon = |vs: &[Value]| {
        let mut sigs: Vec<String> = vs.iter().map(crate::value::signature).collect();
        sigs.sort();
        sigs
    };
    assert_eq!(
        canon(actual),
        canon(expected),
        "value multisets differ\n  actual:   {actual:?}\n  expected: {expected:?}"
    );
}

/// Write the given lines to a fresh temp file and hand it back (the file
/// lives as long as the returned handle).
///
/// # Panics
///
/// Panics when the temp file cannot be created or written.
#[must_use]
pub fn temp_lines_file(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    for line in lines {
        writeln!(file, "{line}").expect("write temp file");
    }
    file.flush().expect("flush temp file");
    file
}
