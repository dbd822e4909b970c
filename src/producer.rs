//! Data sources feeding the head of a pipe.
//!
//! A producer fills the caller-owned [`Item`] cell one element at a time;
//! the driving loop owns the cell and pulls until the producer reports
//! exhaustion. `destroy` releases any held resource (a file handle, a
//! buffered vector) and makes every subsequent pull yield nothing; it is
//! idempotent everywhere.

use crate::item::Item;
use anyhow::{Context, Result};
use rand::Rng;
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// A lazy sequence of (key, value) pairs.
pub trait Producer {
    /// Fill `item` with the next element. Returns `false` once exhausted.
    fn produce(&mut self, item: &mut Item) -> Result<bool>;

    /// Release held resources; subsequent pulls yield nothing. Idempotent.
    fn destroy(&mut self) {}
}

/* ===================== In-memory sources ===================== */

/// Values with auto-assigned integer keys (0, 1, 2, ...).
pub struct ValuesProducer {
    values: std::vec::IntoIter<Value>,
    next_key: u64,
}

impl ValuesProducer {
    #[must_use]
    pub fn new(values: Vec<Value>) -> Self {
        Self { values: values.into_iter(), next_key: 0 }
    }
}

impl Producer for ValuesProducer {
    fn produce(&mut self, item: &mut Item) -> Result<bool> {
        match self.values.next() {
            Some(v) => {
                item.fill(Value::from(self.next_key), v);
                self.next_key += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn destroy(&mut self) {
        self.values = Vec::new().into_iter();
    }
}

/// Explicit (key, value) pairs.
pub struct PairsProducer {
    pairs: std::vec::IntoIter<(Value, Value)>,
}

impl PairsProducer {
    #[must_use]
    pub fn new(pairs: Vec<(Value, Value)>) -> Self {
        Self { pairs: pairs.into_iter() }
    }

    /// Pairs for the elements of a container value: arrays get their
    /// positional indices as keys, objects their member names. Scalars
    /// yield a single pair keyed 0. Used by `flat` to splice element
    /// sequences into the run.
    #[must_use]
    pub fn from_container(v: &Value) -> Self {
        let pairs = match v {
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, v)| (Value::from(i as u64), v.clone()))
                .collect(),
            Value::Object(map) => map
                .iter()
                .map(|(k, v)| (Value::from(k.clone()), v.clone()))
                .collect(),
            other => vec![(Value::from(0u64), other.clone())],
        };
        Self::new(pairs)
    }
}

impl Producer for PairsProducer {
    fn produce(&mut self, item: &mut Item) -> Result<bool> {
        match self.pairs.next() {
            Some((k, v)) => {
                item.fill(k, v);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn destroy(&mut self) {
        self.pairs = Vec::new().into_iter();
    }
}

/// Adapter over an arbitrary iterator of values.
pub struct IterProducer {
    iter: Option<Box<dyn Iterator<Item = Value>>>,
    next_key: u64,
}

impl IterProducer {
    pub fn new<I>(iter: I) -> Self
    where
        I: Iterator<Item = Value> + 'static,
    {
        Self { iter: Some(Box::new(iter)), next_key: 0 }
    }
}

impl Producer for IterProducer {
    fn produce(&mut self, item: &mut Item) -> Result<bool> {
        let Some(iter) = self.iter.as_mut() else { return Ok(false) };
        match iter.next() {
            Some(v) => {
                item.fill(Value::from(self.next_key), v);
                self.next_key += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn destroy(&mut self) {
        self.iter = None;
    }
}

/// Callback-driven source: the closure yields `Some(value)` per element and
/// `None` to end the stream.
pub struct FnProducer {
    f: Option<Box<dyn FnMut() -> Option<Value>>>,
    next_key: u64,
}

impl FnProducer {
    pub fn new<F>(f: F) -> Self
    where
        F: FnMut() -> Option<Value> + 'static,
    {
        Self { f: Some(Box::new(f)), next_key: 0 }
    }
}

impl Producer for FnProducer {
    fn produce(&mut self, item: &mut Item) -> Result<bool> {
        let Some(f) = self.f.as_mut() else { return Ok(false) };
        match f() {
            Some(v) => {
                item.fill(Value::from(self.next_key), v);
                self.next_key += 1;
                Ok(true)
            }
            None => {
                self.f = None;
                Ok(false)
            }
        }
    }

    fn destroy(&mut self) {
        self.f = None;
    }
}

/* ===================== Generators ===================== */

/// Sequential integers from `start`, stepping by `step`; unbounded when
/// `end` is `None` (pair it with a lazy operation such as `limit`).
pub struct RangeProducer {
    next: i64,
    end: Option<i64>,
    step: i64,
    next_key: u64,
    destroyed: bool,
}

impl RangeProducer {
    /// # Panics
    ///
    /// A zero step never advances and is rejected as a construction error.
    #[must_use]
    pub fn new(start: i64, end: Option<i64>, step: i64) -> Self {
        assert!(step != 0, "range step must be non-zero");
        Self { next: start, end, step, next_key: 0, destroyed: false }
    }
}

impl Producer for RangeProducer {
    fn produce(&mut self, item: &mut Item) -> Result<bool> {
        if self.destroyed {
            return Ok(false);
        }
        if let Some(end) = self.end {
            let past = if self.step > 0 { self.next > end } else { self.next < end };
            if past {
                return Ok(false);
            }
        }
        item.fill(Value::from(self.next_key), Value::from(self.next));
        self.next_key += 1;
        self.next += self.step;
        Ok(true)
    }

    fn destroy(&mut self) {
        self.destroyed = true;
    }
}

/// Uniformly random integers in `[lo, hi]`; unbounded when `count` is
/// `None`.
pub struct RandomProducer {
    lo: i64,
    hi: i64,
    remaining: Option<u64>,
    next_key: u64,
    destroyed: bool,
}

impl RandomProducer {
    /// # Panics
    ///
    /// An empty range (`lo > hi`) is a construction error.
    #[must_use]
    pub fn new(lo: i64, hi: i64, count: Option<u64>) -> Self {
        assert!(lo <= hi, "random range is empty");
        Self { lo, hi, remaining: count, next_key: 0, destroyed: false }
    }
}

impl Producer for RandomProducer {
    fn produce(&mut self, item: &mut Item) -> Result<bool> {
        if self.destroyed {
            return Ok(false);
        }
        if let Some(n) = self.remaining.as_mut() {
            if *n == 0 {
                return Ok(false);
            }
            *n -= 1;
        }
        let v = rand::thread_rng().gen_range(self.lo..=self.hi);
        item.fill(Value::from(self.next_key), Value::from(v));
        self.next_key += 1;
        Ok(true)
    }

    fn destroy(&mut self) {
        self.destroyed = true;
    }
}

/* ===================== Resource-backed sources ===================== */

/// Lines of a text file, keyed by line number. `destroy` closes the handle.
pub struct LinesProducer {
    reader: Option<BufReader<File>>,
    line_no: u64,
}

impl LinesProducer {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file =
            File::open(path).with_context(|| format!("opening {}", path.display()))?;
        Ok(Self { reader: Some(BufReader::new(file)), line_no: 0 })
    }
}

impl Producer for LinesProducer {
    fn produce(&mut self, item: &mut Item) -> Result<bool> {
        let Some(reader) = self.reader.as_mut() else { return Ok(false) };
        let mut line = String::new();
        let n = reader.read_line(&mut line).context("reading line")?;
        if n == 0 {
            self.reader = None;
            return Ok(false);
        }
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        item.fill(Value::from(self.line_no), Value::from(line));
        self.line_no += 1;
        Ok(true)
    }

    fn destroy(&mut self) {
        self.reader = None;
    }
}

/* ===================== Combinators ===================== */

/// Concatenation: drains each inner producer in turn.
pub struct ChainedProducer {
    inner: Vec<Box<dyn Producer>>,
    index: usize,
}

impl ChainedProducer {
    #[must_use]
    pub fn new(inner: Vec<Box<dyn Producer>>) -> Self {
        Self { inner, index: 0 }
    }
}

impl Producer for ChainedProducer {
    fn produce(&mut self, item: &mut Item) -> Result<bool> {
        while self.index < self.inner.len() {
            if self.inner[self.index].produce(item)? {
                return Ok(true);
            }
            self.index += 1;
        }
        Ok(false)
    }

    fn destroy(&mut self) {
        for p in &mut self.inner {
            p.destroy();
        }
        self.index = self.inner.len();
    }
}
