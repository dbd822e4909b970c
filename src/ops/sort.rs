//! Whole-stream reordering: sort, reverse, shuffle, tail.
//!
//! All four absorb every item into an internal buffer and re-emit at flush,
//! so none of them are lazy. Each one forgets itself after flushing; a
//! flushed reorder node can never contribute again.

use crate::mode::Mode;
use crate::operation::{Downstream, OpKind, Operation};
use crate::signal::{OpId, Signal};
use crate::traits::Comparator;
use anyhow::Result;
use rand::seq::SliceRandom;
use serde_json::Value;
use std::any::Any;
use std::cmp::Ordering;
use std::collections::VecDeque;

/// Compare two buffered (key, value) entries under the given slot mode.
/// `Both` requires the comparator's assoc form and fails without it.
pub(crate) fn compare_entries(
    cmp: &dyn Comparator,
    by: Mode,
    a: &(Value, Value),
    b: &(Value, Value),
) -> Result<Ordering> {
    Ok(match by {
        Mode::Value | Mode::Any => cmp.compare(&a.1, &b.1),
        Mode::Key => cmp.compare(&a.0, &b.0),
        Mode::Both => cmp.compare_assoc(&a.1, &b.1, &a.0, &b.0)?,
    })
}

/// Stable sort with a fallible comparator: the first comparison failure is
/// captured and reported after the sort unwinds.
pub(crate) fn sort_entries(
    entries: &mut [(Value, Value)],
    cmp: &dyn Comparator,
    by: Mode,
) -> Result<()> {
    let mut failure = None;
    entries.sort_by(|a, b| {
        if failure.is_some() {
            return Ordering::Equal;
        }
        match compare_entries(cmp, by, a, b) {
            Ok(ord) => ord,
            Err(err) => {
                failure = Some(err);
                Ordering::Equal
            }
        }
    });
    match failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Emit buffered entries through the rest of the chain, honoring the halt
/// flag between emissions.
pub(crate) fn flush_entries(
    entries: Vec<(Value, Value)>,
    sig: &mut Signal,
    out: &mut Downstream<'_>,
) -> Result<()> {
    for (key, value) in entries {
        if sig.is_halted() {
            break;
        }
        sig.item_mut().fill(key, value);
        out.feed(sig)?;
    }
    Ok(())
}

/// Full sort: buffers the entire stream, sorts once at flush, replays.
pub struct SortOp {
    cmp: Box<dyn Comparator>,
    by: Mode,
    buf: Vec<(Value, Value)>,
}

impl SortOp {
    #[must_use]
    pub fn new(cmp: Box<dyn Comparator>, by: Mode) -> Self {
        Self { cmp, by, buf: Vec::new() }
    }

    /// Tear the node apart for the rewrite engine.
    #[must_use]
    pub(crate) fn into_parts(self) -> (Box<dyn Comparator>, Mode) {
        (self.cmp, self.by)
    }
}

impl Operation for SortOp {
    fn kind(&self) -> OpKind {
        OpKind::Sort
    }

    fn handle(&mut self, _id: OpId, sig: &mut Signal, _out: &mut Downstream<'_>) -> Result<()> {
        let item = sig.item();
        self.buf.push((item.key.clone(), item.value.clone()));
        Ok(())
    }

    fn finish(&mut self, id: OpId, sig: &mut Signal, out: &mut Downstream<'_>) -> Result<()> {
        let mut entries = std::mem::take(&mut self.buf);
        sort_entries(&mut entries, self.cmp.as_ref(), self.by)?;
        flush_entries(entries, sig, out)?;
        sig.forget(id);
        out.finish(sig)
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// Buffers the stream and replays it in reverse arrival order.
pub struct ReverseOp {
    buf: Vec<(Value, Value)>,
}

impl ReverseOp {
    #[must_use]
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }
}

impl Default for ReverseOp {
    fn default() -> Self {
        Self::new()
    }
}

impl Operation for ReverseOp {
    fn kind(&self) -> OpKind {
        OpKind::Reverse
    }

    fn handle(&mut self, _id: OpId, sig: &mut Signal, _out: &mut Downstream<'_>) -> Result<()> {
        let item = sig.item();
        self.buf.push((item.key.clone(), item.value.clone()));
        Ok(())
    }

    fn finish(&mut self, id: OpId, sig: &mut Signal, out: &mut Downstream<'_>) -> Result<()> {
        let mut entries = std::mem::take(&mut self.buf);
        entries.reverse();
        flush_entries(entries, sig, out)?;
        sig.forget(id);
        out.finish(sig)
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// Buffers the stream and replays it in uniformly random order.
pub struct ShuffleOp {
    buf: Vec<(Value, Value)>,
}

impl ShuffleOp {
    #[must_use]
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }
}

impl Default for ShuffleOp {
    fn default() -> Self {
        Self::new()
    }
}

impl Operation for ShuffleOp {
    fn kind(&self) -> OpKind {
        OpKind::Shuffle
    }

    fn handle(&mut self, _id: OpId, sig: &mut Signal, _out: &mut Downstream<'_>) -> Result<()> {
        let item = sig.item();
        self.buf.push((item.key.clone(), item.value.clone()));
        Ok(())
    }

    fn finish(&mut self, id: OpId, sig: &mut Signal, out: &mut Downstream<'_>) -> Result<()> {
        let mut entries = std::mem::take(&mut self.buf);
        entries.shuffle(&mut rand::thread_rng());
        flush_entries(entries, sig, out)?;
        sig.forget(id);
        out.finish(sig)
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// Keeps only the last `n` items, replayed in arrival order at flush.
/// Memory is bounded by `n`.
pub struct TailOp {
    n: usize,
    buf: VecDeque<(Value, Value)>,
}

impl TailOp {
    /// # Panics
    ///
    /// A zero length is a construction error.
    #[must_use]
    pub fn new(n: usize) -> Self {
        assert!(n > 0, "tail length must be positive");
        Self { n, buf: VecDeque::new() }
    }

    #[must_use]
    pub(crate) fn len(&self) -> usize {
        self.n
    }
}

impl Operation for TailOp {
    fn kind(&self) -> OpKind {
        OpKind::Tail
    }

    fn handle(&mut self, _id: OpId, sig: &mut Signal, _out: &mut Downstream<'_>) -> Result<()> {
        let item = sig.item();
        if self.buf.len() == self.n {
            self.buf.pop_front();
        }
        self.buf.push_back((item.key.clone(), item.value.clone()));
        Ok(())
    }

    fn finish(&mut self, id: OpId, sig: &mut Signal, out: &mut Downstream<'_>) -> Result<()> {
        let entries: Vec<_> = std::mem::take(&mut self.buf).into();
        flush_entries(entries, sig, out)?;
        sig.forget(id);
        out.finish(sig)
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}
