//! Bounded top-K sorting.
//!
//! `SortLimitedOp` retains only the `k` best entries of the stream under a
//! comparator, using a fixed-capacity binary heap ordered worst-first: while
//! *filling* every entry is inserted, once *full* a candidate either
//! displaces the current worst or is discarded on the spot. Memory is
//! bounded by `k` no matter how long the stream runs.
//!
//! The heap cannot use `std::collections::BinaryHeap` because the ordering
//! is a runtime comparator (and may be fallible in key-aware mode), so the
//! sift routines are spelled out here.

use crate::mode::Mode;
use crate::operation::{Downstream, OpKind, Operation};
use crate::ops::sort::{compare_entries, flush_entries};
use crate::signal::{OpId, Signal};
use crate::traits::Comparator;
use anyhow::Result;
use serde_json::Value;
use std::any::Any;
use std::cmp::Ordering;

/// Fill state of a [`BoundedSortBuffer`]. The `Filling` to `Full`
/// transition is one-directional per run.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BufferState {
    /// Fewer than `capacity` entries held; inserts are unconditional.
    Filling,
    /// At capacity; a candidate must beat the worst entry to get in.
    Full,
}

/// A fixed-capacity selection heap: keeps the `capacity` smallest entries
/// under the supplied comparator, worst entry at the root.
pub struct BoundedSortBuffer {
    capacity: usize,
    entries: Vec<(Value, Value)>,
    state: BufferState,
}

impl BoundedSortBuffer {
    /// # Panics
    ///
    /// A zero capacity is a construction error.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "sort buffer capacity must be positive");
        Self { capacity, entries: Vec::with_capacity(capacity), state: BufferState::Filling }
    }

    #[must_use]
    pub fn state(&self) -> BufferState {
        self.state
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Change the retained-entry count.
    ///
    /// # Panics
    ///
    /// Once the buffer has reached `Full` its data structure has committed
    /// to a fixed capacity peak; resizing it then is a programming error.
    /// A zero capacity, or one below the current fill level, is likewise
    /// rejected.
    pub fn set_capacity(&mut self, capacity: usize) {
        assert!(capacity > 0, "sort buffer capacity must be positive");
        assert!(
            self.state == BufferState::Filling,
            "cannot resize a sort buffer that is already full"
        );
        assert!(
            capacity >= self.entries.len(),
            "new capacity cannot drop already-buffered entries"
        );
        self.capacity = capacity;
        if self.entries.len() == self.capacity {
            self.state = BufferState::Full;
        }
    }

    /// Offer one entry. While filling, it is inserted unconditionally;
    /// once full, it replaces the worst entry only when strictly better.
    pub fn offer(
        &mut self,
        entry: (Value, Value),
        cmp: &dyn Comparator,
        by: Mode,
    ) -> Result<()> {
        match self.state {
            BufferState::Filling => {
                self.entries.push(entry);
                self.sift_up(self.entries.len() - 1, cmp, by)?;
                if self.entries.len() == self.capacity {
                    self.state = BufferState::Full;
                }
            }
            BufferState::Full => {
                if compare_entries(cmp, by, &entry, &self.entries[0])? == Ordering::Less {
                    self.entries[0] = entry;
                    self.sift_down(0, cmp, by)?;
                }
            }
        }
        Ok(())
    }

    /// Drain every retained entry in ascending comparator order.
    pub fn drain_sorted(&mut self, cmp: &dyn Comparator, by: Mode) -> Result<Vec<(Value, Value)>> {
        let mut out = Vec::with_capacity(self.entries.len());
        while let Some(worst) = self.pop_worst(cmp, by)? {
            out.push(worst);
        }
        out.reverse();
        Ok(out)
    }

    fn pop_worst(&mut self, cmp: &dyn Comparator, by: Mode) -> Result<Option<(Value, Value)>> {
        if self.entries.is_empty() {
            return Ok(None);
        }
        let last = self.entries.len() - 1;
        self.entries.swap(0, last);
        let worst = self.entries.pop().expect("non-empty heap");
        if !self.entries.is_empty() {
            self.sift_down(0, cmp, by)?;
        }
        Ok(Some(worst))
    }

    fn sift_up(&mut self, mut i: usize, cmp: &dyn Comparator, by: Mode) -> Result<()> {
        while i > 0 {
            let parent = (i - 1) / 2;
            let ord = compare_entries(cmp, by, &self.entries[i], &self.entries[parent])?;
            if ord != Ordering::Greater {
                break;
            }
            self.entries.swap(i, parent);
            i = parent;
        }
        Ok(())
    }

    fn sift_down(&mut self, mut i: usize, cmp: &dyn Comparator, by: Mode) -> Result<()> {
        let len = self.entries.len();
        loop {
            let left = 2 * i + 1;
            let right = left + 1;
            let mut largest = i;
            if left < len
                && compare_entries(cmp, by, &self.entries[left], &self.entries[largest])?
                    == Ordering::Greater
            {
                largest = left;
            }
            if right < len
                && compare_entries(cmp, by, &self.entries[right], &self.entries[largest])?
                    == Ordering::Greater
            {
                largest = right;
            }
            if largest == i {
                return Ok(());
            }
            self.entries.swap(i, largest);
            i = largest;
        }
    }
}

/// Bounded top-K sort node: emits the `k` best entries in sorted order at
/// flush. `emit_reversed` flips only the emission direction, which is how
/// a trailing `reverse` is absorbed into this node by the chain rewriter.
pub struct SortLimitedOp {
    buf: BoundedSortBuffer,
    cmp: Box<dyn Comparator>,
    by: Mode,
    emit_reversed: bool,
}

impl SortLimitedOp {
    #[must_use]
    pub fn new(k: usize, cmp: Box<dyn Comparator>, by: Mode, emit_reversed: bool) -> Self {
        Self { buf: BoundedSortBuffer::new(k), cmp, by, emit_reversed }
    }

    /// Flip the emission direction (the `sort_limited . reverse` rewrite).
    pub fn flip_emission(&mut self) {
        self.emit_reversed = !self.emit_reversed;
    }

    #[must_use]
    pub fn emits_reversed(&self) -> bool {
        self.emit_reversed
    }
}

impl Operation for SortLimitedOp {
    fn kind(&self) -> OpKind {
        OpKind::SortLimited
    }

    fn handle(&mut self, _id: OpId, sig: &mut Signal, _out: &mut Downstream<'_>) -> Result<()> {
        let item = sig.item();
        let entry = (item.key.clone(), item.value.clone());
        self.buf.offer(entry, self.cmp.as_ref(), self.by)
    }

    fn finish(&mut self, id: OpId, sig: &mut Signal, out: &mut Downstream<'_>) -> Result<()> {
        let mut entries = self.buf.drain_sorted(self.cmp.as_ref(), self.by)?;
        if self.emit_reversed {
            entries.reverse();
        }
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::DefaultComparator;
    use serde_json::json;

    fn offer_all(buf: &mut BoundedSortBuffer, values: &[i64]) {
        for (i, v) in values.iter().enumerate() {
            buf.offer((json!(i), json!(v)), &DefaultComparator, Mode::Value)
                .expect("offer");
        }
    }

    #[test]
    fn fills_then_evicts_worst() {
        let mut buf = BoundedSortBuffer::new(3);
        offer_all(&mut buf, &[5, 1, 9, 3, 7, 2]);
        assert_eq!(buf.state(), BufferState::Full);
        let sorted = buf.drain_sorted(&DefaultComparator, Mode::Value).expect("drain");
        let values: Vec<_> = sorted.into_iter().map(|(_, v)| v).collect();
        assert_eq!(values, vec![json!(1), json!(2), json!(3)]);
    }

    #[test]
    fn under_capacity_keeps_everything_sorted() {
        let mut buf = BoundedSortBuffer::new(10);
        offer_all(&mut buf, &[4, 2, 8]);
        assert_eq!(buf.state(), BufferState::Filling);
        let sorted = buf.drain_sorted(&DefaultComparator, Mode::Value).expect("drain");
        let values: Vec<_> = sorted.into_iter().map(|(_, v)| v).collect();
        assert_eq!(values, vec![json!(2), json!(4), json!(8)]);
    }

    #[test]
    fn resize_while_filling_is_allowed() {
        let mut buf = BoundedSortBuffer::new(5);
        offer_all(&mut buf, &[3, 1]);
        buf.set_capacity(2);
        assert_eq!(buf.state(), BufferState::Full);
    }

    #[test]
    #[should_panic(expected = "already full")]
    fn resize_when_full_panics() {
        let mut buf = BoundedSortBuffer::new(2);
        offer_all(&mut buf, &[3, 1]);
        buf.set_capacity(4);
    }

    #[test]
    #[should_panic(expected = "capacity must be positive")]
    fn zero_capacity_panics() {
        let _ = BoundedSortBuffer::new(0);
    }
}
