//! Aggregating runs of items into array-valued items.

use crate::operation::{Downstream, OpKind, Operation};
use crate::signal::{OpId, Signal};
use anyhow::Result;
use serde_json::Value;
use std::any::Any;
use std::collections::VecDeque;

fn aggregate(entries: Vec<(Value, Value)>, preserve_keys: bool) -> Value {
    if preserve_keys {
        Value::Array(
            entries
                .into_iter()
                .map(|(k, v)| Value::Array(vec![k, v]))
                .collect(),
        )
    } else {
        Value::Array(entries.into_iter().map(|(_, v)| v).collect())
    }
}

/// Collects items into disjoint groups emitted as single array-valued
/// items. With a size this is `chunk` (a group per `n` items, remainder
/// flushed at end-of-stream); without, `gather` (everything in one group).
/// Group keys are the running group index. With `preserve_keys`, each
/// element is emitted as a `[key, value]` pair instead of the bare value.
pub struct GatherOp {
    size: Option<usize>,
    preserve_keys: bool,
    buf: Vec<(Value, Value)>,
    emitted: u64,
}

impl GatherOp {
    /// # Panics
    ///
    /// A zero chunk size is a construction error.
    #[must_use]
    pub fn new(size: Option<usize>, preserve_keys: bool) -> Self {
        if let Some(n) = size {
            assert!(n > 0, "chunk size must be positive");
        }
        Self { size, preserve_keys, buf: Vec::new(), emitted: 0 }
    }

    fn emit_group(&mut self, sig: &mut Signal, out: &mut Downstream<'_>) -> Result<()> {
        let entries = std::mem::take(&mut self.buf);
        let value = aggregate(entries, self.preserve_keys);
        sig.item_mut().fill(Value::from(self.emitted), value);
        self.emitted += 1;
        out.feed(sig)
    }
}

impl Operation for GatherOp {
    fn kind(&self) -> OpKind {
        OpKind::Gather
    }

    fn handle(&mut self, _id: OpId, sig: &mut Signal, out: &mut Downstream<'_>) -> Result<()> {
        {
            let item = sig.item();
            self.buf.push((item.key.clone(), item.value.clone()));
        }
        if let Some(n) = self.size {
            if self.buf.len() == n {
                self.emit_group(sig, out)?;
            }
        }
        Ok(())
    }

    fn finish(&mut self, _id: OpId, sig: &mut Signal, out: &mut Downstream<'_>) -> Result<()> {
        if !self.buf.is_empty() && !sig.is_halted() {
            self.emit_group(sig, out)?;
        }
        out.finish(sig)
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// Sliding window over the last `size` items, emitted every `step` items
/// once the window is full. The final partial window, if any items arrived
/// after the last emission, is flushed at end-of-stream.
pub struct WindowOp {
    size: usize,
    step: usize,
    preserve_keys: bool,
    buf: VecDeque<(Value, Value)>,
    fresh: usize,
    emitted: u64,
}

impl WindowOp {
    /// # Panics
    ///
    /// Size and step must be positive, and the step cannot exceed the
    /// window size (gapped windows are not a thing this operation models).
    #[must_use]
    pub fn new(size: usize, step: usize, preserve_keys: bool) -> Self {
        assert!(size > 0, "window size must be positive");
        assert!(step > 0, "window step must be positive");
        assert!(step <= size, "window step cannot exceed the window size");
        Self { size, step, preserve_keys, buf: VecDeque::new(), fresh: 0, emitted: 0 }
    }

    fn emit_window(&mut self, sig: &mut Signal, out: &mut Downstream<'_>) -> Result<()> {
        let entries: Vec<_> = self.buf.iter().cloned().collect();
        let value = aggregate(entries, self.preserve_keys);
        sig.item_mut().fill(Value::from(self.emitted), value);
        self.emitted += 1;
        self.fresh = 0;
        out.feed(sig)
    }
}

impl Operation for WindowOp {
    fn kind(&self) -> OpKind {
        OpKind::Window
    }

    fn handle(&mut self, _id: OpId, sig: &mut Signal, out: &mut Downstream<'_>) -> Result<()> {
        {
            let item = sig.item();
            if self.buf.len() == self.size {
                self.buf.pop_front();
            }
            self.buf.push_back((item.key.clone(), item.value.clone()));
        }
        self.fresh += 1;
        if self.buf.len() == self.size && self.fresh >= self.step {
            self.emit_window(sig, out)?;
        }
        Ok(())
    }

    fn finish(&mut self, _id: OpId, sig: &mut Signal, out: &mut Downstream<'_>) -> Result<()> {
        if self.fresh > 0 && !self.buf.is_empty() && !sig.is_halted() {
            self.emit_window(sig, out)?;
        }
        out.finish(sig)
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}
