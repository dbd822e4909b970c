//! Result-capturing chain ends.
//!
//! Terminal nodes write into `Arc<Mutex<...>>` slots shared with the
//! stream façade, which reads them back once the run completes. The lazy
//! ones (`first`, `find`) halt the run as soon as they are satisfied.

use crate::collector::Collector;
use crate::mode::{Mode, mode_allows};
use crate::operation::{Downstream, OpKind, Operation};
use crate::signal::{OpId, Signal};
use crate::traits::Predicate;
use anyhow::Result;
use serde_json::Value;
use std::any::Any;
use std::sync::{Arc, Mutex};

pub(crate) type Slot<T> = Arc<Mutex<T>>;

/// Captures the first item to arrive and halts the run.
pub struct FirstOp {
    pub(crate) out: Slot<Option<(Value, Value)>>,
}

impl FirstOp {
    #[must_use]
    pub fn new(out: Slot<Option<(Value, Value)>>) -> Self {
        Self { out }
    }
}

impl Operation for FirstOp {
    fn kind(&self) -> OpKind {
        OpKind::First
    }

    fn is_lazy(&self) -> bool {
        true
    }

    fn handle(&mut self, id: OpId, sig: &mut Signal, _out: &mut Downstream<'_>) -> Result<()> {
        let item = sig.item();
        *self.out.lock().unwrap() = Some((item.key.clone(), item.value.clone()));
        sig.forget(id);
        sig.halt();
        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// Remembers the most recent item; the survivor is the stream's last.
pub struct LastOp {
    pub(crate) out: Slot<Option<(Value, Value)>>,
}

impl LastOp {
    #[must_use]
    pub fn new(out: Slot<Option<(Value, Value)>>) -> Self {
        Self { out }
    }

    /// Demote to a [`FirstOp`] sharing the same result slot. Used by the
    /// chain rewriter when a full sort ahead of `last` is collapsed into a
    /// bounded reverse-sort.
    #[must_use]
    pub(crate) fn into_first(self) -> FirstOp {
        FirstOp { out: self.out }
    }
}

impl Operation for LastOp {
    fn kind(&self) -> OpKind {
        OpKind::Last
    }

    fn handle(&mut self, _id: OpId, sig: &mut Signal, _out: &mut Downstream<'_>) -> Result<()> {
        let item = sig.item();
        *self.out.lock().unwrap() = Some((item.key.clone(), item.value.clone()));
        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// Captures the first item whose selected slot(s) satisfy the predicate,
/// then halts.
pub struct FindOp {
    pred: Box<dyn Predicate>,
    mode: Mode,
    out: Slot<Option<(Value, Value)>>,
}

impl FindOp {
    #[must_use]
    pub fn new(pred: Box<dyn Predicate>, mode: Mode, out: Slot<Option<(Value, Value)>>) -> Self {
        Self { pred, mode, out }
    }
}

impl Operation for FindOp {
    fn kind(&self) -> OpKind {
        OpKind::Find
    }

    fn is_lazy(&self) -> bool {
        true
    }

    fn handle(&mut self, id: OpId, sig: &mut Signal, _out: &mut Downstream<'_>) -> Result<()> {
        if mode_allows(self.pred.as_ref(), sig.item(), self.mode)? {
            let item = sig.item();
            *self.out.lock().unwrap() = Some((item.key.clone(), item.value.clone()));
            sig.forget(id);
            sig.halt();
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

/// Counts surviving items.
pub struct CountOp {
    out: Slot<u64>,
}

impl CountOp {
    #[must_use]
    pub fn new(out: Slot<u64>) -> Self {
        Self { out }
    }
}

impl Operation for CountOp {
    fn kind(&self) -> OpKind {
        OpKind::Count
    }

    fn handle(&mut self, _id: OpId, _sig: &mut Signal, _out: &mut Downstream<'_>) -> Result<()> {
        *self.out.lock().unwrap() += 1;
        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// Accumulates surviving (key, value) pairs into a shared vector.
pub struct CollectVecOp {
    out: Slot<Vec<(Value, Value)>>,
}

impl CollectVecOp {
    #[must_use]
    pub fn new(out: Slot<Vec<(Value, Value)>>) -> Self {
        Self { out }
    }
}

impl Operation for CollectVecOp {
    fn kind(&self) -> OpKind {
        OpKind::Collect
    }

    fn handle(&mut self, _id: OpId, sig: &mut Signal, _out: &mut Downstream<'_>) -> Result<()> {
        let item = sig.item();
        self.out
            .lock()
            .unwrap()
            .push((item.key.clone(), item.value.clone()));
        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// Appends surviving items into a caller-owned [`Collector`].
pub struct CollectInOp {
    collector: Arc<Mutex<Collector>>,
}

impl CollectInOp {
    #[must_use]
    pub fn new(collector: Arc<Mutex<Collector>>) -> Self {
        Self { collector }
    }
}

impl Operation for CollectInOp {
    fn kind(&self) -> OpKind {
        OpKind::CollectIn
    }

    fn handle(&mut self, _id: OpId, sig: &mut Signal, _out: &mut Downstream<'_>) -> Result<()> {
        let item = sig.item();
        self.collector
            .lock()
            .unwrap()
            .add(item.key.clone(), item.value.clone());
        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}
