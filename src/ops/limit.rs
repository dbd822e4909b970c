//! Count-bounded forwarding: `limit` and `skip`.

use crate::operation::{Downstream, OpKind, Operation};
use crate::signal::{OpId, Signal};
use anyhow::Result;
use std::any::Any;

/// Forwards the first `n` items, then halts the run. The lazy operation of
/// the engine: once satisfied, upstream pulling stops immediately.
pub struct LimitOp {
    limit: usize,
    seen: usize,
}

impl LimitOp {
    /// # Panics
    ///
    /// A zero limit is a construction error.
    #[must_use]
    pub fn new(limit: usize) -> Self {
        assert!(limit > 0, "limit must be positive");
        Self { limit, seen: 0 }
    }
}

impl Operation for LimitOp {
    fn kind(&self) -> OpKind {
        OpKind::Limit
    }

    fn is_lazy(&self) -> bool {
        true
    }

    fn handle(&mut self, _id: OpId, sig: &mut Signal, out: &mut Downstream<'_>) -> Result<()> {
        if self.seen >= self.limit {
            // only reachable when downstream flushes keep feeding after halt
            return Ok(());
        }
        self.seen += 1;
        out.feed(sig)?;
        if self.seen == self.limit {
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

/// Drops the first `n` items. Once done it forgets itself, so the
/// remainder of the run pays nothing for it.
pub struct SkipOp {
    skip: usize,
    seen: usize,
}

impl SkipOp {
    #[must_use]
    pub fn new(skip: usize) -> Self {
        Self { skip, seen: 0 }
    }
}

impl Operation for SkipOp {
    fn kind(&self) -> OpKind {
        OpKind::Skip
    }

    fn handle(&mut self, id: OpId, sig: &mut Signal, out: &mut Downstream<'_>) -> Result<()> {
        if self.seen < self.skip {
            self.seen += 1;
            if self.seen == self.skip {
                sig.forget(id);
            }
            return Ok(());
        }
        out.feed(sig)
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}
