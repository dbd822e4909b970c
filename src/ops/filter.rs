//! Predicate-driven item dropping.

use crate::mode::{Mode, mode_allows};
use crate::operation::{Downstream, OpKind, Operation};
use crate::signal::{OpId, Signal};
use crate::traits::Predicate;
use anyhow::Result;
use std::any::Any;

/// Forwards items whose selected slot(s) satisfy the predicate. With
/// `negate` set this is `omit`: items satisfying the predicate are dropped.
pub struct FilterOp {
    pred: Box<dyn Predicate>,
    mode: Mode,
    negate: bool,
}

impl FilterOp {
    #[must_use]
    pub fn new(pred: Box<dyn Predicate>, mode: Mode, negate: bool) -> Self {
        Self { pred, mode, negate }
    }
}

impl Operation for FilterOp {
    fn kind(&self) -> OpKind {
        OpKind::Filter
    }

    fn handle(&mut self, _id: OpId, sig: &mut Signal, out: &mut Downstream<'_>) -> Result<()> {
        let allowed = mode_allows(self.pred.as_ref(), sig.item(), self.mode)?;
        if allowed != self.negate {
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
