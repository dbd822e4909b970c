//! Running folds.

use crate::operation::{Downstream, OpKind, Operation};
use crate::signal::{OpId, Signal};
use crate::traits::Reducer;
use anyhow::Result;
use serde_json::Value;
use std::any::Any;
use std::sync::{Arc, Mutex};

/// Absorbs every value into a reducer; at flush, emits the fold result as a
/// single item (key 0) and mirrors it into the shared slot the façade
/// reads. An empty stream (or a reducer that never produced a result)
/// emits nothing.
pub struct ReduceOp {
    reducer: Box<dyn Reducer>,
    out: Arc<Mutex<Option<Value>>>,
}

impl ReduceOp {
    #[must_use]
    pub fn new(mut reducer: Box<dyn Reducer>, out: Arc<Mutex<Option<Value>>>) -> Self {
        reducer.reset();
        Self { reducer, out }
    }
}

impl Operation for ReduceOp {
    fn kind(&self) -> OpKind {
        OpKind::Reduce
    }

    fn handle(&mut self, _id: OpId, sig: &mut Signal, _out: &mut Downstream<'_>) -> Result<()> {
        self.reducer.consume(&sig.item().value)
    }

    fn finish(&mut self, _id: OpId, sig: &mut Signal, out: &mut Downstream<'_>) -> Result<()> {
        if self.reducer.has_result() {
            let result = self.reducer.result();
            *self.out.lock().unwrap() = Some(result.clone());
            if !sig.is_halted() {
                sig.item_mut().fill(Value::from(0u64), result);
                out.feed(sig)?;
            }
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
