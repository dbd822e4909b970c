//! Container flattening via source splicing.

use crate::operation::{Downstream, OpKind, Operation};
use crate::producer::PairsProducer;
use crate::signal::{OpId, Signal};
use anyhow::Result;
use serde_json::Value;
use std::any::Any;

/// Recursion-level ceiling for merged `flat` operations. Appending further
/// `flat`s once the cap is reached deepens nothing.
pub const MAX_FLAT_DEPTH: usize = 32;

/// Replaces container values (arrays, objects) with their elements.
///
/// Flattening is expressed through the trampoline rather than recursion:
/// a container value becomes a spliced element producer resuming at this
/// very node, so nested containers re-enter it and unwrap one level per
/// source frame until the depth cap is hit. Scalars pass through untouched.
pub struct FlatOp {
    max_depth: usize,
}

impl FlatOp {
    /// # Panics
    ///
    /// A zero depth would flatten nothing and is a construction error.
    #[must_use]
    pub fn new(depth: usize) -> Self {
        assert!(depth > 0, "flat depth must be positive");
        Self { max_depth: depth.min(MAX_FLAT_DEPTH) }
    }

    /// Merge another `flat`'s depth into this node (the chain rewrite for
    /// adjacent `flat`s): caps add, clamped to the hard maximum.
    pub fn deepen(&mut self, extra: usize) {
        self.max_depth = (self.max_depth + extra).min(MAX_FLAT_DEPTH);
    }

    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

impl Operation for FlatOp {
    fn kind(&self) -> OpKind {
        OpKind::Flat
    }

    fn handle(&mut self, id: OpId, sig: &mut Signal, out: &mut Downstream<'_>) -> Result<()> {
        let is_container = matches!(sig.item().value, Value::Array(_) | Value::Object(_));
        if is_container && sig.source_depth() < self.max_depth {
            let elements = PairsProducer::from_container(&sig.item().value);
            sig.continue_with(Box::new(elements), id);
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
