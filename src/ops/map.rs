//! Value/key transformation and side-effecting observation.

use crate::operation::{Downstream, OpKind, Operation};
use crate::signal::{OpId, Signal};
use crate::traits::{Consumer, Mapper};
use anyhow::Result;
use std::any::Any;

/// Rewrites one slot of each item through a mapper, then forwards.
pub struct MapOp {
    mapper: Box<dyn Mapper>,
    on_keys: bool,
}

impl MapOp {
    #[must_use]
    pub fn values(mapper: Box<dyn Mapper>) -> Self {
        Self { mapper, on_keys: false }
    }

    #[must_use]
    pub fn keys(mapper: Box<dyn Mapper>) -> Self {
        Self { mapper, on_keys: true }
    }
}

impl Operation for MapOp {
    fn kind(&self) -> OpKind {
        OpKind::Map
    }

    fn handle(&mut self, _id: OpId, sig: &mut Signal, out: &mut Downstream<'_>) -> Result<()> {
        let item = sig.item();
        if self.on_keys {
            let new_key = self.mapper.map(&item.key, &item.value)?;
            sig.item_mut().key = new_key;
        } else {
            let new_value = self.mapper.map(&item.value, &item.key)?;
            sig.item_mut().value = new_value;
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

/// Invokes a consumer for every item, then forwards it untouched.
pub struct EachOp {
    consumer: Box<dyn Consumer>,
}

impl EachOp {
    #[must_use]
    pub fn new(consumer: Box<dyn Consumer>) -> Self {
        Self { consumer }
    }
}

impl Operation for EachOp {
    fn kind(&self) -> OpKind {
        OpKind::Each
    }

    fn handle(&mut self, _id: OpId, sig: &mut Signal, out: &mut Downstream<'_>) -> Result<()> {
        {
            let item = sig.item();
            self.consumer.consume(&item.value, &item.key)?;
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
