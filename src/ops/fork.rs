//! Label-routed sub-pipelines.

use crate::item::Item;
use crate::operation::{
    ChainNode, Downstream, OpKind, Operation, SourceFrame, drive_frames, feed_nodes, finish_nodes,
};
use crate::ops::terminal::CollectVecOp;
use crate::pipe::Pipe;
use crate::signal::{OpId, Signal};
use crate::traits::{Consumer, Discriminator};
use crate::value::signature;
use anyhow::{Result, bail};
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// An independently-executing branch: its own chain, its own signal, and a
/// sink capturing whatever survives the branch's operations.
pub(crate) struct SubPipeline {
    chain: Vec<ChainNode>,
    signal: Signal,
    sink: Arc<Mutex<Vec<(Value, Value)>>>,
}

impl SubPipeline {
    /// Seal a branch pipe by appending the capture sink.
    pub(crate) fn from_pipe(mut pipe: Pipe) -> Self {
        let sink = Arc::new(Mutex::new(Vec::new()));
        pipe.append(Box::new(CollectVecOp::new(Arc::clone(&sink))));
        Self { chain: pipe.into_chain(), signal: Signal::new(), sink }
    }

    /// Push one copied item through the branch. Branches run strictly
    /// synchronously, in the caller's frame; a `flat` inside a branch
    /// trampolines on the branch's own signal.
    pub(crate) fn feed(&mut self, item: &Item) -> Result<()> {
        if self.signal.is_halted() {
            return Ok(());
        }
        *self.signal.item_mut() = item.clone();
        self.signal.set_source_depth(0);
        feed_nodes(&mut self.chain, &mut self.signal)?;
        if let Some(cont) = self.signal.take_continuation() {
            let resume_index = self
                .chain
                .iter()
                .position(|n| n.id == cont.resume_at)
                .expect("continuation resume target is not in the branch chain");
            let frame = SourceFrame { producer: cont.producer, resume_index, depth: 1 };
            drive_frames(&mut self.chain, &mut self.signal, frame, None)?;
        }
        Ok(())
    }

    /// Deliver the branch's own completion signal and collect its output.
    pub(crate) fn finish(&mut self) -> Result<Vec<(Value, Value)>> {
        if !self.signal.is_aborted() {
            self.signal.resume();
        }
        self.signal.finish_stream();
        finish_nodes(&mut self.chain, &mut self.signal)?;
        Ok(std::mem::take(&mut *self.sink.lock().unwrap()))
    }
}

struct Branch {
    label: Value,
    sub: SubPipeline,
}

/// Routes each item, by its discriminator label, into a per-label branch.
///
/// Branches either come from a prototype factory (`fork`: a new branch is
/// built lazily on first sight of a new label) or are pre-declared
/// (`fork_match`: an unknown label is a "handler is not defined" error,
/// routed through the stream's error-handler chain like any user-data
/// failure). On upstream completion every branch receives its own
/// completion signal, then the fork emits one aggregate item per label --
/// key: the label, value: the array of values the branch produced --
/// in declaration order for pre-declared branches, first-seen order
/// otherwise.
pub struct ForkOp {
    disc: Box<dyn Discriminator>,
    branches: Vec<Branch>,
    by_label: HashMap<String, usize>,
    factory: Option<Box<dyn Fn() -> Pipe>>,
}

impl ForkOp {
    /// Prototype-driven fork: `factory` builds one fresh branch pipe per
    /// distinct label.
    #[must_use]
    pub fn new(disc: Box<dyn Discriminator>, factory: Box<dyn Fn() -> Pipe>) -> Self {
        Self { disc, branches: Vec::new(), by_label: HashMap::new(), factory: Some(factory) }
    }

    /// Fixed-label fork: only the declared labels are legal.
    #[must_use]
    pub fn with_branches(disc: Box<dyn Discriminator>, branches: Vec<(Value, Pipe)>) -> Self {
        let mut op = Self {
            disc,
            branches: Vec::new(),
            by_label: HashMap::new(),
            factory: None,
        };
        for (label, pipe) in branches {
            op.by_label.insert(signature(&label), op.branches.len());
            op.branches.push(Branch { label, sub: SubPipeline::from_pipe(pipe) });
        }
        op
    }

    fn branch_index(&mut self, label: &Value) -> Result<usize> {
        let sig = signature(label);
        if let Some(&i) = self.by_label.get(&sig) {
            return Ok(i);
        }
        let Some(factory) = self.factory.as_ref() else {
            bail!("fork handler is not defined for label {label}");
        };
        let sub = SubPipeline::from_pipe(factory());
        self.by_label.insert(sig, self.branches.len());
        self.branches.push(Branch { label: label.clone(), sub });
        Ok(self.branches.len() - 1)
    }
}

impl Operation for ForkOp {
    fn kind(&self) -> OpKind {
        OpKind::Fork
    }

    fn handle(&mut self, _id: OpId, sig: &mut Signal, _out: &mut Downstream<'_>) -> Result<()> {
        let label = {
            let item = sig.item();
            self.disc.classify(&item.value, &item.key)?
        };
        let index = self.branch_index(&label)?;
        let item = sig.item().clone();
        self.branches[index].sub.feed(&item)
    }

    fn finish(&mut self, _id: OpId, sig: &mut Signal, out: &mut Downstream<'_>) -> Result<()> {
        for branch in &mut self.branches {
            let collected = branch.sub.finish()?;
            if sig.is_halted() {
                continue;
            }
            let values: Vec<Value> = collected.into_iter().map(|(_, v)| v).collect();
            sig.item_mut().fill(branch.label.clone(), Value::Array(values));
            out.feed(sig)?;
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

/// Routes each item to a consumer picked by label, then forwards the item
/// unchanged. An unclassifiable item (no consumer declared for its label)
/// is a "handler is not defined" error.
pub struct DispatchOp {
    disc: Box<dyn Discriminator>,
    handlers: Vec<(Value, Box<dyn Consumer>)>,
    by_label: HashMap<String, usize>,
}

impl DispatchOp {
    #[must_use]
    pub fn new(disc: Box<dyn Discriminator>, handlers: Vec<(Value, Box<dyn Consumer>)>) -> Self {
        let by_label = handlers
            .iter()
            .enumerate()
            .map(|(i, (label, _))| (signature(label), i))
            .collect();
        Self { disc, handlers, by_label }
    }
}

impl Operation for DispatchOp {
    fn kind(&self) -> OpKind {
        OpKind::Dispatch
    }

    fn handle(&mut self, _id: OpId, sig: &mut Signal, out: &mut Downstream<'_>) -> Result<()> {
        let label = {
            let item = sig.item();
            self.disc.classify(&item.value, &item.key)?
        };
        let Some(&index) = self.by_label.get(&signature(&label)) else {
            bail!("dispatch handler is not defined for label {label}");
        };
        {
            let item = sig.item();
            self.handlers[index].1.consume(&item.value, &item.key)?;
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
