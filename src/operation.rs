//! The operation node contract and the chain executor.
//!
//! An operation chain is a vector of [`ChainNode`]s owned by a
//! [`Pipe`](crate::Pipe). Execution is push-based: the driver sets the
//! signal's item and feeds the first live node; each node either forwards
//! (possibly after transforming the item), absorbs the item into an internal
//! buffer, or restructures the run through the signal (`forget`,
//! `continue_with`). When the source is exhausted, `finish` propagates once
//! through the chain so buffering operations can flush.
//!
//! The original design's `Initial`/`Ending` sentinels are enforced at the
//! type level here: the only structural operations are "append before end"
//! (on `Pipe`) and the forward slice traversal below, so inserting before
//! the head or mutating past the tail is unrepresentable.

use crate::errors::{ErrorAction, HandlerChain};
use crate::producer::Producer;
use crate::signal::{OpId, Signal};
use anyhow::Result;
use std::any::Any;

/// Discriminant used by the rewrite rule table and for chain introspection.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OpKind {
    Filter,
    Map,
    Each,
    Flat,
    Sort,
    SortLimited,
    Reverse,
    Shuffle,
    Tail,
    Unique,
    Gather,
    Window,
    Fork,
    Dispatch,
    Limit,
    Skip,
    Reduce,
    First,
    Last,
    Find,
    Count,
    Collect,
    CollectIn,
}

/// A polymorphic chain link.
pub trait Operation {
    fn kind(&self) -> OpKind;

    /// Whether this operation can end the run before the source is
    /// exhausted (`limit`, `first`, `find`). Purely informational for the
    /// driver and for chain introspection; the actual short-circuit is the
    /// signal's halt flag.
    fn is_lazy(&self) -> bool {
        false
    }

    /// Consume the current item: forward it through `out`, absorb it, or
    /// mutate the signal. `id` is this node's chain identity, needed for
    /// `forget`/`continue_with` self-references.
    fn handle(&mut self, id: OpId, sig: &mut Signal, out: &mut Downstream<'_>) -> Result<()>;

    /// Invoked exactly once when streaming ends. Buffering operations flush
    /// here; flushing must respect the halt flag and must propagate
    /// `out.finish` afterwards so finalization reaches the whole chain.
    fn finish(&mut self, _id: OpId, sig: &mut Signal, out: &mut Downstream<'_>) -> Result<()> {
        out.finish(sig)
    }

    /// Downcast support for the rewrite engine.
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

/// One link of the chain: the node plus its stable identity.
pub struct ChainNode {
    pub id: OpId,
    pub op: Box<dyn Operation>,
}

/// The remainder of the chain after the currently-executing node.
///
/// Operations forward the signal's item with [`feed`](Self::feed) and
/// propagate end-of-stream with [`finish`](Self::finish); they never touch
/// sibling nodes directly.
pub struct Downstream<'a> {
    pub(crate) nodes: &'a mut [ChainNode],
}

impl Downstream<'_> {
    /// Push the signal's current item through the remaining chain, then
    /// run any source swap the push requested (flush paths have no outer
    /// driving loop, so the trampoline lives here too).
    pub fn feed(&mut self, sig: &mut Signal) -> Result<()> {
        feed_nodes(self.nodes, sig)?;
        if let Some(cont) = sig.take_continuation() {
            let resume_index = resolve_op_index(self.nodes, cont.resume_at);
            let depth = sig.source_depth() + 1;
            let frame = SourceFrame { producer: cont.producer, resume_index, depth };
            drive_frames(self.nodes, sig, frame, None)?;
        }
        Ok(())
    }

    /// Propagate end-of-stream through the remaining chain.
    pub fn finish(&mut self, sig: &mut Signal) -> Result<()> {
        finish_nodes(self.nodes, sig)
    }
}

/// Feed the signal's item to the first live (non-forgotten) node.
pub(crate) fn feed_nodes(nodes: &mut [ChainNode], sig: &mut Signal) -> Result<()> {
    let mut i = 0;
    while i < nodes.len() && sig.is_forgotten(nodes[i].id) {
        i += 1;
    }
    if i == nodes.len() {
        return Ok(());
    }
    let (head, rest) = nodes[i..].split_first_mut().expect("live node");
    let mut down = Downstream { nodes: rest };
    head.op.handle(head.id, sig, &mut down)
}

/// Propagate `finish` starting at the first live node.
pub(crate) fn finish_nodes(nodes: &mut [ChainNode], sig: &mut Signal) -> Result<()> {
    let mut i = 0;
    while i < nodes.len() && sig.is_forgotten(nodes[i].id) {
        i += 1;
    }
    if i == nodes.len() {
        return Ok(());
    }
    let (head, rest) = nodes[i..].split_first_mut().expect("live node");
    let mut down = Downstream { nodes: rest };
    head.op.finish(head.id, sig, &mut down)
}

fn resolve_op_index(nodes: &[ChainNode], id: OpId) -> usize {
    nodes
        .iter()
        .position(|n| n.id == id)
        .expect("continuation resume target is not in the chain")
}

/// One nested data source: a producer plus where its items enter the chain.
pub(crate) struct SourceFrame {
    pub producer: Box<dyn Producer>,
    pub resume_index: usize,
    pub depth: usize,
}

/// Pull-and-feed loop over a stack of source frames.
///
/// This is the trampoline of the whole engine: `continue_with` requests are
/// detected after each feed returns and become nested frames instead of
/// recursive calls, so chains of source swaps never grow the call stack.
/// With `handlers` present (the root driver), user-data errors are routed
/// through the chain; without (flush paths, fork branches), they propagate.
pub(crate) fn drive_frames(
    nodes: &mut [ChainNode],
    sig: &mut Signal,
    root: SourceFrame,
    handlers: Option<&HandlerChain>,
) -> Result<()> {
    let entry_depth = sig.source_depth();
    let mut frames = vec![root];
    while !sig.is_halted() {
        let (produced, start, depth) = {
            let Some(frame) = frames.last_mut() else { break };
            sig.set_source_depth(frame.depth);
            (
                frame.producer.produce(sig.item_mut()),
                frame.resume_index,
                frame.depth,
            )
        };
        match produced {
            Ok(false) => {
                frames.pop();
            }
            Ok(true) => {
                if let Err(err) = feed_nodes(&mut nodes[start..], sig) {
                    sig.clear_continuation();
                    match route(handlers, &err, sig) {
                        ErrorAction::Skip => continue,
                        ErrorAction::Abort => {
                            sig.mark_aborted();
                            sig.halt();
                            break;
                        }
                        ErrorAction::Unhandled => return Err(err),
                    }
                }
                if let Some(cont) = sig.take_continuation() {
                    let resume_index = resolve_op_index(nodes, cont.resume_at);
                    log::debug!("switching source, resuming at chain index {resume_index}");
                    frames.push(SourceFrame {
                        producer: cont.producer,
                        resume_index,
                        depth: depth + 1,
                    });
                }
            }
            Err(err) => match route(handlers, &err, sig) {
                ErrorAction::Skip => continue,
                ErrorAction::Abort => {
                    sig.mark_aborted();
                    sig.halt();
                    break;
                }
                ErrorAction::Unhandled => return Err(err),
            },
        }
    }
    // the depth the caller saw must survive the pump, or a flat running
    // inside a later flush would inherit a stale nesting level
    sig.set_source_depth(entry_depth);
    Ok(())
}

fn route(handlers: Option<&HandlerChain>, err: &anyhow::Error, sig: &Signal) -> ErrorAction {
    match handlers {
        Some(chain) => chain.decide(err, sig.item()),
        None => ErrorAction::Unhandled,
    }
}
